use validator::ValidationErrors;

/// The two ways a [`generate`](crate::generate) call can fail.
///
/// A configuration error is detected up front, before any generation work
/// happens, and never produces partial output. An invariant violation
/// indicates a bug in the generator itself (a degenerate point set, a cycle
/// that survived sink resolution, etc) rather than anything wrong with the
/// caller's input; the caller's best recourse is usually to retry with a
/// different seed.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("invalid map configuration")]
    Config(#[from] ValidationErrors),

    #[error("internal invariant violation: {0}")]
    Invariant(String),
}

impl GenerationError {
    pub(crate) fn invariant(msg: impl Into<String>) -> Self {
        Self::Invariant(msg.into())
    }
}

/// Fold an internal `anyhow` failure (which may carry a chain of `.context`
/// breadcrumbs from deep inside the pipeline) into the public, typed error.
impl From<anyhow::Error> for GenerationError {
    fn from(err: anyhow::Error) -> Self {
        Self::invariant(format!("{err:#}"))
    }
}
