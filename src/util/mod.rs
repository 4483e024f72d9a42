pub mod noise;
pub mod range;
pub mod rng;

pub use range::{cmp_f64, NumRange};
pub use rng::{hash_str_to_u32, SeedSource, Xorshift32};

/// Measure the evaluation time of an expression and log it at `debug` level.
/// Mirrors the teacher pipeline's `timed!` macro, minus the wasm-console
/// branch (this crate has no wasm target).
#[macro_export]
macro_rules! timed {
    ($label:expr, $ex:expr) => {{
        let __start = std::time::Instant::now();
        let __value = $ex;
        log::debug!("{} took {} ms", $label, __start.elapsed().as_millis());
        __value
    }};
}
