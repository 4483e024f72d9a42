use anyhow::Context;
use rand::Rng;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// Configuration that fully determines a map generation run. Two runs with
/// an equal `MapConfig` always produce byte-identical [`crate::MapData`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct MapConfig {
    /// RNG seed. Any non-empty string is valid; identical seeds (with an
    /// otherwise identical config) always produce identical maps.
    #[validate(length(min = 1, message = "seed must not be empty"))]
    pub seed: String,

    /// Output width, in pixels.
    #[validate(range(min = 1))]
    pub width: u32,

    /// Output height, in pixels.
    #[validate(range(min = 1))]
    pub height: u32,

    #[validate]
    pub shape: ShapeConfig,

    #[validate]
    pub terrain: TerrainConfig,

    #[validate]
    pub climate: ClimateConfig,

    #[validate]
    pub rivers: RiverConfig,
}

/// Configuration for the overall shape of the world: how much of it is ocean,
/// and how that ocean is distributed.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ShapeConfig {
    /// Elevation threshold below which a triangle is considered underwater.
    #[validate(range(min = 0.1, max = 0.7))]
    pub sea_level: f64,

    /// Continent-mask values at or below this are clamped to open ocean.
    #[validate(range(min = 0.0, max = 1.0))]
    pub ocean_ratio: f64,

    /// Controls how many small island centers get placed, in addition to
    /// the main continents.
    #[validate(range(min = 0.0))]
    pub island_frequency: f64,
}

/// Configuration for terrain/mesh density and mountain shaping.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct TerrainConfig {
    /// Multiplier on sample-point density. Higher means a finer mesh (more
    /// triangles).
    #[validate(range(min = 0.0001, message = "biome_density must be positive"))]
    pub biome_density: f64,

    /// Probability that a qualifying interior point becomes a mountain peak
    /// candidate.
    #[validate(range(min = 0.0, max = 1.0))]
    pub mountain_frequency: f64,

    /// Scales the contribution of mountain distance to final elevation.
    #[validate(range(min = 0.1, max = 1.0))]
    pub mountain_height: f64,

    /// Anisotropy strength in the mountain-distance BFS; higher values make
    /// mountain contours look more irregular.
    #[validate(range(min = 0.0, max = 1.0))]
    pub jaggedness: f64,

    /// Fraction of cell size that interior sample points are jittered by.
    #[validate(range(min = 0.0, max = 0.5))]
    pub point_deviation: f64,
}

/// Configuration for temperature, wind, and moisture simulation.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ClimateConfig {
    /// Prevailing wind direction, in degrees, measured the usual way
    /// (0 = +x axis, increasing counter-clockwise).
    #[validate(custom = "validate_wind_angle")]
    pub wind_angle_deg: f64,

    /// Global scale on orographic rainfall.
    #[validate(range(min = 0.0, max = 2.0))]
    pub raininess: f64,

    /// Global scale on rain-shadow moisture depletion.
    #[validate(range(min = 0.0, max = 2.0))]
    pub rain_shadow: f64,

    /// Global scale on land evaporation feeding back into moisture.
    #[validate(range(min = 0.0, max = 2.0))]
    pub evaporation: f64,
}

fn validate_wind_angle(angle: &f64) -> Result<(), ValidationError> {
    if (0.0..360.0).contains(angle) {
        Ok(())
    } else {
        Err(ValidationError::new("wind_angle_deg must be in [0, 360)"))
    }
}

/// Configuration for river extraction and rendering width.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct RiverConfig {
    /// Global multiplier on flow accumulation. Setting this to `0` disables
    /// rivers entirely.
    #[validate(range(min = 0.0))]
    pub rivers: f64,

    /// Minimum flow for a triangle to be considered a river source.
    #[validate(range(min = 0.0))]
    pub river_min_flow: f64,

    /// Scale factor on rendered river stroke width.
    #[validate(range(min = 0.0001, message = "river_width must be positive"))]
    pub river_width: f64,
}

impl Default for MapConfig {
    fn default() -> Self {
        // A "nice looking" default world. As with most seeded generators,
        // leaving `seed` to its default means two calls to
        // `MapConfig::default()` will NOT produce the same map; callers that
        // care about reproducibility should always set an explicit seed.
        Self {
            seed: random_seed(),
            width: 512,
            height: 512,
            shape: ShapeConfig::default(),
            terrain: TerrainConfig::default(),
            climate: ClimateConfig::default(),
            rivers: RiverConfig::default(),
        }
    }
}

fn random_seed() -> String {
    let n: u64 = rand::thread_rng().gen();
    format!("{n:x}")
}

impl MapConfig {
    /// Deserialize a config from JSON. A config can be serialized into JSON
    /// with [`MapConfig::to_json`]. Will fail if the input is malformed, but
    /// does not itself validate the result — call [`Validate::validate`]
    /// before passing it to [`crate::generate`].
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        serde_json::from_str(json).context("error deserializing map config")
    }

    /// Serialize this config into JSON, so it can be saved as a preset and
    /// loaded back later with [`MapConfig::from_json`].
    pub fn to_json(&self) -> anyhow::Result<String> {
        serde_json::to_string(self).context("error serializing map config")
    }
}

impl Default for ShapeConfig {
    fn default() -> Self {
        Self {
            sea_level: 0.4,
            ocean_ratio: 0.3,
            island_frequency: 0.3,
        }
    }
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            biome_density: 1.0,
            mountain_frequency: 0.5,
            mountain_height: 0.6,
            jaggedness: 0.5,
            point_deviation: 0.3,
        }
    }
}

impl Default for ClimateConfig {
    fn default() -> Self {
        Self {
            wind_angle_deg: 45.0,
            raininess: 1.0,
            rain_shadow: 1.0,
            evaporation: 1.0,
        }
    }
}

impl Default for RiverConfig {
    fn default() -> Self {
        Self {
            rivers: 1.0,
            river_min_flow: 0.1,
            river_width: 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        MapConfig::default().validate().unwrap();
    }

    #[test]
    fn test_rejects_empty_seed() {
        let config = MapConfig {
            seed: String::new(),
            ..MapConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_bad_sea_level() {
        let config = MapConfig {
            shape: ShapeConfig {
                sea_level: 0.9,
                ..ShapeConfig::default()
            },
            ..MapConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.errors().contains_key("shape"));
    }

    #[test]
    fn test_rejects_wind_angle_360() {
        let config = MapConfig {
            climate: ClimateConfig {
                wind_angle_deg: 360.0,
                ..ClimateConfig::default()
            },
            ..MapConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_width() {
        let config = MapConfig {
            width: 0,
            ..MapConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_json_round_trip() {
        let config = MapConfig {
            seed: "ashwood".to_string(),
            ..MapConfig::default()
        };
        let json = config.to_json().unwrap();
        let parsed = MapConfig::from_json(&json).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn test_from_json_rejects_malformed_input() {
        assert!(MapConfig::from_json("not json").is_err());
    }
}
