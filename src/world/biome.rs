//! Stage 6a: classify each triangle into a discrete biome from its
//! elevation, moisture, and temperature.

use super::{Generate, WorldBuilder};
use anyhow::Context;
use serde::{Deserialize, Serialize};

/// A discrete climate-plus-terrain class assigned to each triangle.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, strum::EnumIter)]
pub enum Biome {
    Ocean,
    DeepOcean,
    ShallowOcean,
    ShallowWater,
    Snow,
    Tundra,
    Mountain,
    Shrubland,
    Taiga,
    TemperateDesert,
    DeciduousForest,
    RainForest,
    Desert,
    Grassland,
    TropicalSeasonalForest,
    TropicalRainForest,
    SubtropicalDesert,
    Beach,
}

#[derive(Debug)]
pub struct BiomeGenerator;

impl Generate for BiomeGenerator {
    fn generate(&self, world: &mut WorldBuilder) -> anyhow::Result<()> {
        let sea_level = world.config.shape.sea_level;

        for t in world.mesh.triangle_ids() {
            if world.mesh.is_boundary(t) {
                world.triangles[t as usize].set_biome(Biome::Ocean);
                continue;
            }

            let elevation = world.triangles[t as usize].elevation().context("biome stage")?;
            let moisture = world.triangles[t as usize].moisture()?;
            let temperature = world.triangles[t as usize].temperature()?;

            let any_neighbor_below_sea = world.mesh.neighbor_ids(t).any(|u| {
                world.triangles[u as usize]
                    .elevation()
                    .map(|e| e < sea_level)
                    .unwrap_or(false)
            });

            let biome = classify(elevation, moisture, temperature, sea_level, any_neighbor_below_sea);
            world.triangles[t as usize].set_biome(biome);
        }
        Ok(())
    }
}

fn classify(e: f64, m: f64, t: f64, sea_level: f64, any_neighbor_below_sea: bool) -> Biome {
    if e < sea_level {
        let d = (sea_level - e) / sea_level;
        return if d < 0.1 {
            Biome::ShallowWater
        } else if d < 0.3 {
            Biome::ShallowOcean
        } else if d < 0.7 {
            Biome::Ocean
        } else {
            Biome::DeepOcean
        };
    }

    let h = e - sea_level;
    let biome = if h > 0.7 {
        if t < 0.2 {
            Biome::Snow
        } else if t < 0.4 {
            Biome::Tundra
        } else {
            Biome::Mountain
        }
    } else if h > 0.4 {
        if t < 0.2 {
            Biome::Tundra
        } else if t < 0.5 {
            if m < 0.4 {
                Biome::Shrubland
            } else {
                Biome::Taiga
            }
        } else if m < 0.4 {
            Biome::TemperateDesert
        } else if m < 0.7 {
            Biome::DeciduousForest
        } else {
            Biome::RainForest
        }
    } else if t < 0.2 {
        if m < 0.4 {
            Biome::Tundra
        } else {
            Biome::Taiga
        }
    } else if t < 0.6 {
        if m < 0.3 {
            Biome::Desert
        } else if m < 0.5 {
            Biome::Grassland
        } else if m < 0.7 {
            Biome::DeciduousForest
        } else {
            Biome::RainForest
        }
    } else if m < 0.3 {
        Biome::SubtropicalDesert
    } else if m < 0.5 {
        Biome::Grassland
    } else if m < 0.7 {
        Biome::TropicalSeasonalForest
    } else {
        Biome::TropicalRainForest
    };

    if h < 0.05 && any_neighbor_below_sea {
        Biome::Beach
    } else {
        biome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deep_water_classification() {
        assert_eq!(classify(0.0, 0.5, 0.5, 0.4, false), Biome::DeepOcean);
    }

    #[test]
    fn test_shallow_water_classification() {
        assert_eq!(classify(0.39, 0.5, 0.5, 0.4, false), Biome::ShallowWater);
    }

    #[test]
    fn test_snow_peak() {
        assert_eq!(classify(0.95, 0.5, 0.1, 0.1, false), Biome::Snow);
    }

    #[test]
    fn test_beach_override() {
        // Low relief just above sea level, adjacent to water: BEACH wins
        // over whatever the elevation/moisture/temperature rule would pick.
        assert_eq!(classify(0.41, 0.8, 0.8, 0.4, true), Biome::Beach);
    }

    #[test]
    fn test_no_beach_without_wet_neighbor() {
        assert_ne!(classify(0.41, 0.8, 0.8, 0.4, false), Biome::Beach);
    }

    #[test]
    fn test_tropical_rain_forest() {
        assert_eq!(classify(0.5, 0.9, 0.9, 0.4, false), Biome::TropicalRainForest);
    }

    #[test]
    fn test_all_biomes_have_unique_display_names() {
        use std::collections::HashSet;
        use strum::IntoEnumIterator;

        let names: HashSet<String> = Biome::iter().map(|b| b.to_string()).collect();
        assert_eq!(names.len(), Biome::iter().count(), "duplicate biome display name");
    }
}
