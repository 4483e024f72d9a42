mod biome;
mod climate;
mod hydrology;
mod terrain;

use crate::config::MapConfig;
use crate::error::GenerationError;
use crate::mesh::{sampler, Mesh, TriangleId};
use crate::raster;
use crate::timed;
use crate::util::rng::SeedSource;
use anyhow::{anyhow, Context};
use log::{debug, info};
use std::fmt::Debug;

pub use biome::Biome;
pub use hydrology::RiverPath;

/// A fully generated map: dense `width x height` grids ready for rendering.
/// Has no serialization support by design — a generated map is consumed
/// in-process by a renderer and never persisted or sent over a wire.
#[derive(Clone, Debug)]
pub struct MapData {
    pub width: u32,
    pub height: u32,
    pub elevation: Vec<f64>,
    pub moisture: Vec<f64>,
    pub temperature: Vec<f64>,
    pub biomes: Vec<Biome>,
    pub rivers: Vec<f64>,
}

impl MapData {
    pub fn get(&self, x: u32, y: u32) -> usize {
        (y as usize) * (self.width as usize) + (x as usize)
    }
}

/// Run the full generation pipeline for `config`, producing a [`MapData`].
/// Validates the config up front; any failure after that point is an
/// internal invariant violation rather than a config problem.
pub fn generate(config: MapConfig) -> Result<MapData, GenerationError> {
    use validator::Validate;

    info!("generating map with config {config:#?}");
    config.validate()?;

    let map = timed!(
        "map generation",
        generate_inner(&config).context("error during map generation")?
    );
    Ok(map)
}

fn generate_inner(config: &MapConfig) -> anyhow::Result<MapData> {
    let seed_source = SeedSource::new(config.seed.clone());

    // The sampler's own mountain-candidate list (per §4.2) is a property of
    // the point set, not the mesh; the terrain stage re-derives mountain
    // peaks independently over triangles (per §4.4), so nothing downstream
    // needs to thread it through the builder.
    let point_set = timed!("point sampling", sampler::generate_points(config, &seed_source));
    debug!("sampled {} points", point_set.points.len());
    let mesh = timed!("mesh construction", Mesh::build(&point_set.points))?;
    debug!("triangulated mesh into {} triangles", mesh.num_triangles());

    let mut builder = WorldBuilder::new(config.clone(), mesh, seed_source);
    builder.generate_world()
}

/// A container for generating a new map by running a sequence of generators
/// over a shared, partially-built mesh. Mirrors the staged-pipeline shape of
/// the rest of the generator: each stage only ever reads what a prior stage
/// finished, and writes fields no later stage has touched yet.
pub struct WorldBuilder {
    pub config: MapConfig,
    pub mesh: Mesh,
    pub seed_source: SeedSource,
    pub triangles: Vec<TriangleBuilder>,
}

impl WorldBuilder {
    pub fn new(config: MapConfig, mesh: Mesh, seed_source: SeedSource) -> Self {
        let triangles = (0..mesh.num_triangles() as TriangleId)
            .map(TriangleBuilder::new)
            .collect();
        Self {
            config,
            mesh,
            seed_source,
            triangles,
        }
    }

    /// Run every generation stage in order, then project the finished
    /// triangle fields onto a pixel grid. The stage order is load-bearing:
    /// each one depends on the fields the previous stage finalized.
    pub fn generate_world(&mut self) -> anyhow::Result<MapData> {
        self.apply_generator(terrain::TerrainGenerator)?;
        self.apply_generator(climate::ClimateGenerator)?;
        let rivers = hydrology::HydrologyGenerator.run(self)?;
        self.apply_generator(biome::BiomeGenerator)?;

        raster::rasterize(self, &rivers)
    }

    fn apply_generator(&mut self, generator: impl Debug + Generate) -> anyhow::Result<()> {
        timed!(format!("{generator:?}"), generator.generate(self))
            .with_context(|| format!("error in {generator:?}"))
    }
}

/// A stage of the generation pipeline. Implementations mutate the builder's
/// triangle fields in place; any error returned here is an internal bug, not
/// a user-facing condition (config problems are caught before generation
/// starts).
trait Generate {
    fn generate(&self, world: &mut WorldBuilder) -> anyhow::Result<()>;
}

/// A partially built triangle. Every field starts `None` and is filled in by
/// exactly one pipeline stage; getters fail loudly if called before that
/// stage has run, so a stage-ordering bug surfaces immediately instead of
/// silently reading a zeroed value.
#[derive(Clone, Debug)]
pub struct TriangleBuilder {
    id: TriangleId,
    elevation: Option<f64>,
    temperature: Option<f64>,
    moisture: Option<f64>,
    rainfall: Option<f64>,
    /// Outer `None` means the downslope stage hasn't run yet. Inner `None`
    /// means it ran and concluded this triangle has no downslope neighbor
    /// (a resolved sink routes through `Some`, never stays `None` unless it
    /// truly has nowhere to drain).
    downslope: Option<Option<TriangleId>>,
    flow: Option<f64>,
    biome: Option<Biome>,
}

impl TriangleBuilder {
    pub fn new(id: TriangleId) -> Self {
        Self {
            id,
            elevation: None,
            temperature: None,
            moisture: None,
            rainfall: None,
            downslope: None,
            flow: None,
            biome: None,
        }
    }

    pub fn elevation(&self) -> anyhow::Result<f64> {
        self.elevation
            .ok_or_else(|| anyhow!("elevation not initialized for triangle {}", self.id))
    }

    pub fn set_elevation(&mut self, value: f64) -> anyhow::Result<()> {
        if !(0.0..=1.0).contains(&value) {
            return Err(anyhow!(
                "elevation {value} out of [0,1] for triangle {}",
                self.id
            ));
        }
        self.elevation = Some(value);
        Ok(())
    }

    pub fn temperature(&self) -> anyhow::Result<f64> {
        self.temperature
            .ok_or_else(|| anyhow!("temperature not initialized for triangle {}", self.id))
    }

    pub fn set_temperature(&mut self, value: f64) -> anyhow::Result<()> {
        self.temperature = Some(value.clamp(0.0, 1.0));
        Ok(())
    }

    pub fn moisture(&self) -> anyhow::Result<f64> {
        self.moisture
            .ok_or_else(|| anyhow!("moisture not initialized for triangle {}", self.id))
    }

    pub fn set_moisture(&mut self, value: f64) -> anyhow::Result<()> {
        self.moisture = Some(value.clamp(0.0, 1.0));
        Ok(())
    }

    pub fn rainfall(&self) -> anyhow::Result<f64> {
        self.rainfall
            .ok_or_else(|| anyhow!("rainfall not initialized for triangle {}", self.id))
    }

    pub fn set_rainfall(&mut self, value: f64) -> anyhow::Result<()> {
        if value < 0.0 {
            return Err(anyhow!("negative rainfall for triangle {}", self.id));
        }
        self.rainfall = Some(value);
        Ok(())
    }

    pub fn downslope(&self) -> anyhow::Result<Option<TriangleId>> {
        self.downslope
            .ok_or_else(|| anyhow!("downslope not initialized for triangle {}", self.id))
    }

    pub fn set_downslope(&mut self, value: Option<TriangleId>) {
        self.downslope = Some(value);
    }

    pub fn flow(&self) -> anyhow::Result<f64> {
        self.flow
            .ok_or_else(|| anyhow!("flow not initialized for triangle {}", self.id))
    }

    pub fn set_flow(&mut self, value: f64) -> anyhow::Result<()> {
        if value < 0.0 {
            return Err(anyhow!("negative flow for triangle {}", self.id));
        }
        self.flow = Some(value);
        Ok(())
    }

    pub fn biome(&self) -> anyhow::Result<Biome> {
        self.biome
            .ok_or_else(|| anyhow!("biome not initialized for triangle {}", self.id))
    }

    pub fn set_biome(&mut self, value: Biome) {
        self.biome = Some(value);
    }
}
