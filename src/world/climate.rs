//! Stage 4: per-triangle temperature, then wind-ordered moisture
//! propagation and orographic rainfall.

use super::{Generate, WorldBuilder};
use crate::mesh::TriangleId;
use crate::util::noise::GradientNoise2D;
use crate::util::NumRange;
use anyhow::Context;

const NOISE_INPUT_SCALE: f64 = 150.0;
/// Deep ocean is anything more than this far below sea level; such
/// triangles sit out of the moisture-propagation sweep entirely.
const DEEP_OCEAN_MARGIN: f64 = 0.1;

#[derive(Debug)]
pub struct ClimateGenerator;

impl Generate for ClimateGenerator {
    fn generate(&self, world: &mut WorldBuilder) -> anyhow::Result<()> {
        let height = world.config.height as f64;
        let sea_level = world.config.shape.sea_level;
        let climate = world.config.climate;

        let noise_temperature = GradientNoise2D::new(&mut world.seed_source.stream("climate-temperature"));
        let noise_wind = GradientNoise2D::new(&mut world.seed_source.stream("climate-wind"));

        for t in world.mesh.triangle_ids() {
            let elevation = world.triangles[t as usize].elevation().context("temperature stage")?;
            let c = world.mesh.centroid(t);
            let latitude = ((c.y / height) - 0.5).abs() * 2.0;
            let mut temp = 1.0 - latitude.powf(1.2);
            temp -= 0.6 * (elevation - sea_level).max(0.0);
            if elevation < sea_level {
                temp = 0.8 * temp + 0.2;
            }
            let nx = c.x / NOISE_INPUT_SCALE;
            let ny = c.y / NOISE_INPUT_SCALE;
            temp += noise_temperature.get(nx, ny) * 0.05;
            world.triangles[t as usize].set_temperature(NumRange::ZERO_ONE.clamp(temp))?;
        }

        // Wind order: ascending projection onto the prevailing wind vector,
        // i.e. upwind triangles first.
        let theta = climate.wind_angle_deg.to_radians();
        let wind = (theta.cos(), theta.sin());
        let mut order: Vec<TriangleId> = world.mesh.triangle_ids().collect();
        order.sort_by(|&a, &b| {
            let ca = world.mesh.centroid(a);
            let cb = world.mesh.centroid(b);
            let pa = ca.x * wind.0 + ca.y * wind.1;
            let pb = cb.x * wind.0 + cb.y * wind.1;
            pa.partial_cmp(&pb).unwrap_or(std::cmp::Ordering::Equal).then_with(|| a.cmp(&b))
        });

        for t in world.mesh.triangle_ids() {
            let elevation = world.triangles[t as usize].elevation()?;
            let initial = if elevation < sea_level { 1.0 } else { 0.1 };
            world.triangles[t as usize].set_moisture(initial)?;
            world.triangles[t as usize].set_rainfall(0.0)?;
        }

        for &t in &order {
            if world.mesh.is_boundary(t) {
                continue;
            }
            let elevation_t = world.triangles[t as usize].elevation()?;
            if elevation_t < sea_level - DEEP_OCEAN_MARGIN {
                continue;
            }
            let c = world.mesh.centroid(t);
            let nx = c.x / NOISE_INPUT_SCALE;
            let ny = c.y / NOISE_INPUT_SCALE;
            let turbulence_x = noise_wind.get(nx * 0.2, ny * 0.2) * 0.2;
            let turbulence_y = noise_wind.get(nx * 0.2 + 31.7, ny * 0.2 + 11.3) * 0.2;
            let local_wind = crate::geometry::Point2::new(wind.0 + turbulence_x, wind.1 + turbulence_y)
                .normalized();

            let mut moisture_t = world.triangles[t as usize].moisture()?;
            let mut rainfall_t = world.triangles[t as usize].rainfall()?;
            let land_t = elevation_t >= sea_level;

            for u in world.mesh.neighbor_ids(t) {
                let dir = world.mesh.centroid(t) - world.mesh.centroid(u);
                if dir.dot(local_wind) <= 0.0 {
                    continue;
                }
                let moisture_u = world.triangles[u as usize].moisture()?;
                let elevation_u = world.triangles[u as usize].elevation()?;

                moisture_t += 0.2 * moisture_u;

                let delta_h = elevation_t - elevation_u;
                if delta_h > 0.0 {
                    let land_factor = if land_t { 1.0 } else { 0.3 };
                    rainfall_t += moisture_u * climate.raininess * (5.0 * delta_h).min(1.0) * land_factor;
                    if delta_h > 0.1 {
                        moisture_t -= moisture_u * (climate.rain_shadow * 2.0 * delta_h).min(0.9);
                    }
                }
            }

            moisture_t = NumRange::ZERO_ONE.clamp(moisture_t);

            if land_t {
                moisture_t += rainfall_t * climate.evaporation * 0.3;
            } else {
                moisture_t = 1.0;
            }

            world.triangles[t as usize].set_moisture(NumRange::ZERO_ONE.clamp(moisture_t))?;
            world.triangles[t as usize].set_rainfall(rainfall_t.max(0.0))?;
        }

        let max_rainfall = world
            .mesh
            .triangle_ids()
            .map(|t| world.triangles[t as usize].rainfall())
            .collect::<anyhow::Result<Vec<_>>>()?
            .into_iter()
            .fold(0.0, f64::max);
        if max_rainfall > 0.0 {
            for t in world.mesh.triangle_ids() {
                let r = world.triangles[t as usize].rainfall()?;
                world.triangles[t as usize].set_rainfall(r / max_rainfall)?;
            }
        }

        Ok(())
    }
}
