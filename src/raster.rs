//! Stage 6b: project per-triangle fields onto a dense `width x height`
//! pixel grid, then paint rivers over the result.

use crate::mesh::TriangleId;
use crate::world::{MapData, RiverPath, WorldBuilder};
use anyhow::Context;
use std::collections::HashMap;

/// Side length, in pixels, of each spatial-hash bucket. Triangle density at
/// any reasonable `biome_density` keeps mean triangle area well under this
/// cell's area, so "search the pixel's cell plus its 8 neighbors" reliably
/// finds the true nearest centroid.
const BUCKET_SIZE: f64 = 20.0;

pub fn rasterize(world: &WorldBuilder, rivers: &[RiverPath]) -> anyhow::Result<MapData> {
    let width = world.config.width;
    let height = world.config.height;
    let pixel_count = width as usize * height as usize;

    let buckets = build_spatial_hash(world);

    let mut elevation = vec![0.0; pixel_count];
    let mut moisture = vec![0.0; pixel_count];
    let mut temperature = vec![0.0; pixel_count];
    let mut biomes = vec![crate::world::Biome::Ocean; pixel_count];

    for y in 0..height {
        for x in 0..width {
            let px = x as f64 + 0.5;
            let py = y as f64 + 0.5;
            let nearest = nearest_triangle(world, &buckets, px, py)
                .context("rasterization found no triangle for a pixel")?;

            let idx = (y as usize) * (width as usize) + (x as usize);
            elevation[idx] = world.triangles[nearest as usize].elevation()?;
            moisture[idx] = world.triangles[nearest as usize].moisture()?;
            temperature[idx] = world.triangles[nearest as usize].temperature()?;
            biomes[idx] = world.triangles[nearest as usize].biome()?;
        }
    }

    let mut river_grid = vec![0.0; pixel_count];
    paint_rivers(world, rivers, width, height, &mut river_grid)?;

    Ok(MapData {
        width,
        height,
        elevation,
        moisture,
        temperature,
        biomes,
        rivers: river_grid,
    })
}

fn bucket_key(x: f64, y: f64) -> (i64, i64) {
    ((x / BUCKET_SIZE).floor() as i64, (y / BUCKET_SIZE).floor() as i64)
}

fn build_spatial_hash(world: &WorldBuilder) -> HashMap<(i64, i64), Vec<TriangleId>> {
    let mut buckets: HashMap<(i64, i64), Vec<TriangleId>> = HashMap::new();
    for t in world.mesh.triangle_ids() {
        let c = world.mesh.centroid(t);
        buckets.entry(bucket_key(c.x, c.y)).or_default().push(t);
    }
    buckets
}

fn nearest_triangle(
    world: &WorldBuilder,
    buckets: &HashMap<(i64, i64), Vec<TriangleId>>,
    px: f64,
    py: f64,
) -> Option<TriangleId> {
    let (cx, cy) = bucket_key(px, py);
    let mut best: Option<(TriangleId, f64)> = None;

    for dx in -1..=1 {
        for dy in -1..=1 {
            if let Some(ids) = buckets.get(&(cx + dx, cy + dy)) {
                for &t in ids {
                    let c = world.mesh.centroid(t);
                    let dist2 = (c.x - px).powi(2) + (c.y - py).powi(2);
                    if best.map_or(true, |(_, d)| dist2 < d) {
                        best = Some((t, dist2));
                    }
                }
            }
        }
    }

    best.map(|(t, _)| t)
}

fn paint_rivers(
    world: &WorldBuilder,
    rivers: &[RiverPath],
    width: u32,
    height: u32,
    grid: &mut [f64],
) -> anyhow::Result<()> {
    for path in rivers {
        let n = path.triangles.len();
        for (i, &t) in path.triangles.iter().enumerate() {
            let flow = world.triangles[t as usize].flow()?;
            let progress = i as f64 / n.max(1) as f64;
            let scaled_width = (1.0 + 10.0 * flow * (0.2 + 0.8 * progress))
                .ln()
                .max(0.0)
                * world.config.rivers.river_width
                * 5.0;
            let scaled_width = scaled_width.max(1.0);

            let center = world.mesh.centroid(t);
            stamp_disk(center.x, center.y, scaled_width, width, height, grid);
        }
    }
    Ok(())
}

fn stamp_disk(cx: f64, cy: f64, radius: f64, width: u32, height: u32, grid: &mut [f64]) {
    let min_x = (cx - radius).floor().max(0.0) as u32;
    let max_x = (cx + radius).ceil().min(width as f64 - 1.0).max(0.0) as u32;
    let min_y = (cy - radius).floor().max(0.0) as u32;
    let max_y = (cy + radius).ceil().min(height as f64 - 1.0).max(0.0) as u32;

    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let dist = ((x as f64 + 0.5 - cx).powi(2) + (y as f64 + 0.5 - cy).powi(2)).sqrt();
            if dist >= radius {
                continue;
            }
            let value = (1.0 - dist / radius).powf(0.8) * radius;
            let idx = (y as usize) * (width as usize) + (x as usize);
            if value > grid[idx] {
                grid[idx] = value;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_key_groups_nearby_points() {
        assert_eq!(bucket_key(5.0, 5.0), bucket_key(15.0, 15.0));
        assert_ne!(bucket_key(5.0, 5.0), bucket_key(25.0, 5.0));
    }

    #[test]
    fn test_stamp_disk_writes_max() {
        let mut grid = vec![0.5; 10 * 10];
        stamp_disk(5.0, 5.0, 3.0, 10, 10, &mut grid);
        // The center pixel should have been raised above the pre-existing
        // 0.5 floor (disk value at dist=0 is exactly `radius`).
        let idx = 5 * 10 + 5;
        assert!(grid[idx] > 0.5);
    }

    #[test]
    fn test_stamp_disk_never_lowers_existing_value() {
        let mut grid = vec![10.0; 10 * 10];
        stamp_disk(5.0, 5.0, 3.0, 10, 10, &mut grid);
        assert!(grid.iter().all(|&v| v >= 10.0));
    }
}
