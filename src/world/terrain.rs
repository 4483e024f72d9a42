//! Stage 3: per-triangle elevation from a continent mask, a mountain
//! distance field, and multi-octave noise.

use super::{Generate, WorldBuilder};
use crate::mesh::TriangleId;
use crate::util::noise::GradientNoise2D;
use crate::util::NumRange;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

const NOISE_INPUT_SCALE: f64 = 150.0;
const MOUNTAIN_NOISE_THRESHOLD: f64 = 0.7;
const EDGE_NOISE_AMPLITUDES: [f64; 3] = [0.04, 0.02, 0.01];

#[derive(Debug)]
pub struct TerrainGenerator;

impl Generate for TerrainGenerator {
    fn generate(&self, world: &mut WorldBuilder) -> anyhow::Result<()> {
        let n = world.mesh.num_triangles();
        let width = world.config.width as f64;
        let height = world.config.height as f64;
        let terrain = world.config.terrain;
        let ocean_ratio = world.config.shape.ocean_ratio;
        let island_frequency = world.config.shape.island_frequency;

        let noise_continent = GradientNoise2D::new(&mut world.seed_source.stream("terrain-continent"));
        let noise_edge = GradientNoise2D::new(&mut world.seed_source.stream("terrain-edge"));
        let noise_roughness = GradientNoise2D::new(&mut world.seed_source.stream("terrain-roughness"));
        let noise_water = GradientNoise2D::new(&mut world.seed_source.stream("terrain-water"));
        let noise_peak_a = GradientNoise2D::new(&mut world.seed_source.stream("terrain-peak-a"));
        let noise_peak_b = GradientNoise2D::new(&mut world.seed_source.stream("terrain-peak-b"));
        let mut peak_rng = world.seed_source.stream("terrain-peak-draw");
        let mut anisotropy_rng = world.seed_source.stream("terrain-anisotropy");
        let mut center_rng = world.seed_source.stream("terrain-continent-centers");

        // Mountain peaks: interior triangles (never the mesh boundary) whose
        // centroid clears the same noise-product gate the sampler uses for
        // candidate points, independently re-drawn at triangle density.
        let mut peaks = Vec::new();
        for t in world.mesh.triangle_ids() {
            if world.mesh.is_boundary(t) {
                continue;
            }
            let c = world.mesh.centroid(t);
            let nx = c.x / NOISE_INPUT_SCALE;
            let ny = c.y / NOISE_INPUT_SCALE;
            let product = noise_peak_a.get(nx, ny) * noise_peak_b.get(nx, ny);
            if product > MOUNTAIN_NOISE_THRESHOLD
                && peak_rng.bool_with_probability(terrain.mountain_frequency * 0.1)
            {
                peaks.push(t);
            }
        }

        let mountain_dist = mountain_distance_field(world, &peaks, terrain.jaggedness, &mut anisotropy_rng);

        // Continent + island centers, in a 15%-inset rectangle so no center
        // sits right on the map edge.
        let num_continents = (((width * height).sqrt() / 300.0).floor() as i64).clamp(1, 3) as usize;
        let num_islands = (island_frequency * 10.0).floor() as usize;
        let inset_x = width * 0.15;
        let inset_y = height * 0.15;
        let mut centers = Vec::with_capacity(num_continents + num_islands);
        for _ in 0..num_continents {
            let cx = center_rng.range(inset_x, width - inset_x);
            let cy = center_rng.range(inset_y, height - inset_y);
            let size = center_rng.range(0.5, 1.0);
            centers.push((cx, cy, size));
        }
        for _ in 0..num_islands {
            let cx = center_rng.range(0.0, width);
            let cy = center_rng.range(0.0, height);
            let size = center_rng.range(0.1, 0.3);
            centers.push((cx, cy, size));
        }

        let mut raw = vec![0.0; n];
        for t in world.mesh.triangle_ids() {
            if world.mesh.is_boundary(t) {
                raw[t as usize] = 0.0;
                continue;
            }
            let c = world.mesh.centroid(t);

            let mask = continent_mask(
                c.x,
                c.y,
                &centers,
                &noise_continent,
                &noise_edge,
                ocean_ratio,
            );

            let nx = c.x / NOISE_INPUT_SCALE;
            let ny = c.y / NOISE_INPUT_SCALE;
            let terrain_noise = noise_roughness.get(nx, ny);
            let water_noise = (noise_water.get(nx * 0.3, ny * 0.3) + 1.0) / 2.0;

            let mountain_contribution =
                (1.0 - mountain_dist[t as usize]).powi(2) * terrain.mountain_height * 0.5;

            let mut elevation = mask * 0.6 + mountain_contribution + terrain_noise * 0.3;
            if water_noise < 0.3 {
                elevation *= water_noise * 3.0;
            }
            raw[t as usize] = elevation;
        }

        normalize_in_place(&mut raw);

        for t in world.mesh.triangle_ids() {
            let value = if world.mesh.is_boundary(t) { 0.0 } else { raw[t as usize] };
            world.triangles[t as usize].set_elevation(value)?;
        }

        Ok(())
    }
}

/// BFS from all mountain peaks simultaneously via a min-priority queue,
/// weighting each edge by centroid distance times a small per-edge
/// anisotropy jitter so contours aren't perfectly circular.
fn mountain_distance_field(
    world: &WorldBuilder,
    peaks: &[TriangleId],
    jaggedness: f64,
    anisotropy_rng: &mut crate::util::rng::Xorshift32,
) -> Vec<f64> {
    let n = world.mesh.num_triangles();
    let mut dist = vec![f64::INFINITY; n];
    let mut heap = BinaryHeap::new();

    for &peak in peaks {
        dist[peak as usize] = 0.0;
        heap.push(DistEntry { dist: 0.0, id: peak });
    }

    // Anisotropy weights are per (directed) edge, drawn once up front from
    // the seeded stream so the BFS itself stays a pure Dijkstra relaxation
    // (no RNG draws inside the traversal loop, which would make the result
    // depend on visitation order instead of just the seed).
    let mut jitter = vec![[0.0f64; 3]; n];
    for slot in jitter.iter_mut() {
        for w in slot.iter_mut() {
            *w = 1.0 + (anisotropy_rng.uniform() - 0.5) * jaggedness * 0.2;
        }
    }

    while let Some(DistEntry { dist: d, id: t }) = heap.pop() {
        if d > dist[t as usize] {
            continue;
        }
        let centroid_t = world.mesh.centroid(t);
        for (slot, neighbor) in world.mesh.neighbors(t).into_iter().enumerate() {
            let Some(u) = neighbor else { continue };
            let centroid_u = world.mesh.centroid(u);
            let edge_cost = centroid_t.distance_to(centroid_u) * jitter[t as usize][slot];
            let nd = d + edge_cost;
            if nd < dist[u as usize] {
                dist[u as usize] = nd;
                heap.push(DistEntry { dist: nd, id: u });
            }
        }
    }

    let max_finite = dist.iter().copied().filter(|d| d.is_finite()).fold(0.0, f64::max);
    if max_finite > 0.0 {
        for d in dist.iter_mut() {
            *d = if d.is_finite() { *d / max_finite } else { 1.0 };
        }
    } else {
        for d in dist.iter_mut() {
            *d = if d.is_finite() { 0.0 } else { 1.0 };
        }
    }
    dist
}

#[derive(Copy, Clone, Debug)]
struct DistEntry {
    dist: f64,
    id: TriangleId,
}

impl PartialEq for DistEntry {
    fn eq(&self, other: &Self) -> bool {
        self.dist == other.dist && self.id == other.id
    }
}
impl Eq for DistEntry {}

impl PartialOrd for DistEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DistEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so `BinaryHeap` (a max-heap) pops the smallest distance
        // first; ties broken by triangle id for a deterministic traversal
        // order independent of insertion order.
        other
            .dist
            .partial_cmp(&self.dist)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.id.cmp(&self.id))
    }
}

fn continent_mask(
    x: f64,
    y: f64,
    centers: &[(f64, f64, f64)],
    noise_continent: &GradientNoise2D,
    noise_edge: &GradientNoise2D,
    ocean_ratio: f64,
) -> f64 {
    let nx = x / NOISE_INPUT_SCALE;
    let ny = y / NOISE_INPUT_SCALE;
    // Stretch distance anisotropically using a low-frequency noise sample,
    // so continents aren't perfect ellipses.
    let stretch = 1.0 + noise_continent.get(nx * 0.5, ny * 0.5) * 0.3;

    let min_dist = centers
        .iter()
        .map(|&(cx, cy, size)| {
            let dx = (x - cx) / stretch;
            let dy = (y - cy) * stretch;
            (dx * dx + dy * dy).sqrt() / (size * 300.0)
        })
        .fold(f64::INFINITY, f64::min);

    let edge_noise = noise_edge.fbm(nx, ny, 1.0, &EDGE_NOISE_AMPLITUDES);

    let mask = (1.0 - min_dist + edge_noise).max(0.0).powf(1.5);
    if mask <= ocean_ratio {
        0.0
    } else {
        mask
    }
}

fn normalize_in_place(values: &mut [f64]) {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max - min <= 0.0 {
        for v in values.iter_mut() {
            *v = 0.0;
        }
        return;
    }
    let source = NumRange::new(min, max);
    for v in values.iter_mut() {
        *v = source.normalize(*v);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_spans_zero_one() {
        let mut values = vec![2.0, 5.0, -1.0, 3.0];
        normalize_in_place(&mut values);
        let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        assert_eq!(min, 0.0);
        assert_eq!(max, 1.0);
    }

    #[test]
    fn test_normalize_constant_input() {
        let mut values = vec![4.0; 5];
        normalize_in_place(&mut values);
        assert!(values.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_dist_entry_orders_smallest_first() {
        let mut heap = BinaryHeap::new();
        heap.push(DistEntry { dist: 5.0, id: 0 });
        heap.push(DistEntry { dist: 1.0, id: 1 });
        heap.push(DistEntry { dist: 3.0, id: 2 });
        assert_eq!(heap.pop().unwrap().id, 1);
        assert_eq!(heap.pop().unwrap().id, 2);
        assert_eq!(heap.pop().unwrap().id, 0);
    }

    #[test]
    fn test_continent_mask_clamped_below_ocean_ratio() {
        let source = crate::util::rng::SeedSource::new("terrain-test");
        let a = GradientNoise2D::new(&mut source.stream("a"));
        let b = GradientNoise2D::new(&mut source.stream("b"));
        // Far from every center: distance term dominates and pushes the
        // mask to 0 regardless of noise, so it must clamp to 0 under any
        // positive ocean_ratio.
        let mask = continent_mask(1.0e6, 1.0e6, &[(0.0, 0.0, 1.0)], &a, &b, 0.1);
        assert_eq!(mask, 0.0);
    }

    #[test]
    fn test_cmp_f64_orders() {
        use crate::util::cmp_f64;
        let mut values = vec![3.0, 1.0, 2.0];
        values.sort_by(|a, b| cmp_f64(*a, *b));
        assert_eq!(values, vec![1.0, 2.0, 3.0]);
    }
}
