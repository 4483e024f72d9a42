//! Point sampling for mesh construction: a jittered interior grid plus a
//! ring of boundary points, so the final triangulation tiles the whole
//! `width x height` rectangle instead of just its convex interior.

use crate::config::{MapConfig, TerrainConfig};
use crate::geometry::Point2;
use crate::util::noise::GradientNoise2D;
use crate::util::rng::SeedSource;

/// A constant borrowed from the same idiom as the teacher's noise-input
/// scaling: dividing pixel coordinates down into noise-space before
/// sampling keeps noise frequency independent of absolute map size.
const NOISE_INPUT_SCALE: f64 = 150.0;

/// Threshold above which the product of two independent noise fields marks
/// an interior point as eligible to become a mountain peak candidate.
const MOUNTAIN_NOISE_THRESHOLD: f64 = 0.7;

/// The sampled point set a [`crate::mesh::Mesh`] is triangulated from, plus
/// the subset of interior points qualified as mountain peak candidates.
pub struct PointSet {
    pub points: Vec<Point2>,
    /// Indices into `points` that are candidate mountain peaks.
    pub mountain_candidates: Vec<usize>,
}

/// Sample a boundary ring plus a jittered interior grid for a
/// `width x height` map, using `config.terrain` to control density and
/// mountain-candidate selection.
pub fn generate_points(config: &MapConfig, seed_source: &SeedSource) -> PointSet {
    let width = config.width as f64;
    let height = config.height as f64;
    let terrain = &config.terrain;

    let cell_size = compute_cell_size(width, height, terrain);

    let mut points = boundary_points(width, height, cell_size);
    let interior_start = points.len();

    let mut jitter_rng = seed_source.stream("sampler-jitter");
    let mut draw_rng = seed_source.stream("sampler-mountain-draw");
    let noise_a = GradientNoise2D::new(&mut seed_source.stream("sampler-mountain-noise-a"));
    let noise_b = GradientNoise2D::new(&mut seed_source.stream("sampler-mountain-noise-b"));

    let mut mountain_candidates = Vec::new();

    let mut y = cell_size / 2.0;
    while y < height {
        let mut x = cell_size / 2.0;
        while x < width {
            let jitter_x = jitter_rng.signed_unit() * cell_size * terrain.point_deviation;
            let jitter_y = jitter_rng.signed_unit() * cell_size * terrain.point_deviation;
            let px = (x + jitter_x).clamp(cell_size / 2.0, width - cell_size / 2.0);
            let py = (y + jitter_y).clamp(cell_size / 2.0, height - cell_size / 2.0);

            let index = points.len();
            points.push(Point2::new(px, py));

            let nx = px / NOISE_INPUT_SCALE;
            let ny = py / NOISE_INPUT_SCALE;
            let product = noise_a.get(nx, ny) * noise_b.get(nx, ny);
            if product > MOUNTAIN_NOISE_THRESHOLD
                && draw_rng.bool_with_probability(terrain.mountain_frequency)
            {
                mountain_candidates.push(index);
            }

            x += cell_size;
        }
        y += cell_size;
    }

    debug_assert!(points.len() > interior_start, "no interior points sampled");

    PointSet {
        points,
        mountain_candidates,
    }
}

/// Target spacing between sample points, derived from map area and
/// `biome_density`. Clamped to a safety minimum so a pathological (very
/// high) density config can't blow up the point count into the millions.
fn compute_cell_size(width: f64, height: f64, terrain: &TerrainConfig) -> f64 {
    let area = width * height;
    let target_points = (area * terrain.biome_density / 30.0).max(1.0);
    let cell_size = (area / target_points).sqrt();
    cell_size.max(2.0)
}

/// A ring of points around the rectangle's edge, spaced `cell_size / 2`
/// apart, walked bottom -> right -> top -> left so the loop closes back on
/// its own starting corner without emitting a duplicate.
fn boundary_points(width: f64, height: f64, cell_size: f64) -> Vec<Point2> {
    let spacing = (cell_size / 2.0).max(1.0);
    let mut points = Vec::new();

    let mut x = 0.0;
    while x < width {
        points.push(Point2::new(x, 0.0));
        x += spacing;
    }
    let mut y = 0.0;
    while y < height {
        points.push(Point2::new(width, y));
        y += spacing;
    }
    let mut x = width;
    while x > 0.0 {
        points.push(Point2::new(x, height));
        x -= spacing;
    }
    let mut y = height;
    while y > 0.0 {
        points.push(Point2::new(0.0, y));
        y -= spacing;
    }

    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MapConfig;

    fn test_config() -> MapConfig {
        MapConfig {
            seed: "sampler-test".to_string(),
            width: 200,
            height: 150,
            ..MapConfig::default()
        }
    }

    #[test]
    fn test_points_inside_bounds() {
        let config = test_config();
        let source = SeedSource::new(config.seed.clone());
        let set = generate_points(&config, &source);
        for p in &set.points {
            assert!(p.x >= 0.0 && p.x <= config.width as f64);
            assert!(p.y >= 0.0 && p.y <= config.height as f64);
        }
    }

    #[test]
    fn test_deterministic() {
        let config = test_config();
        let source = SeedSource::new(config.seed.clone());
        let a = generate_points(&config, &source);
        let b = generate_points(&config, &source);
        assert_eq!(a.points.len(), b.points.len());
        for (p, q) in a.points.iter().zip(b.points.iter()) {
            assert_eq!(p.x, q.x);
            assert_eq!(p.y, q.y);
        }
        assert_eq!(a.mountain_candidates, b.mountain_candidates);
    }

    #[test]
    fn test_has_interior_points() {
        let config = test_config();
        let source = SeedSource::new(config.seed.clone());
        let set = generate_points(&config, &source);
        assert!(set.points.len() > 4);
    }

    #[test]
    fn test_mountain_candidates_are_interior_indices() {
        let config = test_config();
        let source = SeedSource::new(config.seed.clone());
        let set = generate_points(&config, &source);
        for &idx in &set.mountain_candidates {
            assert!(idx < set.points.len());
        }
    }

    #[test]
    fn test_zero_mountain_frequency_yields_no_candidates() {
        let mut config = test_config();
        config.terrain.mountain_frequency = 0.0;
        let source = SeedSource::new(config.seed.clone());
        let set = generate_points(&config, &source);
        assert!(set.mountain_candidates.is_empty());
    }
}
