pub mod sampler;

use crate::geometry::Point2;
use anyhow::{anyhow, Result};

/// A triangle id. Triangles are numbered densely `0..num_triangles()`, so a
/// plain `u32` index (rather than a hex-grid-style coordinate type) is all
/// the identity a triangle needs.
pub type TriangleId = u32;

/// An irregular triangular mesh built from a Delaunay triangulation of a
/// [`sampler`]-produced point set. Built once per generation run and never
/// mutated afterwards; every later pipeline stage only reads from it.
///
/// Internally this wraps the `delaunator` crate, whose `triangles`/
/// `halfedges` index buffers are exactly the "flat array, opposite halfedge
/// by division" representation this type's `neighbors`/`is_boundary`
/// derivation is built on.
#[derive(Clone, Debug)]
pub struct Mesh {
    points: Vec<Point2>,
    /// Vertex indices (into `points`) for each triangle's three corners.
    triangles: Vec<[u32; 3]>,
    /// Up to three neighboring triangle ids, one per edge; `None` at the
    /// mesh boundary.
    neighbors: Vec<[Option<TriangleId>; 3]>,
    centroids: Vec<Point2>,
}

impl Mesh {
    /// Triangulate `points` into a [`Mesh`]. Fails if the point set is too
    /// degenerate to triangulate at all (fewer than 3 points, or all
    /// collinear) or if the resulting triangulation is empty.
    pub fn build(points: &[Point2]) -> Result<Self> {
        let del_points: Vec<delaunator::Point> = points
            .iter()
            .map(|p| delaunator::Point { x: p.x, y: p.y })
            .collect();
        let triangulation = delaunator::triangulate(&del_points)
            .ok_or_else(|| anyhow!("triangulation failed on degenerate point set"))?;

        let num_triangles = triangulation.triangles.len() / 3;
        if num_triangles == 0 {
            return Err(anyhow!("triangulation produced zero triangles"));
        }

        let mut triangles = Vec::with_capacity(num_triangles);
        for t in 0..num_triangles {
            triangles.push([
                triangulation.triangles[3 * t] as u32,
                triangulation.triangles[3 * t + 1] as u32,
                triangulation.triangles[3 * t + 2] as u32,
            ]);
        }

        let mut neighbors = vec![[None; 3]; num_triangles];
        for (e, &opposite) in triangulation.halfedges.iter().enumerate() {
            let t = e / 3;
            let j = e % 3;
            neighbors[t][j] = if opposite == delaunator::EMPTY {
                None
            } else {
                Some((opposite / 3) as TriangleId)
            };
        }

        let centroids = triangles
            .iter()
            .map(|v| {
                let p0 = points[v[0] as usize];
                let p1 = points[v[1] as usize];
                let p2 = points[v[2] as usize];
                Point2::new(
                    (p0.x + p1.x + p2.x) / 3.0,
                    (p0.y + p1.y + p2.y) / 3.0,
                )
            })
            .collect();

        Ok(Self {
            points: points.to_vec(),
            triangles,
            neighbors,
            centroids,
        })
    }

    pub fn num_triangles(&self) -> usize {
        self.triangles.len()
    }

    pub fn centroid(&self, t: TriangleId) -> Point2 {
        self.centroids[t as usize]
    }

    pub fn neighbors(&self, t: TriangleId) -> [Option<TriangleId>; 3] {
        self.neighbors[t as usize]
    }

    /// Iterate over the (up to three) real neighbor ids of `t`, skipping
    /// boundary edges.
    pub fn neighbor_ids(&self, t: TriangleId) -> impl Iterator<Item = TriangleId> + '_ {
        self.neighbors[t as usize].into_iter().flatten()
    }

    pub fn is_boundary(&self, t: TriangleId) -> bool {
        self.neighbors[t as usize].iter().any(Option::is_none)
    }

    pub fn vertices(&self, t: TriangleId) -> [Point2; 3] {
        let v = self.triangles[t as usize];
        [
            self.points[v[0] as usize],
            self.points[v[1] as usize],
            self.points[v[2] as usize],
        ]
    }

    pub fn triangle_ids(&self) -> impl Iterator<Item = TriangleId> {
        0..self.num_triangles() as TriangleId
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_points(n: usize) -> Vec<Point2> {
        let mut points = Vec::new();
        for y in 0..n {
            for x in 0..n {
                points.push(Point2::new(x as f64 * 10.0, y as f64 * 10.0));
            }
        }
        points
    }

    #[test]
    fn test_build_basic() {
        let mesh = Mesh::build(&grid_points(8)).unwrap();
        assert!(mesh.num_triangles() > 0);
    }

    #[test]
    fn test_neighbor_symmetry() {
        let mesh = Mesh::build(&grid_points(10)).unwrap();
        for t in mesh.triangle_ids() {
            for u in mesh.neighbor_ids(t) {
                assert!(
                    mesh.neighbor_ids(u).any(|back| back == t),
                    "triangle {t} has neighbor {u} but not vice versa"
                );
            }
        }
    }

    #[test]
    fn test_centroids_inside_bounds() {
        let n = 10;
        let span = (n - 1) as f64 * 10.0;
        let mesh = Mesh::build(&grid_points(n)).unwrap();
        for t in mesh.triangle_ids() {
            let c = mesh.centroid(t);
            assert!(c.x >= 0.0 && c.x <= span);
            assert!(c.y >= 0.0 && c.y <= span);
        }
    }

    #[test]
    fn test_boundary_detection_consistent() {
        let mesh = Mesh::build(&grid_points(10)).unwrap();
        for t in mesh.triangle_ids() {
            let has_none = mesh.neighbors(t).iter().any(Option::is_none);
            assert_eq!(has_none, mesh.is_boundary(t));
        }
    }

    #[test]
    fn test_degenerate_point_set_errors() {
        let points = vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(2.0, 0.0),
        ];
        assert!(Mesh::build(&points).is_err());
    }
}
