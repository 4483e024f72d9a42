//! Stage 5: downslope selection, sink resolution, flow accumulation, and
//! river path extraction.

use super::WorldBuilder;
use crate::mesh::TriangleId;
use log::debug;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};

/// An ordered chain of mesh-adjacent triangles a river flows through, with
/// the flow value of its source triangle (the rasterizer scales stroke
/// width off this).
#[derive(Clone, Debug)]
pub struct RiverPath {
    pub triangles: Vec<TriangleId>,
    pub source_flow: f64,
}

const RIVER_MIN_LENGTH: usize = 3;
const MAX_RIVER_PATHS: usize = 100;

#[derive(Debug)]
pub struct HydrologyGenerator;

impl HydrologyGenerator {
    pub fn run(&self, world: &mut WorldBuilder) -> anyhow::Result<Vec<RiverPath>> {
        self.compute_downslope(world)?;
        self.resolve_sinks(world)?;
        self.accumulate_flow(world)?;
        self.extract_rivers(world)
    }

    /// Greedy steepest-descent neighbor for every triangle. Boundary
    /// triangles drain off the map by definition, so they get `None`
    /// directly rather than being treated as sinks needing resolution.
    fn compute_downslope(&self, world: &mut WorldBuilder) -> anyhow::Result<()> {
        for t in world.mesh.triangle_ids() {
            if world.mesh.is_boundary(t) {
                world.triangles[t as usize].set_downslope(None);
                continue;
            }
            let elevation_t = world.triangles[t as usize].elevation()?;
            let mut best: Option<(TriangleId, f64)> = None;
            for u in world.mesh.neighbor_ids(t) {
                let elevation_u = world.triangles[u as usize].elevation()?;
                if elevation_u < elevation_t && best.map_or(true, |(_, e)| elevation_u < e) {
                    best = Some((u, elevation_u));
                }
            }
            world.triangles[t as usize].set_downslope(best.map(|(u, _)| u));
        }
        Ok(())
    }

    /// Every land triangle with no downslope is a local minimum (a sink).
    /// Route each one out through the nearest already-resolved drainage,
    /// found by a priority-first (elevation-ascending) search outward
    /// through neighbors, assigning downslope along every hop of the
    /// discovered path so later sinks can reuse the now-resolved chain.
    fn resolve_sinks(&self, world: &mut WorldBuilder) -> anyhow::Result<()> {
        let sinks: Vec<TriangleId> = world
            .mesh
            .triangle_ids()
            .filter(|&t| {
                !world.mesh.is_boundary(t)
                    && world.triangles[t as usize]
                        .downslope()
                        .map(|d| d.is_none())
                        .unwrap_or(false)
            })
            .collect();
        debug!("found {} sink triangles to resolve", sinks.len());

        for sink in sinks {
            if world.triangles[sink as usize].downslope()?.is_some() {
                continue; // resolved already via an earlier sink's path.
            }
            if let Some(path) = search_for_drainage(world, sink) {
                for pair in path.windows(2) {
                    let (from, to) = (pair[0], pair[1]);
                    if world.triangles[from as usize].downslope()?.is_none() {
                        world.triangles[from as usize].set_downslope(Some(to));
                    }
                }
            }
        }
        Ok(())
    }

    /// `flow_t = rainfall_t * rivers` for land triangles, with a snowmelt
    /// bonus well above sea level, then pushed downhill in descending
    /// elevation order so every contributor has already been folded in by
    /// the time a triangle forwards its flow onward.
    fn accumulate_flow(&self, world: &mut WorldBuilder) -> anyhow::Result<()> {
        let sea_level = world.config.shape.sea_level;
        let rivers_scale = world.config.rivers.rivers;
        let n = world.mesh.num_triangles();

        let mut flow = vec![0.0; n];
        for t in world.mesh.triangle_ids() {
            if world.mesh.is_boundary(t) {
                continue;
            }
            let elevation = world.triangles[t as usize].elevation()?;
            if elevation < sea_level {
                continue;
            }
            let rainfall = world.triangles[t as usize].rainfall()?;
            let mut f = rainfall * rivers_scale;
            if elevation - sea_level > 0.5 {
                f *= 1.0 + (elevation - sea_level - 0.5);
            }
            flow[t as usize] = f;
        }

        let mut order: Vec<TriangleId> = world.mesh.triangle_ids().collect();
        order.sort_by(|&a, &b| {
            let ea = world.triangles[a as usize].elevation().unwrap_or(0.0);
            let eb = world.triangles[b as usize].elevation().unwrap_or(0.0);
            eb.partial_cmp(&ea).unwrap_or(Ordering::Equal).then_with(|| a.cmp(&b))
        });

        for t in order {
            if world.mesh.is_boundary(t) {
                continue;
            }
            if let Some(downslope) = world.triangles[t as usize].downslope()? {
                let f = flow[t as usize];
                flow[downslope as usize] += f;
            }
        }

        for t in world.mesh.triangle_ids() {
            world.triangles[t as usize].set_flow(flow[t as usize])?;
        }
        Ok(())
    }

    /// A triangle qualifies as a river source if it's land, well above sea
    /// level, and carries enough flow. Each source traces `downslope`
    /// until it reaches water, a boundary, a dead end, or would cycle
    /// (rejected); surviving paths are capped to bound render cost.
    fn extract_rivers(&self, world: &WorldBuilder) -> anyhow::Result<Vec<RiverPath>> {
        let sea_level = world.config.shape.sea_level;
        let min_flow = world.config.rivers.river_min_flow;

        let mut sources = Vec::new();
        for t in world.mesh.triangle_ids() {
            if world.mesh.is_boundary(t) {
                continue;
            }
            let elevation = world.triangles[t as usize].elevation()?;
            let flow = world.triangles[t as usize].flow()?;
            if elevation > sea_level && elevation > 0.5 && flow >= min_flow {
                sources.push(t);
            }
        }

        let mut paths = Vec::new();
        for source in sources {
            let mut path = vec![source];
            let mut visited = HashSet::new();
            visited.insert(source);
            let mut current = source;
            let mut cyclic = false;

            loop {
                let elevation = world.triangles[current as usize].elevation()?;
                if elevation < sea_level || world.mesh.is_boundary(current) {
                    break;
                }
                match world.triangles[current as usize].downslope()? {
                    None => break,
                    Some(next) => {
                        if !visited.insert(next) {
                            cyclic = true;
                            break;
                        }
                        path.push(next);
                        current = next;
                    }
                }
            }

            if cyclic || path.len() <= RIVER_MIN_LENGTH {
                continue;
            }
            let source_flow = world.triangles[source as usize].flow()?;
            paths.push(RiverPath { triangles: path, source_flow });
        }

        paths.sort_by(|a, b| {
            b.source_flow.partial_cmp(&a.source_flow).unwrap_or(Ordering::Equal)
        });
        paths.truncate(MAX_RIVER_PATHS);
        debug!("retained {} river paths", paths.len());
        Ok(paths)
    }
}

/// Priority-first search outward from `sink`, exploring the lowest-elevation
/// frontier triangle first, until reaching a triangle that already has a
/// resolved drain (a boundary triangle, or one whose downslope is set).
/// Returns the path from `sink` to that triangle, or `None` if the search
/// exhausts the whole mesh without finding one (only possible if the mesh
/// has no boundary at all).
fn search_for_drainage(world: &WorldBuilder, sink: TriangleId) -> Option<Vec<TriangleId>> {
    let mut heap = BinaryHeap::new();
    let mut parent: HashMap<TriangleId, TriangleId> = HashMap::new();
    let mut visited = HashSet::new();
    visited.insert(sink);
    heap.push(SearchEntry {
        elevation: world.triangles[sink as usize].elevation().ok()?,
        id: sink,
    });

    while let Some(SearchEntry { id: t, .. }) = heap.pop() {
        if t != sink {
            let resolved = world.mesh.is_boundary(t)
                || world.triangles[t as usize].downslope().ok()?.is_some();
            if resolved {
                let mut path = vec![t];
                let mut cur = t;
                while let Some(&p) = parent.get(&cur) {
                    path.push(p);
                    cur = p;
                }
                path.reverse();
                return Some(path);
            }
        }

        for u in world.mesh.neighbor_ids(t) {
            if visited.insert(u) {
                parent.insert(u, t);
                let elevation = world.triangles[u as usize].elevation().ok()?;
                heap.push(SearchEntry { elevation, id: u });
            }
        }
    }
    None
}

#[derive(Copy, Clone, Debug)]
struct SearchEntry {
    elevation: f64,
    id: TriangleId,
}

impl PartialEq for SearchEntry {
    fn eq(&self, other: &Self) -> bool {
        self.elevation == other.elevation && self.id == other.id
    }
}
impl Eq for SearchEntry {}

impl PartialOrd for SearchEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SearchEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .elevation
            .partial_cmp(&self.elevation)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.id.cmp(&self.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_entry_min_first() {
        let mut heap = BinaryHeap::new();
        heap.push(SearchEntry { elevation: 0.9, id: 2 });
        heap.push(SearchEntry { elevation: 0.1, id: 0 });
        heap.push(SearchEntry { elevation: 0.5, id: 1 });
        assert_eq!(heap.pop().unwrap().id, 0);
        assert_eq!(heap.pop().unwrap().id, 1);
        assert_eq!(heap.pop().unwrap().id, 2);
    }

    #[test]
    fn test_river_path_length_constant() {
        assert!(RIVER_MIN_LENGTH > 0);
        assert_eq!(MAX_RIVER_PATHS, 100);
    }
}
