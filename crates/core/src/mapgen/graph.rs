//! Per-floor connectivity graph: a Bowyer-Watson triangulation over room
//! centers supplies locally-short candidate edges, Kruskal's algorithm
//! extracts the spanning tree, and a seeded subset of the leftover
//! candidates is retained as loop edges.

use std::collections::BTreeSet;

use crate::error::GenerationError;
use crate::types::RoomId;

use super::rng::RandomStream;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) struct GraphEdge {
    pub(super) a: RoomId,
    pub(super) b: RoomId,
    /// Squared Euclidean distance between doubled centers. Monotone with
    /// true distance, so MST selection is unaffected and stays integral.
    pub(super) weight: i64,
}

#[derive(Clone, Debug, Default)]
pub(super) struct FloorGraph {
    /// Spanning-tree edges, weight ascending.
    pub(super) tree: Vec<GraphEdge>,
    /// Retained loop edges, weight ascending.
    pub(super) loops: Vec<GraphEdge>,
}

/// Builds the corridor graph for one floor's rooms. `rooms` pairs each
/// id with its center and must be in stable generation order.
pub(super) fn build_floor_graph(
    rooms: &[(RoomId, (f64, f64))],
    loop_ratio: f64,
    rng: &mut RandomStream,
    floor: u32,
) -> Result<FloorGraph, GenerationError> {
    if rooms.len() < 2 {
        return Ok(FloorGraph::default());
    }

    let mut candidates = candidate_edges(rooms);
    ensure_candidates_connected(rooms, &mut candidates, floor)?;

    let mut edges: Vec<GraphEdge> = candidates
        .iter()
        .map(|&(i, j)| GraphEdge {
            a: rooms[i].0,
            b: rooms[j].0,
            weight: squared_distance(rooms[i].1, rooms[j].1),
        })
        .collect();
    edges.sort_by_key(|edge| (edge.weight, edge.a, edge.b));

    // Kruskal over the sorted candidates; ids break weight ties.
    let index_of =
        |id: RoomId| rooms.iter().position(|(room, _)| *room == id).expect("edge endpoint known");
    let mut components = UnionFind::new(rooms.len());
    let mut tree = Vec::new();
    let mut extras = Vec::new();
    for edge in edges {
        if components.unite(index_of(edge.a), index_of(edge.b)) {
            tree.push(edge);
        } else {
            extras.push(edge);
        }
    }
    debug_assert_eq!(tree.len(), rooms.len() - 1);

    // A fixed-size random subset keeps the retained loop count a pure
    // function of the ratio, which pins it down for regression tests.
    let loop_count = (loop_ratio * extras.len() as f64).floor() as usize;
    rng.shuffle(&mut extras);
    let mut loops: Vec<GraphEdge> = extras.into_iter().take(loop_count).collect();
    loops.sort_by_key(|edge| (edge.weight, edge.a, edge.b));

    log::debug!(
        "floor {floor}: {} tree edges, {} loop edges retained",
        tree.len(),
        loops.len()
    );
    Ok(FloorGraph { tree, loops })
}

fn squared_distance(a: (f64, f64), b: (f64, f64)) -> i64 {
    // Centers sit on half-cell coordinates; doubling keeps this exact.
    let dx = ((a.0 - b.0) * 2.0) as i64;
    let dy = ((a.1 - b.1) * 2.0) as i64;
    dx * dx + dy * dy
}

/// Candidate edge set as index pairs (i < j). Triangulation for four or
/// more rooms, complete graph below that. Degenerate layouts (collinear
/// centers) may come back disconnected; the caller repairs that.
fn candidate_edges(rooms: &[(RoomId, (f64, f64))]) -> BTreeSet<(usize, usize)> {
    if rooms.len() < 4 {
        let mut edges = BTreeSet::new();
        for i in 0..rooms.len() {
            for j in (i + 1)..rooms.len() {
                edges.insert((i, j));
            }
        }
        return edges;
    }

    let points: Vec<(f64, f64)> = rooms.iter().map(|(_, center)| *center).collect();
    triangulate(&points)
}

/// Links disconnected candidate components by their nearest room pair
/// until one component remains.
fn ensure_candidates_connected(
    rooms: &[(RoomId, (f64, f64))],
    candidates: &mut BTreeSet<(usize, usize)>,
    floor: u32,
) -> Result<(), GenerationError> {
    let mut components = UnionFind::new(rooms.len());
    for &(i, j) in candidates.iter() {
        components.unite(i, j);
    }

    loop {
        let mut split = false;
        let mut best: Option<(i64, usize, usize)> = None;
        for i in 0..rooms.len() {
            for j in (i + 1)..rooms.len() {
                if components.find(i) == components.find(j) {
                    continue;
                }
                split = true;
                let weight = squared_distance(rooms[i].1, rooms[j].1);
                if best.is_none_or(|current| (weight, i, j) < current) {
                    best = Some((weight, i, j));
                }
            }
        }
        if !split {
            return Ok(());
        }
        let Some((_, i, j)) = best else {
            return Err(GenerationError::GraphConnectivityFailure { floor });
        };
        log::debug!("floor {floor}: bridging disconnected candidate components {i} and {j}");
        candidates.insert((i, j));
        components.unite(i, j);
    }
}

struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<u32>,
}

impl UnionFind {
    fn new(len: usize) -> Self {
        Self { parent: (0..len).collect(), rank: vec![0; len] }
    }

    fn find(&mut self, index: usize) -> usize {
        if self.parent[index] != index {
            let root = self.find(self.parent[index]);
            self.parent[index] = root;
        }
        self.parent[index]
    }

    /// Returns false when both were already in the same set.
    fn unite(&mut self, a: usize, b: usize) -> bool {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra == rb {
            return false;
        }
        if self.rank[ra] > self.rank[rb] {
            self.parent[rb] = ra;
        } else {
            self.parent[ra] = rb;
            if self.rank[ra] == self.rank[rb] {
                self.rank[rb] += 1;
            }
        }
        true
    }
}

/// Bowyer-Watson Delaunay triangulation, returning unique edges as index
/// pairs. Points are inserted in slice order for determinism.
fn triangulate(points: &[(f64, f64)]) -> BTreeSet<(usize, usize)> {
    let n = points.len();

    let min_x = points.iter().map(|p| p.0).fold(f64::INFINITY, f64::min);
    let max_x = points.iter().map(|p| p.0).fold(f64::NEG_INFINITY, f64::max);
    let min_y = points.iter().map(|p| p.1).fold(f64::INFINITY, f64::min);
    let max_y = points.iter().map(|p| p.1).fold(f64::NEG_INFINITY, f64::max);
    let span = (max_x - min_x).max(max_y - min_y).max(1.0);
    let mid_x = (min_x + max_x) / 2.0;
    let mid_y = (min_y + max_y) / 2.0;

    let mut all_points = points.to_vec();
    all_points.push((mid_x - 20.0 * span, mid_y - span));
    all_points.push((mid_x + 20.0 * span, mid_y - span));
    all_points.push((mid_x, mid_y + 20.0 * span));

    let mut triangles: Vec<[usize; 3]> = vec![[n, n + 1, n + 2]];

    for point in 0..n {
        let mut polygon: Vec<(usize, usize)> = Vec::new();
        let mut kept: Vec<[usize; 3]> = Vec::new();

        for triangle in &triangles {
            if circumcircle_contains(&all_points, *triangle, all_points[point]) {
                for &(a, b) in
                    &[(triangle[0], triangle[1]), (triangle[1], triangle[2]), (triangle[2], triangle[0])]
                {
                    let edge = if a < b { (a, b) } else { (b, a) };
                    if let Some(found) = polygon.iter().position(|&existing| existing == edge) {
                        // Shared between two bad triangles: interior edge.
                        polygon.remove(found);
                    } else {
                        polygon.push(edge);
                    }
                }
            } else {
                kept.push(*triangle);
            }
        }

        for (a, b) in polygon {
            kept.push([a, b, point]);
        }
        triangles = kept;
    }

    let mut edges = BTreeSet::new();
    for triangle in triangles {
        if triangle.iter().any(|&vertex| vertex >= n) {
            continue;
        }
        for &(a, b) in
            &[(triangle[0], triangle[1]), (triangle[1], triangle[2]), (triangle[2], triangle[0])]
        {
            edges.insert(if a < b { (a, b) } else { (b, a) });
        }
    }
    edges
}

fn circumcircle_contains(points: &[(f64, f64)], triangle: [usize; 3], p: (f64, f64)) -> bool {
    let (ax, ay) = (points[triangle[0]].0 - p.0, points[triangle[0]].1 - p.1);
    let (bx, by) = (points[triangle[1]].0 - p.0, points[triangle[1]].1 - p.1);
    let (cx, cy) = (points[triangle[2]].0 - p.0, points[triangle[2]].1 - p.1);

    let det = (ax * ax + ay * ay) * (bx * cy - cx * by)
        - (bx * bx + by * by) * (ax * cy - cx * ay)
        + (cx * cx + cy * cy) * (ax * by - bx * ay);

    let orientation = (points[triangle[1]].0 - points[triangle[0]].0)
        * (points[triangle[2]].1 - points[triangle[0]].1)
        - (points[triangle[2]].0 - points[triangle[0]].0)
            * (points[triangle[1]].1 - points[triangle[0]].1);

    if orientation > 0.0 { det > 0.0 } else { det < 0.0 }
}

#[cfg(test)]
mod tests {
    use slotmap::SlotMap;

    use super::*;

    fn rooms_at(centers: &[(f64, f64)]) -> Vec<(RoomId, (f64, f64))> {
        let mut ids: SlotMap<RoomId, ()> = SlotMap::with_key();
        centers.iter().map(|&center| (ids.insert(()), center)).collect()
    }

    fn is_connected(rooms: &[(RoomId, (f64, f64))], edges: &[GraphEdge]) -> bool {
        let mut components = UnionFind::new(rooms.len());
        let index_of = |id: RoomId| rooms.iter().position(|(room, _)| *room == id).unwrap();
        for edge in edges {
            components.unite(index_of(edge.a), index_of(edge.b));
        }
        let root = components.find(0);
        (1..rooms.len()).all(|i| components.find(i) == root)
    }

    #[test]
    fn spanning_tree_has_one_edge_fewer_than_rooms_and_connects_them() {
        let rooms = rooms_at(&[
            (3.0, 4.5),
            (20.0, 5.0),
            (11.5, 17.0),
            (30.0, 22.5),
            (6.0, 28.0),
            (25.5, 12.0),
            (15.0, 30.0),
        ]);
        let mut rng = RandomStream::new(9);

        let graph = build_floor_graph(&rooms, 0.0, &mut rng, 0).expect("graph builds");

        assert_eq!(graph.tree.len(), rooms.len() - 1);
        assert!(graph.loops.is_empty());
        assert!(is_connected(&rooms, &graph.tree));
    }

    #[test]
    fn collinear_centers_still_produce_a_connected_tree() {
        let rooms = rooms_at(&[(2.0, 5.0), (8.0, 5.0), (14.0, 5.0), (20.0, 5.0), (26.0, 5.0)]);
        let mut rng = RandomStream::new(4);

        let graph = build_floor_graph(&rooms, 0.5, &mut rng, 0).expect("fallback bridges");

        assert_eq!(graph.tree.len(), rooms.len() - 1);
        assert!(is_connected(&rooms, &graph.tree));
    }

    #[test]
    fn loop_edge_count_is_the_floor_of_ratio_times_extras() {
        let rooms = rooms_at(&[
            (3.0, 4.5),
            (20.0, 5.0),
            (11.5, 17.0),
            (30.0, 22.5),
            (6.0, 28.0),
            (25.5, 12.0),
            (15.0, 30.0),
            (33.0, 8.0),
        ]);

        let mut rng = RandomStream::new(12);
        let full = build_floor_graph(&rooms, 1.0, &mut rng, 0).expect("graph builds");
        let extras = full.loops.len();
        assert!(extras > 0, "triangulation should yield non-tree candidates");

        let mut rng = RandomStream::new(12);
        let half = build_floor_graph(&rooms, 0.5, &mut rng, 0).expect("graph builds");
        assert_eq!(half.loops.len(), extras / 2);
    }

    #[test]
    fn two_rooms_get_a_single_direct_edge() {
        let rooms = rooms_at(&[(4.0, 4.0), (10.0, 9.0)]);
        let mut rng = RandomStream::new(2);

        let graph = build_floor_graph(&rooms, 1.0, &mut rng, 0).expect("graph builds");

        assert_eq!(graph.tree.len(), 1);
        assert!(graph.loops.is_empty());
        assert_eq!(graph.tree[0].a, rooms[0].0);
        assert_eq!(graph.tree[0].b, rooms[1].0);
    }

    #[test]
    fn same_seed_selects_the_same_loop_edges() {
        let rooms = rooms_at(&[
            (3.0, 4.5),
            (20.0, 5.0),
            (11.5, 17.0),
            (30.0, 22.5),
            (6.0, 28.0),
            (25.5, 12.0),
        ]);

        let a = build_floor_graph(&rooms, 0.6, &mut RandomStream::new(31), 0).unwrap();
        let b = build_floor_graph(&rooms, 0.6, &mut RandomStream::new(31), 0).unwrap();

        assert_eq!(a.tree, b.tree);
        assert_eq!(a.loops, b.loops);
    }
}
