//! Shortest-path planning over the built street map.
//!
//! Every query runs one single-source Dijkstra over the dense adjacency
//! (binary heap, `O((V + E) log V)`). Nothing is precomputed for all pairs;
//! callers that ask repeated distance questions keep a [`DistanceCache`].

use crate::street_map::{Neighbor, StreetMap};
use crate::GraphError;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};
use watchman_types::{EdgeRef, VertexId};

/// A planned route: vertices in travel order plus the total distance.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedPath {
    /// Vertices to visit, ending at the target.
    pub nodes: Vec<VertexId>,
    /// Total length in distance units, measured from the start point.
    pub length: f64,
}

/// Memoised single-source distance vectors, keyed by source vertex.
///
/// Tagged with the map generation it was filled from and emptied on the
/// next query after a rebuild.
#[derive(Debug, Clone, Default)]
pub struct DistanceCache {
    by_source: HashMap<usize, Vec<f64>>,
    generation: Option<u64>,
}

impl DistanceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached source vectors.
    pub fn len(&self) -> usize {
        self.by_source.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_source.is_empty()
    }

    pub fn clear(&mut self) {
        self.by_source.clear();
        self.generation = None;
    }
}

/// Heap entry ordered so that `BinaryHeap` pops the smallest cost first.
#[derive(Debug, Clone, Copy, PartialEq)]
struct State {
    cost: f64,
    node: usize,
}

impl Eq for State {}

impl Ord for State {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse on cost for a min-heap, then on node for determinism
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for State {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Distances and predecessors from a (multi-)source Dijkstra run.
struct ShortestPathTree {
    dist: Vec<f64>,
    pred: Vec<Option<usize>>,
}

impl ShortestPathTree {
    /// Walk predecessors back from `target` to whichever source it hangs off.
    fn path_to(&self, target: usize) -> Option<Vec<usize>> {
        if !self.dist[target].is_finite() {
            return None;
        }
        let mut nodes = vec![target];
        let mut current = target;
        while let Some(prev) = self.pred[current] {
            nodes.push(prev);
            current = prev;
        }
        nodes.reverse();
        Some(nodes)
    }
}

/// Dijkstra from a set of sources, each with a starting offset.
fn dijkstra(adjacency: &[Vec<Neighbor>], sources: &[(usize, f64)]) -> ShortestPathTree {
    let n = adjacency.len();
    let mut dist = vec![f64::INFINITY; n];
    let mut pred = vec![None; n];
    let mut heap = BinaryHeap::new();

    for &(node, offset) in sources {
        if offset < dist[node] {
            dist[node] = offset;
            heap.push(State { cost: offset, node });
        }
    }

    while let Some(State { cost, node }) = heap.pop() {
        if cost > dist[node] {
            continue;
        }
        for edge in &adjacency[node] {
            let next = cost + edge.length;
            if next < dist[edge.to] {
                dist[edge.to] = next;
                pred[edge.to] = Some(node);
                heap.push(State {
                    cost: next,
                    node: edge.to,
                });
            }
        }
    }

    ShortestPathTree { dist, pred }
}

impl StreetMap {
    /// Shortest path between two vertices, `None` if unreachable.
    ///
    /// The returned nodes start with `src` and end with `dst`.
    pub fn shortest_path(
        &self,
        src: VertexId,
        dst: VertexId,
    ) -> Result<Option<PlannedPath>, GraphError> {
        let adjacency = self.adjacency()?;
        let source = self.index_of(src)?;
        let target = self.index_of(dst)?;

        let tree = dijkstra(adjacency, &[(source, 0.0)]);
        Ok(self.materialize(&tree, target))
    }

    /// Shortest path from a point on an edge to `target`.
    ///
    /// Both endpoints of the edge are seeded with their along-edge offset,
    /// so the length is exact from the interpolated start position. The
    /// first node is the endpoint the route leaves through.
    pub fn plan_from_edge(
        &self,
        from: EdgeRef,
        target: VertexId,
    ) -> Result<Option<PlannedPath>, GraphError> {
        let adjacency = self.adjacency()?;
        let i1 = self.index_of(from.v1)?;
        let i2 = self.index_of(from.v2)?;
        let target = self.index_of(target)?;
        if !adjacency[i1].iter().any(|n| n.to == i2) {
            return Err(GraphError::UnknownEdge(from.v1, from.v2));
        }
        let length = self.edge_length(from.v1, from.v2)?;

        let tree = dijkstra(
            adjacency,
            &[
                (i1, from.fraction * length),
                (i2, (1.0 - from.fraction) * length),
            ],
        );
        Ok(self.materialize(&tree, target))
    }

    /// Shortest distances from `src` to every vertex, keyed by vertex id.
    ///
    /// Unreachable vertices are omitted.
    pub fn distances_from(&self, src: VertexId) -> Result<HashMap<VertexId, f64>, GraphError> {
        let adjacency = self.adjacency()?;
        let source = self.index_of(src)?;
        let tree = dijkstra(adjacency, &[(source, 0.0)]);
        Ok(tree
            .dist
            .iter()
            .enumerate()
            .filter(|(_, d)| d.is_finite())
            .filter_map(|(i, &d)| self.id_at(i).map(|id| (id, d)))
            .collect())
    }

    /// Street distance between two points on edges.
    ///
    /// Takes the cheapest of leaving `a` through either endpoint and
    /// entering `b` through either endpoint, or the direct along-edge
    /// distance when both lie on the same edge. Returns infinity when the
    /// points are disconnected.
    pub fn network_distance(
        &self,
        cache: &mut DistanceCache,
        a: EdgeRef,
        b: EdgeRef,
    ) -> Result<f64, GraphError> {
        let a1 = self.index_of(a.v1)?;
        let a2 = self.index_of(a.v2)?;
        let b1 = self.index_of(b.v1)?;
        let b2 = self.index_of(b.v2)?;
        let la = self.edge_length(a.v1, a.v2)?;
        let lb = self.edge_length(b.v1, b.v2)?;

        let from_a1 = self.cached_distances(cache, a1)?;
        let via_a1 = (from_a1[b1] + b.fraction * lb).min(from_a1[b2] + (1.0 - b.fraction) * lb)
            + a.fraction * la;
        let from_a2 = self.cached_distances(cache, a2)?;
        let via_a2 = (from_a2[b1] + b.fraction * lb).min(from_a2[b2] + (1.0 - b.fraction) * lb)
            + (1.0 - a.fraction) * la;

        let mut best = via_a1.min(via_a2);
        if a.key() == b.key() {
            let b_aligned = if a.v1 == b.v1 { b } else { b.reversed() };
            best = best.min((a.fraction - b_aligned.fraction).abs() * la);
        }
        Ok(best)
    }

    fn cached_distances<'c>(
        &self,
        cache: &'c mut DistanceCache,
        source: usize,
    ) -> Result<&'c [f64], GraphError> {
        let adjacency = self.adjacency()?;
        if cache.generation != Some(self.generation()) {
            cache.by_source.clear();
            cache.generation = Some(self.generation());
        }
        let dist = cache
            .by_source
            .entry(source)
            .or_insert_with(|| dijkstra(adjacency, &[(source, 0.0)]).dist);
        Ok(dist.as_slice())
    }

    fn materialize(&self, tree: &ShortestPathTree, target: usize) -> Option<PlannedPath> {
        let length = tree.dist[target];
        let nodes = tree
            .path_to(target)?
            .into_iter()
            .map(|i| self.id_at(i))
            .collect::<Option<Vec<_>>>()?;
        Some(PlannedPath { nodes, length })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use watchman_types::Position;

    /// ```text
    ///  0 ---- 1 ---- 2
    ///  |             |
    ///  3 ----------- 4      5 (isolated)
    /// ```
    fn ladder() -> StreetMap {
        let mut map = StreetMap::new();
        let coords = [
            (0, 0.0, 0.0),
            (1, 10.0, 0.0),
            (2, 20.0, 0.0),
            (3, 0.0, 10.0),
            (4, 20.0, 10.0),
            (5, 50.0, 50.0),
        ];
        for (id, x, y) in coords {
            map.add_vertex(VertexId(id), Position::new(x, y)).unwrap();
        }
        for (a, b) in [(0, 1), (1, 2), (0, 3), (3, 4), (4, 2)] {
            map.add_edge(VertexId(a), VertexId(b)).unwrap();
        }
        map.build_graph();
        map
    }

    #[test]
    fn test_shortest_path_prefers_short_route() {
        let map = ladder();
        let path = map
            .shortest_path(VertexId(0), VertexId(2))
            .unwrap()
            .unwrap();
        assert_eq!(path.nodes, vec![VertexId(0), VertexId(1), VertexId(2)]);
        assert_eq!(path.length, 20.0);
    }

    #[test]
    fn test_shortest_path_to_self() {
        let map = ladder();
        let path = map
            .shortest_path(VertexId(3), VertexId(3))
            .unwrap()
            .unwrap();
        assert_eq!(path.nodes, vec![VertexId(3)]);
        assert_eq!(path.length, 0.0);
    }

    #[test]
    fn test_unreachable_target() {
        let map = ladder();
        assert!(map
            .shortest_path(VertexId(0), VertexId(5))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_unbuilt_map_is_an_error() {
        let mut map = StreetMap::new();
        map.add_vertex(VertexId(0), Position::new(0.0, 0.0)).unwrap();
        assert_eq!(
            map.shortest_path(VertexId(0), VertexId(0)).unwrap_err(),
            GraphError::NotBuilt
        );
    }

    #[test]
    fn test_plan_from_edge_leaves_through_nearer_exit() {
        let map = ladder();
        // On edge 1-2, a quarter of the way from 1: target 0 is behind us
        let from = EdgeRef::new(VertexId(1), VertexId(2), 0.25);
        let path = map.plan_from_edge(from, VertexId(0)).unwrap().unwrap();
        assert_eq!(path.nodes, vec![VertexId(1), VertexId(0)]);
        assert_eq!(path.length, 12.5);

        // Target 4 is ahead: continue through 2
        let path = map.plan_from_edge(from, VertexId(4)).unwrap().unwrap();
        assert_eq!(path.nodes, vec![VertexId(2), VertexId(4)]);
        assert_eq!(path.length, 17.5);
    }

    #[test]
    fn test_plan_from_edge_needs_a_street() {
        let map = ladder();
        // 1 and 3 are both vertices but no street joins them
        let from = EdgeRef::new(VertexId(1), VertexId(3), 0.5);
        assert_eq!(
            map.plan_from_edge(from, VertexId(0)).unwrap_err(),
            GraphError::UnknownEdge(VertexId(1), VertexId(3))
        );
    }

    #[test]
    fn test_distances_from_omits_unreachable() {
        let map = ladder();
        let distances = map.distances_from(VertexId(0)).unwrap();
        assert_eq!(distances[&VertexId(4)], 30.0);
        assert!(!distances.contains_key(&VertexId(5)));
    }

    #[test]
    fn test_network_distance_between_edges() {
        let map = ladder();
        let mut cache = DistanceCache::new();
        let a = EdgeRef::new(VertexId(0), VertexId(1), 0.5); // (5, 0)
        let b = EdgeRef::new(VertexId(3), VertexId(4), 0.5); // (10, 10)
        let d = map.network_distance(&mut cache, a, b).unwrap();
        // 5 back to vertex 0, 10 down to 3, 10 along to the midpoint
        assert_eq!(d, 25.0);
        assert_eq!(cache.len(), 2);
        // Symmetric
        assert_eq!(map.network_distance(&mut cache, b, a).unwrap(), 25.0);
    }

    #[test]
    fn test_network_distance_same_edge_either_orientation() {
        let map = ladder();
        let mut cache = DistanceCache::new();
        let a = EdgeRef::new(VertexId(0), VertexId(1), 0.2);
        let b = EdgeRef::new(VertexId(1), VertexId(0), 0.6); // fraction 0.4 from vertex 0
        let d = map.network_distance(&mut cache, a, b).unwrap();
        assert!((d - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_cache_survives_map_growth() {
        let mut map = ladder();
        let mut cache = DistanceCache::new();
        let a = EdgeRef::new(VertexId(0), VertexId(1), 0.0);
        let b = EdgeRef::new(VertexId(1), VertexId(2), 1.0);
        assert_eq!(map.network_distance(&mut cache, a, b).unwrap(), 20.0);

        map.add_vertex(VertexId(6), Position::new(30.0, 0.0)).unwrap();
        map.add_edge(VertexId(2), VertexId(6)).unwrap();
        map.build_graph();

        let c = EdgeRef::new(VertexId(2), VertexId(6), 1.0);
        assert_eq!(map.network_distance(&mut cache, a, c).unwrap(), 30.0);
        assert_eq!(cache.len(), 2);
    }
}
