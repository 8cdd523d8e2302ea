//! Vertex/edge storage and adjacency construction.

use crate::GraphError;
use indexmap::IndexMap;
use tracing::debug;
use watchman_types::{EdgeRef, Position, VertexId};

/// One outgoing adjacency entry, by dense vertex index.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Neighbor {
    pub to: usize,
    pub length: f64,
}

/// Undirected street graph with Euclidean edge weights.
///
/// Vertices keep their insertion order; that order is the dense index used
/// by the adjacency list and the planner. Parallel edges are kept as-is.
#[derive(Debug, Clone, Default)]
pub struct StreetMap {
    /// Vertex id -> coordinates, in insertion order.
    vertices: IndexMap<VertexId, Position>,

    /// Edges in insertion order, as added by the host.
    edges: Vec<(VertexId, VertexId)>,

    /// Euclidean length per edge, parallel to `edges`.
    lengths: Vec<f64>,

    /// Dense adjacency. `None` until built, and again after any mutation.
    adjacency: Option<Vec<Vec<Neighbor>>>,

    /// Number of completed `build_graph` calls.
    generation: u64,
}

impl StreetMap {
    /// Create an empty street map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a vertex with a unique id.
    pub fn add_vertex(&mut self, id: VertexId, position: Position) -> Result<(), GraphError> {
        if self.vertices.contains_key(&id) {
            return Err(GraphError::DuplicateVertex(id));
        }
        if !position.x.is_finite() || !position.y.is_finite() {
            return Err(GraphError::InvalidCoordinates(id));
        }
        self.vertices.insert(id, position);
        self.adjacency = None;
        Ok(())
    }

    /// Add an undirected edge between two existing vertices.
    pub fn add_edge(&mut self, v1: VertexId, v2: VertexId) -> Result<(), GraphError> {
        let p1 = self.position(v1)?;
        let p2 = self.position(v2)?;
        self.edges.push((v1, v2));
        self.lengths.push(p1.distance(p2));
        self.adjacency = None;
        Ok(())
    }

    /// Build the adjacency list from the accumulated vertices and edges.
    ///
    /// Cheap to call again; an empty map builds trivially.
    pub fn build_graph(&mut self) {
        let mut adjacency = vec![Vec::new(); self.vertices.len()];
        for (&(v1, v2), &length) in self.edges.iter().zip(&self.lengths) {
            // Endpoints were validated in add_edge and vertices are never removed.
            let (Some(i1), Some(i2)) = (
                self.vertices.get_index_of(&v1),
                self.vertices.get_index_of(&v2),
            ) else {
                continue;
            };
            adjacency[i1].push(Neighbor { to: i2, length });
            if i1 != i2 {
                adjacency[i2].push(Neighbor { to: i1, length });
            }
        }
        debug!(
            vertices = self.vertices.len(),
            edges = self.edges.len(),
            "Built street map adjacency"
        );
        self.adjacency = Some(adjacency);
        self.generation += 1;
    }

    /// Whether `build_graph` ran after the last mutation.
    pub fn is_built(&self) -> bool {
        self.adjacency.is_some()
    }

    /// Build counter. Anything derived from the adjacency is stale once
    /// this moves.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn contains_vertex(&self, id: VertexId) -> bool {
        self.vertices.contains_key(&id)
    }

    /// Vertices in insertion order.
    pub fn vertices(&self) -> impl Iterator<Item = (VertexId, Position)> + '_ {
        self.vertices.iter().map(|(&id, &pos)| (id, pos))
    }

    /// Edges in insertion order with their lengths.
    pub fn edges(&self) -> impl Iterator<Item = (VertexId, VertexId, f64)> + '_ {
        self.edges
            .iter()
            .zip(&self.lengths)
            .map(|(&(v1, v2), &length)| (v1, v2, length))
    }

    /// Whether a street joins `v1` and `v2`, in either direction.
    pub fn has_edge(&self, v1: VertexId, v2: VertexId) -> bool {
        self.edges
            .iter()
            .any(|&(a, b)| (a, b) == (v1, v2) || (b, a) == (v1, v2))
    }

    /// Coordinates of a vertex.
    pub fn position(&self, id: VertexId) -> Result<Position, GraphError> {
        self.vertices
            .get(&id)
            .copied()
            .ok_or(GraphError::UnknownVertex(id))
    }

    /// Interpolated point `fraction` of the way from `v1` to `v2`.
    pub fn position_on(&self, location: EdgeRef) -> Result<Position, GraphError> {
        let p1 = self.position(location.v1)?;
        let p2 = self.position(location.v2)?;
        Ok(p1.lerp(p2, location.fraction))
    }

    /// Euclidean length between two vertices, i.e. the weight of an edge
    /// joining them.
    pub fn edge_length(&self, v1: VertexId, v2: VertexId) -> Result<f64, GraphError> {
        Ok(self.position(v1)?.distance(self.position(v2)?))
    }

    /// Dense index of a vertex.
    pub(crate) fn index_of(&self, id: VertexId) -> Result<usize, GraphError> {
        self.vertices
            .get_index_of(&id)
            .ok_or(GraphError::UnknownVertex(id))
    }

    /// Vertex id at a dense index.
    pub(crate) fn id_at(&self, index: usize) -> Option<VertexId> {
        self.vertices.get_index(index).map(|(&id, _)| id)
    }

    pub(crate) fn adjacency(&self) -> Result<&[Vec<Neighbor>], GraphError> {
        self.adjacency.as_deref().ok_or(GraphError::NotBuilt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_map() -> StreetMap {
        let mut map = StreetMap::new();
        map.add_vertex(VertexId(0), Position::new(0.0, 0.0)).unwrap();
        map.add_vertex(VertexId(1), Position::new(3.0, 4.0)).unwrap();
        map.add_edge(VertexId(0), VertexId(1)).unwrap();
        map
    }

    #[test]
    fn test_duplicate_vertex_rejected() {
        let mut map = line_map();
        let err = map
            .add_vertex(VertexId(1), Position::new(9.0, 9.0))
            .unwrap_err();
        assert_eq!(err, GraphError::DuplicateVertex(VertexId(1)));
        // Original coordinates are untouched
        assert_eq!(map.position(VertexId(1)).unwrap(), Position::new(3.0, 4.0));
    }

    #[test]
    fn test_edge_to_unknown_vertex_rejected() {
        let mut map = line_map();
        let err = map.add_edge(VertexId(0), VertexId(7)).unwrap_err();
        assert_eq!(err, GraphError::UnknownVertex(VertexId(7)));
        assert_eq!(map.edge_count(), 1);
    }

    #[test]
    fn test_edge_weight_is_euclidean() {
        let map = line_map();
        let (_, _, length) = map.edges().next().unwrap();
        assert_eq!(length, 5.0);
        assert_eq!(map.edge_length(VertexId(1), VertexId(0)).unwrap(), 5.0);
    }

    #[test]
    fn test_mutation_invalidates_build() {
        let mut map = line_map();
        assert!(!map.is_built());
        map.build_graph();
        assert!(map.is_built());

        map.add_vertex(VertexId(2), Position::new(6.0, 8.0)).unwrap();
        assert!(!map.is_built());
        map.build_graph();
        assert!(map.is_built());
    }

    #[test]
    fn test_rebuild_bumps_generation() {
        let mut map = line_map();
        assert_eq!(map.generation(), 0);
        map.build_graph();
        map.build_graph();
        assert_eq!(map.generation(), 2);
        map.add_vertex(VertexId(2), Position::new(6.0, 8.0)).unwrap();
        assert_eq!(map.generation(), 2);
    }

    #[test]
    fn test_has_edge_either_direction() {
        let map = line_map();
        assert!(map.has_edge(VertexId(0), VertexId(1)));
        assert!(map.has_edge(VertexId(1), VertexId(0)));
        assert!(!map.has_edge(VertexId(0), VertexId(0)));
        assert!(!map.has_edge(VertexId(0), VertexId(7)));
    }

    #[test]
    fn test_empty_map_builds() {
        let mut map = StreetMap::new();
        map.build_graph();
        assert!(map.is_built());
        assert_eq!(map.vertex_count(), 0);
    }

    #[test]
    fn test_position_on_interpolates() {
        let map = line_map();
        let pos = map
            .position_on(EdgeRef::new(VertexId(0), VertexId(1), 0.5))
            .unwrap();
        assert_eq!(pos, Position::new(1.5, 2.0));
    }
}
