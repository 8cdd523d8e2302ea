//! Length-weighted random edge selection.

use crate::SimulationError;
use rand::Rng;
use tracing::debug;
use watchman_graph::StreetMap;
use watchman_types::VertexId;

/// Picks edges of the largest connected component with probability
/// proportional to their length.
///
/// Built once per graph and reused; rebuild it whenever the map changes.
#[derive(Debug, Clone)]
pub struct WeightedEdgeSampler {
    edges: Vec<(VertexId, VertexId)>,
    /// Cumulative length up to and including each edge.
    cumulative: Vec<f64>,
}

impl WeightedEdgeSampler {
    /// Build the pool from the largest connected component of `map`.
    pub fn from_map(map: &StreetMap) -> Result<Self, SimulationError> {
        let component = map.largest_connected_component()?;
        let mut edges = Vec::new();
        let mut cumulative = Vec::new();
        let mut total = 0.0;
        for (v1, v2, length) in map.span(&component) {
            total += length;
            edges.push((v1, v2));
            cumulative.push(total);
        }
        if total <= 0.0 {
            return Err(SimulationError::EmptyEdgePool);
        }
        debug!(
            component = component.len(),
            edges = edges.len(),
            total_length = total,
            "Built weighted edge pool"
        );
        Ok(Self { edges, cumulative })
    }

    /// Total street length of the pool.
    pub fn total_length(&self) -> f64 {
        self.cumulative.last().copied().unwrap_or(0.0)
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Draw one edge.
    pub fn sample(&self, rng: &mut impl Rng) -> (VertexId, VertexId) {
        let point = rng.gen::<f64>() * self.total_length();
        self.edge_at(point)
    }

    /// Edge whose cumulative interval `[start, end)` contains `point`.
    fn edge_at(&self, point: f64) -> (VertexId, VertexId) {
        let i = self
            .cumulative
            .partition_point(|&end| end <= point)
            .min(self.edges.len() - 1);
        self.edges[i]
    }
}
