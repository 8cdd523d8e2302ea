//! Connectivity queries.

use crate::street_map::StreetMap;
use crate::GraphError;
use std::collections::{HashSet, VecDeque};
use watchman_types::VertexId;

impl StreetMap {
    /// Vertices of the largest connected component, in insertion order.
    ///
    /// Ties go to the component discovered first. An empty map yields an
    /// empty component.
    pub fn largest_connected_component(&self) -> Result<Vec<VertexId>, GraphError> {
        let adjacency = self.adjacency()?;
        let n = adjacency.len();
        let mut component = vec![usize::MAX; n];
        let mut sizes: Vec<usize> = Vec::new();

        for start in 0..n {
            if component[start] != usize::MAX {
                continue;
            }
            let label = sizes.len();
            let mut size = 0;
            let mut queue = VecDeque::from([start]);
            component[start] = label;
            while let Some(node) = queue.pop_front() {
                size += 1;
                for edge in &adjacency[node] {
                    if component[edge.to] == usize::MAX {
                        component[edge.to] = label;
                        queue.push_back(edge.to);
                    }
                }
            }
            sizes.push(size);
        }

        let Some(largest) = sizes
            .iter()
            .enumerate()
            .max_by(|(ia, a), (ib, b)| a.cmp(b).then_with(|| ib.cmp(ia)))
            .map(|(label, _)| label)
        else {
            return Ok(Vec::new());
        };

        Ok((0..n)
            .filter(|&i| component[i] == largest)
            .filter_map(|i| self.id_at(i))
            .collect())
    }

    /// Edges with both endpoints inside `vertices`, with their lengths.
    pub fn span(&self, vertices: &[VertexId]) -> Vec<(VertexId, VertexId, f64)> {
        let inside: HashSet<VertexId> = vertices.iter().copied().collect();
        self.edges()
            .filter(|(v1, v2, _)| inside.contains(v1) && inside.contains(v2))
            .collect()
    }
}
