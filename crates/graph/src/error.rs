//! Error types for graph construction and queries.

use thiserror::Error;
use watchman_types::VertexId;

/// Errors raised by the street map.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GraphError {
    /// A vertex id was added twice.
    #[error("{0} already exists")]
    DuplicateVertex(VertexId),

    /// An operation referenced a vertex that was never added.
    #[error("Unknown {0}")]
    UnknownVertex(VertexId),

    /// An operation referenced a street that was never added.
    #[error("No street between {0} and {1}")]
    UnknownEdge(VertexId, VertexId),

    /// Vertex coordinates must be finite.
    #[error("{0} has non-finite coordinates")]
    InvalidCoordinates(VertexId),

    /// A query needs the adjacency built by `build_graph`.
    #[error("Graph has not been built")]
    NotBuilt,
}
