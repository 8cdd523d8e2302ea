//! Street map graph store and path planner.
//!
//! A [`StreetMap`] accumulates vertices and edges, then `build_graph`
//! derives a dense adjacency list used by every query:
//!
//! - shortest paths between vertices, or from a point on an edge
//!   ([`StreetMap::plan_from_edge`]), one single-source Dijkstra per query
//! - street distance between two on-edge positions with a caller-owned
//!   [`DistanceCache`]
//! - the largest connected component and the edges spanning a vertex set
//!
//! Edge weights are always the Euclidean length between the endpoints.

mod components;
mod error;
mod planner;
mod street_map;

pub use error::GraphError;
pub use planner::{DistanceCache, PlannedPath};
pub use street_map::StreetMap;
