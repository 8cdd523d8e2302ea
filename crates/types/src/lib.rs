//! Core types for the Watchman chase simulator.
//!
//! Everything in here is plain data shared by the graph store, the tick
//! engine and the experiment runner: identifiers, planar geometry, the
//! router/attacker records and per-run metrics.

mod attacker;
mod geometry;
mod identifiers;
mod metrics;
mod router;

pub use attacker::Attacker;
pub use geometry::{EdgeRef, Position};
pub use identifiers::{RouterId, RouterIndex, Tick, VertexId};
pub use metrics::{MetricSeries, MetricSummary, PathReconstruction, RunMetrics};
pub use router::Router;
