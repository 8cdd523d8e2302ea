//! Error types for the simulation engine.

use thiserror::Error;
use watchman_graph::GraphError;
use watchman_types::RouterId;

/// Errors raised by engine operations.
///
/// Every failing operation leaves the engine state unchanged.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    /// Graph construction or query failed.
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// A fraction along an edge was outside `[0, 1]`.
    #[error("Fraction {0} is outside [0, 1]")]
    InvalidFraction(f64),

    /// A router id was registered twice.
    #[error("{0} already exists")]
    DuplicateRouter(RouterId),

    /// Index lookup past the end of the registry or the planned path.
    #[error("Index {index} out of range ({count} entries)")]
    OutOfRange {
        /// Requested index.
        index: usize,
        /// Number of entries at the time of the call.
        count: usize,
    },

    /// Router id lookup for an id that was never registered.
    #[error("{0} is not registered")]
    UnknownId(RouterId),

    /// Event accessor called with nothing staged.
    #[error("No current event")]
    NoCurrentEvent,

    /// Event accessor called on an event that does not carry the field.
    #[error("Event {event} has no {field}")]
    MissingField {
        event: &'static str,
        field: &'static str,
    },

    /// A numeric parameter was negative, non-finite or otherwise invalid.
    #[error("Invalid {name}: {value}")]
    InvalidParameter { name: &'static str, value: f64 },

    /// The operation needs an attacker set by `set_attacker`.
    #[error("No attacker configured")]
    NoAttacker,

    /// Running to completion would never end: the attacker cannot move and
    /// no tick budget is set.
    #[error("Attacker cannot reach its target and no tick budget is set")]
    Stalled,

    /// Weighted edge sampling over a map without any edge of positive length.
    #[error("No edge to sample from")]
    EmptyEdgePool,
}
