//! Mobile adversary record.

use crate::{EdgeRef, Position, RouterIndex, VertexId};
use serde::{Deserialize, Serialize};

/// Live state of the attacker.
///
/// `location` keeps the edge orientation the attacker was placed with until
/// its first move. From then on it follows the direction of travel: the
/// attacker moves from `location.v1` towards `location.v2`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attacker {
    /// Current edge and fraction along it.
    pub location: EdgeRef,

    /// Interpolated position.
    pub position: Position,

    /// Destination vertex.
    pub target: VertexId,

    /// Distance travelled per tick.
    pub speed: f64,

    /// Per-tick transmission probability.
    pub tx_prob: f64,

    /// Reference router handed to the strategy when a run starts.
    pub alpha_router: Option<RouterIndex>,

    /// Rejection threshold for the planned path length.
    pub min_path_length: f64,
}
