//! Stationary sensor record.

use crate::{EdgeRef, Position, RouterId, RouterIndex, Tick};
use serde::{Deserialize, Serialize};

/// A router deployed at a fixed point along an edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Router {
    /// Host-assigned identifier.
    pub id: RouterId,

    /// Dense registry position.
    pub index: RouterIndex,

    /// Host edge and fraction along it.
    pub location: EdgeRef,

    /// Interpolated position, fixed at deployment.
    pub position: Position,

    /// Physical hearing range. A transmission outside this radius can
    /// never be detected by this router.
    pub radius: f64,

    /// Whether the detection strategy currently engages this router.
    pub active: bool,

    /// Tick at which the router last became active.
    pub active_since: Option<Tick>,
}

impl Router {
    /// Whether `object` lies inside this router's radius.
    pub fn in_reach(&self, object: Position) -> bool {
        self.position.within(object, self.radius)
    }

    /// Whether `object` lies inside an arbitrary `distance` of this router.
    pub fn in_range(&self, object: Position, distance: f64) -> bool {
        self.position.within(object, distance)
    }
}
