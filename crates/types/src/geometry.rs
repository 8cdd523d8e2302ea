//! Planar geometry helpers.

use crate::VertexId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A point in the plane of the street map.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    /// Create a position from coordinates.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Linear interpolation from `self` (fraction 0) to `other` (fraction 1).
    pub fn lerp(self, other: Position, fraction: f64) -> Position {
        Position {
            x: self.x + (other.x - self.x) * fraction,
            y: self.y + (other.y - self.y) * fraction,
        }
    }

    /// Squared Euclidean distance.
    pub fn distance_squared(self, other: Position) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// Euclidean distance.
    pub fn distance(self, other: Position) -> f64 {
        self.distance_squared(other).sqrt()
    }

    /// Whether `other` lies within `range` of this point (inclusive).
    ///
    /// Compares squared distances so the boundary is exact for points on
    /// the axis-aligned grid used by most maps.
    pub fn within(self, other: Position, range: f64) -> bool {
        self.distance_squared(other) <= range * range
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.3}, {:.3})", self.x, self.y)
    }
}

/// A location on the graph: an edge plus a fraction along it.
///
/// Fraction 0 is `v1`, fraction 1 is `v2`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EdgeRef {
    pub v1: VertexId,
    pub v2: VertexId,
    pub fraction: f64,
}

impl EdgeRef {
    pub fn new(v1: VertexId, v2: VertexId, fraction: f64) -> Self {
        Self { v1, v2, fraction }
    }

    /// The same location described from the opposite endpoint.
    pub fn reversed(self) -> Self {
        Self {
            v1: self.v2,
            v2: self.v1,
            fraction: 1.0 - self.fraction,
        }
    }

    /// Undirected key of the underlying edge (smaller id first).
    pub fn key(self) -> (VertexId, VertexId) {
        if self.v1 <= self.v2 {
            (self.v1, self.v2)
        } else {
            (self.v2, self.v1)
        }
    }
}
