//! Attacker placement, path planning and movement.

use crate::SimulationError;
use rand::Rng;
use watchman_graph::{GraphError, PlannedPath, StreetMap};
use watchman_types::{Attacker, EdgeRef, Position, RouterIndex, VertexId};

/// Parameters of `set_attacker`.
#[derive(Clone, Debug, PartialEq)]
pub struct AttackerConfig {
    /// Start edge, first endpoint.
    pub v1: VertexId,

    /// Start edge, second endpoint.
    pub v2: VertexId,

    /// Destination vertex.
    pub target: VertexId,

    /// Start position along `v1 -> v2`.
    pub fraction: f64,

    /// Distance travelled per tick.
    pub speed: f64,

    /// Per-tick transmission probability.
    pub tx_prob: f64,

    /// Reference router handed to the strategy at run start.
    pub alpha_router: Option<RouterIndex>,

    /// Paths shorter than this are rejected.
    pub min_path_length: f64,
}

impl AttackerConfig {
    /// Start at `v1` heading for `target` at unit speed, always transmitting.
    pub fn new(v1: VertexId, v2: VertexId, target: VertexId) -> Self {
        Self {
            v1,
            v2,
            target,
            fraction: 0.0,
            speed: 1.0,
            tx_prob: 1.0,
            alpha_router: None,
            min_path_length: 0.0,
        }
    }

    /// Set the start fraction along `v1 -> v2`.
    pub fn with_fraction(mut self, fraction: f64) -> Self {
        self.fraction = fraction;
        self
    }

    /// Set the distance travelled per tick.
    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = speed;
        self
    }

    /// Set the per-tick transmission probability.
    pub fn with_tx_prob(mut self, tx_prob: f64) -> Self {
        self.tx_prob = tx_prob;
        self
    }

    /// Set the reference router.
    pub fn with_alpha_router(mut self, alpha: RouterIndex) -> Self {
        self.alpha_router = Some(alpha);
        self
    }

    /// Set the minimum accepted path length.
    pub fn with_min_path_length(mut self, min_path_length: f64) -> Self {
        self.min_path_length = min_path_length;
        self
    }

    /// Check the scalar parameters. Vertex existence is checked while planning.
    pub fn validate(&self) -> Result<(), SimulationError> {
        if !(0.0..=1.0).contains(&self.fraction) {
            return Err(SimulationError::InvalidFraction(self.fraction));
        }
        if !(0.0..=1.0).contains(&self.tx_prob) {
            return Err(SimulationError::InvalidParameter {
                name: "tx_prob",
                value: self.tx_prob,
            });
        }
        if !self.speed.is_finite() || self.speed < 0.0 {
            return Err(SimulationError::InvalidParameter {
                name: "speed",
                value: self.speed,
            });
        }
        if self.min_path_length.is_nan() {
            return Err(SimulationError::InvalidParameter {
                name: "min_path_length",
                value: self.min_path_length,
            });
        }
        Ok(())
    }
}

/// Live attacker: public state plus the walk along the planned path.
#[derive(Clone, Debug)]
pub struct AttackerModel {
    state: Attacker,

    /// Current edge oriented in the direction of travel.
    heading: EdgeRef,

    /// Route from the start edge to the target. The first node is the
    /// endpoint the attacker leaves its start edge through.
    planned: PlannedPath,

    /// Position in `planned.nodes` of `heading.v2`.
    cursor: usize,

    /// Distance covered on the current edge.
    along: f64,

    /// Length of the current edge.
    edge_length: f64,

    /// Total distance covered since placement.
    travelled: f64,

    arrived: bool,
}

impl AttackerModel {
    /// Place an attacker and plan its route.
    ///
    /// Returns `Ok(None)` if the target is unreachable or the route is
    /// shorter than `min_path_length`.
    pub fn plan(map: &StreetMap, config: &AttackerConfig) -> Result<Option<Self>, SimulationError> {
        config.validate()?;
        let start = EdgeRef::new(config.v1, config.v2, config.fraction);
        let position = map.position_on(start)?;
        map.position(config.target)?;
        if !map.has_edge(config.v1, config.v2) {
            return Err(GraphError::UnknownEdge(config.v1, config.v2).into());
        }

        let Some(planned) = map.plan_from_edge(start, config.target)? else {
            return Ok(None);
        };
        if planned.length < config.min_path_length {
            return Ok(None);
        }

        // Travel runs towards the first node; the record keeps the host's
        // orientation until the first move.
        let heading = if planned.nodes.first() == Some(&config.v2) {
            start
        } else {
            start.reversed()
        };
        let edge_length = map.edge_length(heading.v1, heading.v2)?;

        Ok(Some(Self {
            state: Attacker {
                location: start,
                position,
                target: config.target,
                speed: config.speed,
                tx_prob: config.tx_prob,
                alpha_router: config.alpha_router,
                min_path_length: config.min_path_length,
            },
            heading,
            planned,
            cursor: 0,
            along: heading.fraction * edge_length,
            edge_length,
            travelled: 0.0,
            arrived: false,
        }))
    }

    /// Public attacker record.
    pub fn state(&self) -> &Attacker {
        &self.state
    }

    pub fn position(&self) -> Position {
        self.state.position
    }

    /// Current edge, oriented in the direction of travel.
    pub fn location(&self) -> EdgeRef {
        self.heading
    }

    /// Route planned at placement.
    pub fn planned_path(&self) -> &PlannedPath {
        &self.planned
    }

    /// Number of vertices in the planned route.
    pub fn path_len(&self) -> usize {
        self.planned.nodes.len()
    }

    /// Vertex `index` of the planned route.
    pub fn path_node(&self, index: usize) -> Option<VertexId> {
        self.planned.nodes.get(index).copied()
    }

    /// Whether the attacker has reached its target.
    pub fn has_arrived(&self) -> bool {
        self.arrived
    }

    /// Distance covered since placement.
    pub fn travelled(&self) -> f64 {
        self.travelled
    }

    /// Whether another tick could bring the attacker closer to its target.
    pub fn can_progress(&self) -> bool {
        !self.arrived && (self.state.speed > 0.0 || self.planned.length - self.travelled <= 0.0)
    }

    /// Move `speed` units along the route, crossing vertices as needed and
    /// stopping at the target.
    pub(crate) fn advance(&mut self, map: &StreetMap) -> Result<(), SimulationError> {
        let mut remaining = self.state.speed;
        while !self.arrived {
            let left = (self.edge_length - self.along).max(0.0);
            if remaining < left {
                self.along += remaining;
                self.travelled += remaining;
                break;
            }
            remaining -= left;
            self.travelled += left;
            self.along = self.edge_length;

            let Some(&next) = self.planned.nodes.get(self.cursor + 1) else {
                self.arrived = true;
                break;
            };
            let from = self.heading.v2;
            self.edge_length = map.edge_length(from, next)?;
            self.heading = EdgeRef::new(from, next, 0.0);
            self.cursor += 1;
            self.along = 0.0;
        }

        self.heading.fraction = if self.edge_length > 0.0 {
            (self.along / self.edge_length).clamp(0.0, 1.0)
        } else {
            1.0
        };
        self.state.location = self.heading;
        self.state.position = map.position_on(self.heading)?;
        Ok(())
    }

    /// Draw this tick's transmission.
    pub(crate) fn transmits(&self, rng: &mut impl Rng) -> bool {
        rng.gen::<f64>() < self.state.tx_prob
    }
}
