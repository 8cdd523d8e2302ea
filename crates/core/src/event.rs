//! Discrete simulation events.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use watchman_types::{MetricSeries, Position, RouterIndex, RunMetrics, Tick};

/// Events appended to the engine's log, drained by the host in FIFO order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SimulationEvent {
    // ═══════════════════════════════════════════════════════════════════════
    // Evaluation
    // ═══════════════════════════════════════════════════════════════════════
    /// A router heard the attacker's transmission and detected it.
    RouterDetects {
        tick: Tick,
        router: RouterIndex,
        /// Attacker position at the time of the transmission.
        position: Position,
    },

    /// A router heard the attacker's transmission but did not detect it.
    RouterMisses {
        tick: Tick,
        router: RouterIndex,
        position: Position,
    },

    // ═══════════════════════════════════════════════════════════════════════
    // Activation transitions
    // ═══════════════════════════════════════════════════════════════════════
    /// A router switched from inactive to active.
    RouterActive { tick: Tick, router: RouterIndex },

    /// A router switched from active to inactive.
    RouterInactive { tick: Tick, router: RouterIndex },

    // ═══════════════════════════════════════════════════════════════════════
    // Run boundaries
    // ═══════════════════════════════════════════════════════════════════════
    /// The run reached its terminal state.
    SimulationFinished { tick: Tick, metrics: RunMetrics },

    /// A batch of repeated runs completed; run label to metric sequences.
    MultiRunFinished {
        metrics: BTreeMap<String, MetricSeries>,
    },
}

impl SimulationEvent {
    /// Tick the event was generated at. `None` for cross-run events.
    pub fn tick(&self) -> Option<Tick> {
        match self {
            SimulationEvent::RouterDetects { tick, .. }
            | SimulationEvent::RouterMisses { tick, .. }
            | SimulationEvent::RouterActive { tick, .. }
            | SimulationEvent::RouterInactive { tick, .. }
            | SimulationEvent::SimulationFinished { tick, .. } => Some(*tick),
            SimulationEvent::MultiRunFinished { .. } => None,
        }
    }

    /// Router the event refers to, if any.
    pub fn router(&self) -> Option<RouterIndex> {
        match self {
            SimulationEvent::RouterDetects { router, .. }
            | SimulationEvent::RouterMisses { router, .. }
            | SimulationEvent::RouterActive { router, .. }
            | SimulationEvent::RouterInactive { router, .. } => Some(*router),
            _ => None,
        }
    }

    /// Attacker position carried by evaluation events.
    pub fn position(&self) -> Option<Position> {
        match self {
            SimulationEvent::RouterDetects { position, .. }
            | SimulationEvent::RouterMisses { position, .. } => Some(*position),
            _ => None,
        }
    }

    /// Get a human-readable name for this event type.
    pub fn type_name(&self) -> &'static str {
        match self {
            SimulationEvent::RouterDetects { .. } => "RouterDetects",
            SimulationEvent::RouterMisses { .. } => "RouterMisses",
            SimulationEvent::RouterActive { .. } => "RouterActive",
            SimulationEvent::RouterInactive { .. } => "RouterInactive",
            SimulationEvent::SimulationFinished { .. } => "SimulationFinished",
            SimulationEvent::MultiRunFinished { .. } => "MultiRunFinished",
        }
    }
}
