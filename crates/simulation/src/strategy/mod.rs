//! Detection strategies.
//!
//! A strategy decides, once per tick, which routers are engaged (`active`)
//! and which of them would report a transmission (`detects`). Whether a
//! router actually hears the attacker is physical and decided by the
//! engine from the router radius; a detection needs both.
//!
//! Exactly one strategy is live per engine. [`ActiveStrategy`] is the
//! closed set the engine can hold; it dispatches to the concrete variants.

mod neighbors;
mod sample;
mod sliding_window;

pub use neighbors::NeighborStrategy;
pub use sample::SampleStrategy;
pub use sliding_window::SlidingWindowStrategy;

use crate::SimulationError;
use watchman_graph::StreetMap;
use watchman_types::{Position, Router, RouterIndex};

/// Which strategy to run and with which parameters.
#[derive(Clone, Debug, PartialEq)]
pub enum StrategyConfig {
    /// Routers within `distance` of the attacker detect independently.
    Sample { distance: f64 },

    /// Routers detect after `time` consecutive transmitting ticks with the
    /// attacker within `distance`.
    SlidingWindow { distance: f64, time: u64 },

    /// Only an awake subset of routers listens; detections hand over to the
    /// detecting routers' `k` nearest neighbours within `distance`.
    KSmartestNeighbors { k: usize, distance: f64, lazy: bool },
}

impl StrategyConfig {
    /// Reject negative or non-finite distances.
    pub fn validate(&self) -> Result<(), SimulationError> {
        let distance = match self {
            StrategyConfig::Sample { distance }
            | StrategyConfig::SlidingWindow { distance, .. }
            | StrategyConfig::KSmartestNeighbors { distance, .. } => *distance,
        };
        if !distance.is_finite() || distance < 0.0 {
            return Err(SimulationError::InvalidParameter {
                name: "distance",
                value: distance,
            });
        }
        Ok(())
    }

    /// Get a human-readable name for this strategy.
    pub fn type_name(&self) -> &'static str {
        match self {
            StrategyConfig::Sample { .. } => "Sample",
            StrategyConfig::SlidingWindow { .. } => "SlidingWindow",
            StrategyConfig::KSmartestNeighbors { .. } => "KSmartestNeighbors",
        }
    }
}

/// One router's decision for the current tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Verdict {
    /// Router is engaged this tick.
    pub active: bool,
    /// Router reports the transmission if it hears it.
    pub detects: bool,
}

/// Read-only view of the world handed to a strategy.
#[derive(Clone, Copy)]
pub struct Scene<'a> {
    pub map: &'a StreetMap,
    pub routers: &'a [Router],
}

/// A per-tick detection policy.
///
/// The engine calls `prepare` whenever it needs derived structures to be
/// up to date (after the strategy is installed on a built graph and before
/// every run), `on_run_start` once per accepted attacker, then `evaluate`
/// and `on_detections` every tick.
pub trait DetectionStrategy {
    /// Get a human-readable name for this strategy.
    fn name(&self) -> &'static str;

    /// Build derived structures. Must be cheap when nothing changed.
    fn prepare(&mut self, _scene: &Scene<'_>) -> Result<(), SimulationError> {
        Ok(())
    }

    /// Drop per-run state and apply the reference router hook.
    fn on_run_start(
        &mut self,
        scene: &Scene<'_>,
        alpha: Option<RouterIndex>,
    ) -> Result<(), SimulationError>;

    /// One verdict per router, in index order.
    fn evaluate(&mut self, scene: &Scene<'_>, attacker: Position, transmitting: bool)
        -> Vec<Verdict>;

    /// Routers that heard and reported this tick's transmission.
    fn on_detections(
        &mut self,
        _scene: &Scene<'_>,
        _detected: &[RouterIndex],
    ) -> Result<(), SimulationError> {
        Ok(())
    }
}

/// The strategy currently installed in an engine.
#[derive(Clone, Debug)]
pub enum ActiveStrategy {
    Sample(SampleStrategy),
    SlidingWindow(SlidingWindowStrategy),
    KSmartestNeighbors(NeighborStrategy),
}

impl ActiveStrategy {
    /// Build a fresh strategy with no accumulated state.
    pub fn from_config(config: StrategyConfig) -> Result<Self, SimulationError> {
        config.validate()?;
        Ok(match config {
            StrategyConfig::Sample { distance } => Self::Sample(SampleStrategy::new(distance)),
            StrategyConfig::SlidingWindow { distance, time } => {
                Self::SlidingWindow(SlidingWindowStrategy::new(distance, time))
            }
            StrategyConfig::KSmartestNeighbors { k, distance, lazy } => {
                Self::KSmartestNeighbors(NeighborStrategy::new(k, distance, lazy))
            }
        })
    }

    /// Parameters this strategy was built from.
    pub fn config(&self) -> StrategyConfig {
        match self {
            Self::Sample(s) => s.config(),
            Self::SlidingWindow(s) => s.config(),
            Self::KSmartestNeighbors(s) => s.config(),
        }
    }

    fn inner(&self) -> &dyn DetectionStrategy {
        match self {
            Self::Sample(s) => s,
            Self::SlidingWindow(s) => s,
            Self::KSmartestNeighbors(s) => s,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn DetectionStrategy {
        match self {
            Self::Sample(s) => s,
            Self::SlidingWindow(s) => s,
            Self::KSmartestNeighbors(s) => s,
        }
    }
}

impl DetectionStrategy for ActiveStrategy {
    fn name(&self) -> &'static str {
        self.inner().name()
    }

    fn prepare(&mut self, scene: &Scene<'_>) -> Result<(), SimulationError> {
        self.inner_mut().prepare(scene)
    }

    fn on_run_start(
        &mut self,
        scene: &Scene<'_>,
        alpha: Option<RouterIndex>,
    ) -> Result<(), SimulationError> {
        self.inner_mut().on_run_start(scene, alpha)
    }

    fn evaluate(
        &mut self,
        scene: &Scene<'_>,
        attacker: Position,
        transmitting: bool,
    ) -> Vec<Verdict> {
        self.inner_mut().evaluate(scene, attacker, transmitting)
    }

    fn on_detections(
        &mut self,
        scene: &Scene<'_>,
        detected: &[RouterIndex],
    ) -> Result<(), SimulationError> {
        self.inner_mut().on_detections(scene, detected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_round_trips_parameters() {
        for config in [
            StrategyConfig::Sample { distance: 2.0 },
            StrategyConfig::SlidingWindow {
                distance: 3.0,
                time: 4,
            },
            StrategyConfig::KSmartestNeighbors {
                k: 2,
                distance: 50.0,
                lazy: true,
            },
        ] {
            let strategy = ActiveStrategy::from_config(config.clone()).unwrap();
            assert_eq!(strategy.name(), config.type_name());
            assert_eq!(strategy.config(), config);
        }
    }

    #[test]
    fn test_negative_distance_rejected() {
        let err = ActiveStrategy::from_config(StrategyConfig::Sample { distance: -1.0 }).unwrap_err();
        assert_eq!(
            err,
            SimulationError::InvalidParameter {
                name: "distance",
                value: -1.0
            }
        );
    }
}
