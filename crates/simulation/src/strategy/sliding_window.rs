use super::{DetectionStrategy, Scene, StrategyConfig, Verdict};
use crate::SimulationError;
use watchman_types::{Position, RouterIndex};

/// Debounced proximity check.
///
/// Each router counts consecutive transmitting ticks with the attacker
/// within `distance`. The count drops to zero as soon as the attacker
/// leaves or a tick passes without a transmission. A router is active
/// while the attacker is within `distance` and detects once its count
/// reaches `time`.
#[derive(Clone, Debug)]
pub struct SlidingWindowStrategy {
    distance: f64,
    time: u64,
    /// Current run length per router index.
    runs: Vec<u64>,
}

impl SlidingWindowStrategy {
    pub fn new(distance: f64, time: u64) -> Self {
        Self {
            distance,
            time,
            runs: Vec::new(),
        }
    }

    pub fn config(&self) -> StrategyConfig {
        StrategyConfig::SlidingWindow {
            distance: self.distance,
            time: self.time,
        }
    }

    /// Current run length of a router.
    pub fn run_length(&self, index: RouterIndex) -> u64 {
        self.runs.get(index.get()).copied().unwrap_or(0)
    }
}

impl DetectionStrategy for SlidingWindowStrategy {
    fn name(&self) -> &'static str {
        "SlidingWindow"
    }

    fn on_run_start(
        &mut self,
        scene: &Scene<'_>,
        _alpha: Option<RouterIndex>,
    ) -> Result<(), SimulationError> {
        self.runs.clear();
        self.runs.resize(scene.routers.len(), 0);
        Ok(())
    }

    fn evaluate(
        &mut self,
        scene: &Scene<'_>,
        attacker: Position,
        transmitting: bool,
    ) -> Vec<Verdict> {
        self.runs.resize(scene.routers.len(), 0);
        scene
            .routers
            .iter()
            .zip(self.runs.iter_mut())
            .map(|(router, run)| {
                let near = router.in_range(attacker, self.distance);
                if near && transmitting {
                    *run += 1;
                } else {
                    *run = 0;
                }
                Verdict {
                    active: near,
                    detects: near && transmitting && *run >= self.time,
                }
            })
            .collect()
    }
}
