//! Configuration types for experiments.

use serde::{Deserialize, Serialize};
use watchman_simulation::StrategyConfig;

/// Configuration for a multi-run experiment.
#[derive(Clone, Debug)]
pub struct ExperimentConfig {
    /// Master seed. Deployment, run planning and every job seed derive from it.
    pub seed: u64,

    /// Number of attacker runs per strategy.
    pub iterations: usize,

    /// Number of routers deployed on the map.
    pub router_count: usize,

    /// Hearing radius of every router.
    pub router_radius: f64,

    /// Attacker distance per tick.
    pub attacker_speed: f64,

    /// Per-tick transmission probability.
    pub tx_prob: f64,

    /// Minimum planned path length for a run.
    ///
    /// `None` uses half the diagonal of the map's bounding box.
    pub min_path_length: Option<f64>,

    /// Random targets tried before an iteration counts as failed.
    pub target_attempts: usize,

    /// Strategies evaluated on every iteration, in ledger order.
    pub strategies: Vec<StrategySpec>,

    /// Tick budget per run.
    pub max_ticks: Option<u64>,

    /// Run jobs on the rayon pool instead of the calling thread.
    pub parallel: bool,
}

impl ExperimentConfig {
    /// Create a configuration with the given seed and default parameters.
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            iterations: 10,
            router_count: 20,
            router_radius: 20.0,
            attacker_speed: 5.0,
            tx_prob: 0.5,
            min_path_length: None,
            target_attempts: 1024,
            strategies: vec![
                StrategySpec::new(StrategyConfig::Sample { distance: 20.0 }),
                StrategySpec::new(StrategyConfig::SlidingWindow {
                    distance: 20.0,
                    time: 3,
                }),
                StrategySpec::new(StrategyConfig::KSmartestNeighbors {
                    k: 2,
                    distance: 250.0,
                    lazy: false,
                }),
            ],
            max_ticks: Some(100_000),
            parallel: true,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn with_router_count(mut self, count: usize) -> Self {
        self.router_count = count;
        self
    }

    pub fn with_router_radius(mut self, radius: f64) -> Self {
        self.router_radius = radius;
        self
    }

    pub fn with_attacker_speed(mut self, speed: f64) -> Self {
        self.attacker_speed = speed;
        self
    }

    /// Set the transmission probability, clamped to `[0, 1]`.
    pub fn with_tx_prob(mut self, tx_prob: f64) -> Self {
        self.tx_prob = tx_prob.clamp(0.0, 1.0);
        self
    }

    pub fn with_min_path_length(mut self, length: f64) -> Self {
        self.min_path_length = Some(length);
        self
    }

    pub fn with_target_attempts(mut self, attempts: usize) -> Self {
        self.target_attempts = attempts;
        self
    }

    /// Replace the evaluated strategies.
    pub fn with_strategies(mut self, strategies: Vec<StrategySpec>) -> Self {
        self.strategies = strategies;
        self
    }

    /// Add one more strategy to evaluate.
    pub fn with_strategy(mut self, strategy: StrategySpec) -> Self {
        self.strategies.push(strategy);
        self
    }

    pub fn with_max_ticks(mut self, max_ticks: Option<u64>) -> Self {
        self.max_ticks = max_ticks;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Total number of engine runs the experiment performs.
    pub fn total_runs(&self) -> usize {
        self.iterations * self.strategies.len()
    }
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self::new(12345)
    }
}

/// A strategy under evaluation and the ledger label its runs are filed under.
#[derive(Clone, Debug, PartialEq)]
pub struct StrategySpec {
    pub label: String,
    pub config: StrategyConfig,
}

impl StrategySpec {
    /// Label derived from the strategy parameters, e.g. `SlidingWindow(d=20,t=3)`.
    pub fn new(config: StrategyConfig) -> Self {
        let label = match &config {
            StrategyConfig::Sample { distance } => format!("Sample(d={distance})"),
            StrategyConfig::SlidingWindow { distance, time } => {
                format!("SlidingWindow(d={distance},t={time})")
            }
            StrategyConfig::KSmartestNeighbors { k, distance, .. } => {
                format!("KSmartestNeighbors(k={k},d={distance})")
            }
        };
        Self { label, config }
    }

    pub fn labelled(label: impl Into<String>, config: StrategyConfig) -> Self {
        Self {
            label: label.into(),
            config,
        }
    }
}

/// Shape of the synthetic street grid.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridConfig {
    /// Vertices per row.
    pub columns: u32,

    /// Vertices per column.
    pub rows: u32,

    /// Distance between neighbouring grid vertices.
    pub spacing: f64,

    /// Maximum vertex displacement per axis, as a fraction of `spacing`.
    pub jitter: f64,

    /// Share of grid streets left out (0.0 = full grid).
    pub drop_ratio: f64,
}

impl GridConfig {
    pub fn new(columns: u32, rows: u32) -> Self {
        Self {
            columns,
            rows,
            ..Default::default()
        }
    }

    pub fn with_spacing(mut self, spacing: f64) -> Self {
        self.spacing = spacing;
        self
    }

    /// Set the jitter, clamped to `[0, 0.5)` so streets never cross.
    pub fn with_jitter(mut self, jitter: f64) -> Self {
        self.jitter = jitter.clamp(0.0, 0.49);
        self
    }

    /// Set the drop ratio, clamped to `[0, 1]`.
    pub fn with_drop_ratio(mut self, ratio: f64) -> Self {
        self.drop_ratio = ratio.clamp(0.0, 1.0);
        self
    }

    pub fn vertex_count(&self) -> usize {
        self.columns as usize * self.rows as usize
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            columns: 12,
            rows: 12,
            spacing: 100.0,
            jitter: 0.2,
            drop_ratio: 0.1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_strategies_get_distinct_labels() {
        let config = ExperimentConfig::default();
        let mut labels: Vec<_> = config.strategies.iter().map(|s| s.label.clone()).collect();
        labels.sort();
        labels.dedup();
        assert_eq!(labels.len(), 3);
        assert_eq!(config.total_runs(), 30);
    }

    #[test]
    fn test_strategy_label() {
        let strategy = StrategySpec::new(StrategyConfig::SlidingWindow {
            distance: 20.0,
            time: 3,
        });
        assert_eq!(strategy.label, "SlidingWindow(d=20,t=3)");
        let strategy = StrategySpec::new(StrategyConfig::Sample { distance: 2.5 });
        assert_eq!(strategy.label, "Sample(d=2.5)");
    }

    #[test]
    fn test_builders_clamp() {
        let config = ExperimentConfig::new(1).with_tx_prob(1.5);
        assert_eq!(config.tx_prob, 1.0);
        let grid = GridConfig::new(3, 4).with_jitter(0.9).with_drop_ratio(-1.0);
        assert_eq!(grid.jitter, 0.49);
        assert_eq!(grid.drop_ratio, 0.0);
        assert_eq!(grid.vertex_count(), 12);
    }
}
