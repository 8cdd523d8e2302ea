//! Configuration for a single engine instance.

/// Engine-level settings fixed at construction.
#[derive(Clone, Debug, PartialEq)]
pub struct SimulationConfig {
    /// Seed for the engine RNG (transmissions and edge sampling).
    pub seed: u64,

    /// Tick budget per run. The run finishes once this many ticks have
    /// elapsed even if the attacker has not reached its target.
    pub max_ticks: Option<u64>,
}

impl SimulationConfig {
    /// Create a configuration with the given seed and no tick budget.
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            max_ticks: None,
        }
    }

    /// Set the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the per-run tick budget.
    pub fn with_max_ticks(mut self, max_ticks: u64) -> Self {
        self.max_ticks = Some(max_ticks);
        self
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self::new(12345)
    }
}
