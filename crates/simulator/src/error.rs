//! Error types for experiments.

use thiserror::Error;
use watchman_simulation::SimulationError;

/// Errors raised while setting up or running an experiment.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExperimentError {
    /// An engine call failed.
    #[error(transparent)]
    Simulation(#[from] SimulationError),

    /// The experiment has nothing to run.
    #[error("Experiment needs at least one {0}")]
    Empty(&'static str),

    /// A grid dimension or spacing is unusable.
    #[error("Invalid grid: {0}")]
    InvalidGrid(String),

    /// No attacker path could be planned, even with no minimum length.
    #[error("No reachable target for iteration {iteration}")]
    NoTarget { iteration: usize },

    /// A worker stopped before reporting its result.
    #[error("Run {job} did not report a result")]
    MissingResult { job: usize },

    /// Histogram bookkeeping failed.
    #[error("Histogram error: {0}")]
    Histogram(String),
}
