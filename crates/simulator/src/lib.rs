//! Watchman Simulator
//!
//! Multi-run experiments on top of the chase engine: evaluate several
//! detection strategies against the same attacker routes and compare them.
//!
//! # Architecture
//!
//! The simulator builds on `watchman-simulation` to provide:
//!
//! - **Street grids**: seeded, jittered grid maps with dropped streets
//! - **Experiments**: router deployment, per-iteration attacker planning,
//!   one engine clone per (iteration, strategy) job on rayon
//! - **Run ledger**: per-strategy metric series, summary statistics and
//!   run-length histograms
//!
//! # Example
//!
//! ```ignore
//! use watchman_simulator::{Experiment, ExperimentConfig, GridConfig};
//!
//! let config = ExperimentConfig::new(42).with_iterations(50);
//! let mut experiment = Experiment::on_grid(config, &GridConfig::new(10, 10))?;
//! let ledger = experiment.run()?;
//! ledger.print_summary();
//! ```

pub mod config;
mod error;
pub mod ledger;
pub mod map;
pub mod runner;

pub use config::{ExperimentConfig, GridConfig, StrategySpec};
pub use error::ExperimentError;
pub use ledger::{LabelSummary, RunLedger};
pub use map::{populate_grid, GridLayout};
pub use runner::{derive_seed, Experiment, RunPlan, RunResult};
