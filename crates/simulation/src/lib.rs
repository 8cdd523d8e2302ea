//! Deterministic chase simulation engine.
//!
//! This crate drives routers, an attacker and a detection strategy over a
//! [`watchman_graph::StreetMap`], one tick per call. Given the same seed and
//! the same sequence of host calls, it produces identical events every run.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                  SimulationRunner                       │
//! │                                                         │
//! │  ┌───────────────┐  ┌────────────────┐  ┌────────────┐  │
//! │  │  StreetMap    │  │ RouterRegistry │  │ Attacker   │  │
//! │  │  (graph)      │  │ (dense index)  │  │ Model      │  │
//! │  └───────┬───────┘  └───────┬────────┘  └─────┬──────┘  │
//! │          └──────────────────┼─────────────────┘         │
//! │                             ▼                           │
//! │  ┌────────────────────────────────────────────────────┐ │
//! │  │  do_tick: move, draw transmission, evaluate        │ │
//! │  │  ActiveStrategy, record MetricsTracker             │ │
//! │  └────────────────────────┬───────────────────────────┘ │
//! │                           ▼                             │
//! │  ┌────────────────────────────────────────────────────┐ │
//! │  │  EventLog (FIFO of SimulationEvent)                │ │
//! │  └────────────────────────────────────────────────────┘ │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! [`ScalarHost`] wraps a runner behind a primitive-typed call surface for
//! hosts that cannot consume structured values.

mod attacker;
mod config;
mod error;
mod event_log;
mod host;
mod metrics;
mod registry;
mod runner;
mod sampler;
pub mod strategy;

pub use attacker::{AttackerConfig, AttackerModel};
pub use config::SimulationConfig;
pub use error::SimulationError;
pub use event_log::EventLog;
pub use host::ScalarHost;
pub use metrics::MetricsTracker;
pub use registry::RouterRegistry;
pub use runner::SimulationRunner;
pub use sampler::WeightedEdgeSampler;
pub use strategy::{ActiveStrategy, DetectionStrategy, StrategyConfig, Verdict};
