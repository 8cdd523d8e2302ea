//! Core types for the Watchman chase simulator.
//!
//! - [`SimulationEvent`]: everything the engine reports to its host
//! - [`Tracer`]: per-instance debug trace sink injected into each engine

mod event;
mod tracer;

pub use event::SimulationEvent;
pub use tracer::{BufferTracer, LogTracer, NoopTracer, Tracer};
