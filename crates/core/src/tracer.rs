//! Debug trace sink owned by each engine instance.
//!
//! Engines never log per-tick detail through global state. Each instance
//! holds its own [`Tracer`], which the host picks when building the engine.

use std::fmt;
use std::sync::Mutex;

/// Receives free-form debug lines from one engine instance.
pub trait Tracer: Send + Sync {
    /// Whether lines should be formatted at all.
    ///
    /// Engines check this before building a message so a disabled tracer
    /// costs nothing per tick.
    fn enabled(&self) -> bool {
        true
    }

    /// Record one line.
    fn trace(&self, line: fmt::Arguments<'_>);
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTracer;

impl Tracer for NoopTracer {
    fn enabled(&self) -> bool {
        false
    }

    fn trace(&self, _line: fmt::Arguments<'_>) {}
}

/// Forwards lines to `tracing` at debug level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogTracer;

impl Tracer for LogTracer {
    fn enabled(&self) -> bool {
        tracing::enabled!(tracing::Level::DEBUG)
    }

    fn trace(&self, line: fmt::Arguments<'_>) {
        tracing::debug!("{}", line);
    }
}

/// Collects lines in memory for a host to display or inspect.
#[derive(Debug, Default)]
pub struct BufferTracer {
    lines: Mutex<Vec<String>>,
}

impl BufferTracer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove and return everything recorded so far.
    pub fn take(&self) -> Vec<String> {
        match self.lines.lock() {
            Ok(mut lines) => std::mem::take(&mut *lines),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }

    /// Number of buffered lines.
    pub fn len(&self) -> usize {
        self.lines.lock().map(|l| l.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Tracer for BufferTracer {
    fn trace(&self, line: fmt::Arguments<'_>) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(line.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    #[test]
    fn test_buffer_tracer_collects_and_drains() {
        let tracer = BufferTracer::new();
        tracer.trace(format_args!("tick={} routers={}", 3, 2));
        tracer.trace(format_args!("done"));

        assert_eq!(tracer.len(), 2);
        assert_eq!(tracer.take(), vec!["tick=3 routers=2", "done"]);
        assert!(tracer.is_empty());
    }

    #[test]
    fn test_noop_tracer_is_disabled() {
        assert!(!NoopTracer.enabled());
        NoopTracer.trace(format_args!("ignored"));
    }

    #[traced_test]
    #[test]
    fn test_log_tracer_forwards_to_tracing() {
        LogTracer.trace(format_args!("attacker moved to {}", 7));
        assert!(logs_contain("attacker moved to 7"));
    }
}
