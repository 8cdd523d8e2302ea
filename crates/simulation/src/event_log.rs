//! Append/drain FIFO of simulation events.

use std::collections::VecDeque;
use watchman_core::SimulationEvent;

/// Strictly FIFO event buffer.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: VecDeque<SimulationEvent>,
    /// Events appended since the last clear.
    appended: u64,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event at the back.
    pub fn push(&mut self, event: SimulationEvent) {
        self.appended += 1;
        self.events.push_back(event);
    }

    /// Remove the oldest event.
    pub fn pop(&mut self) -> Option<SimulationEvent> {
        self.events.pop_front()
    }

    /// Oldest event without removing it.
    pub fn peek(&self) -> Option<&SimulationEvent> {
        self.events.front()
    }

    /// Remove every pending event, oldest first.
    pub fn drain(&mut self) -> impl Iterator<Item = SimulationEvent> + '_ {
        self.events.drain(..)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SimulationEvent> {
        self.events.iter()
    }

    /// Number of pending events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Total events appended since the last clear, drained or not.
    pub fn total_appended(&self) -> u64 {
        self.appended
    }

    pub fn clear(&mut self) {
        self.events.clear();
        self.appended = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use watchman_types::{RouterIndex, Tick};

    fn active(tick: u64) -> SimulationEvent {
        SimulationEvent::RouterActive {
            tick: Tick(tick),
            router: RouterIndex(0),
        }
    }

    #[test]
    fn test_fifo_order() {
        let mut log = EventLog::new();
        for t in 1..=3 {
            log.push(active(t));
        }
        assert_eq!(log.peek(), Some(&active(1)));
        assert_eq!(log.pop(), Some(active(1)));
        log.push(active(4));
        let rest: Vec<_> = log.drain().collect();
        assert_eq!(rest, vec![active(2), active(3), active(4)]);
        assert!(log.is_empty());
        assert_eq!(log.total_appended(), 4);
    }

    #[test]
    fn test_clear_resets_counter() {
        let mut log = EventLog::new();
        log.push(active(1));
        log.clear();
        assert_eq!(log.len(), 0);
        assert_eq!(log.total_appended(), 0);
        assert_eq!(log.pop(), None);
    }
}
