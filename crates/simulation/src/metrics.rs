//! Per-run metric accumulation.

use crate::SimulationError;
use std::collections::BTreeSet;
use watchman_graph::StreetMap;
use watchman_types::{EdgeRef, PathReconstruction, RunMetrics, Tick, VertexId};

/// What one tick contributed to the metrics.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TickOutcome {
    pub tick: Tick,
    pub active_routers: usize,
    pub router_count: usize,
    pub transmitting: bool,
    pub detected: bool,
    /// Attacker location after moving.
    pub location: EdgeRef,
}

/// Counters behind [`RunMetrics`] for the run in progress.
#[derive(Debug, Clone, Default)]
pub struct MetricsTracker {
    ticks: u64,
    /// Ticks with at least one active router.
    active_ticks: u64,
    /// Sum over ticks of the number of active routers.
    active_router_ticks: u64,
    /// Sum over ticks of the registry size.
    router_ticks: u64,
    transmissions: u64,
    detected_transmissions: u64,
    last_detection: Option<Tick>,
    planned_length: f64,
    /// Start edge followed by the planned route, in travel order.
    true_route: Vec<VertexId>,
    /// Attacker location at run start and at every detecting tick.
    detection_points: Vec<EdgeRef>,
}

impl MetricsTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget the previous run and start a new one.
    pub(crate) fn start_run(&mut self, start: EdgeRef, route: &[VertexId], planned_length: f64) {
        *self = Self {
            planned_length,
            true_route: std::iter::once(start.v1).chain(route.iter().copied()).collect(),
            detection_points: vec![start],
            ..Self::default()
        };
    }

    pub(crate) fn record(&mut self, outcome: TickOutcome) {
        self.ticks += 1;
        if outcome.active_routers > 0 {
            self.active_ticks += 1;
        }
        self.active_router_ticks += outcome.active_routers as u64;
        self.router_ticks += outcome.router_count as u64;
        if outcome.transmitting {
            self.transmissions += 1;
        }
        if outcome.detected {
            self.detected_transmissions += 1;
            self.last_detection = Some(outcome.tick);
            self.detection_points.push(outcome.location);
        }
    }

    /// Ticks recorded in this run.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Transmissions drawn in this run.
    pub fn transmissions(&self) -> u64 {
        self.transmissions
    }

    /// Transmissions heard and reported by at least one router.
    pub fn detected_transmissions(&self) -> u64 {
        self.detected_transmissions
    }

    /// Scalar metrics so far, with the given reconstruction score attached.
    pub fn snapshot(&self, reconstruction: PathReconstruction) -> RunMetrics {
        let ratio = |num: u64, den: u64| {
            if den == 0 {
                0.0
            } else {
                num as f64 / den as f64
            }
        };
        RunMetrics {
            activity: ratio(self.active_ticks, self.ticks),
            detection: ratio(self.detected_transmissions, self.transmissions),
            last_tracking: self.last_detection.map_or(0, Tick::get),
            path: self.planned_length,
            router_activity: if self.router_ticks == 0 {
                0.0
            } else {
                1.0 - ratio(self.active_router_ticks, self.router_ticks)
            },
            reconstruction,
        }
    }

    /// Rebuild the route from the detection points and compare it with the
    /// true one.
    ///
    /// Consecutive points are joined by shortest paths between the vertices
    /// the attacker was heading for. All three scores are zero when either
    /// route is empty.
    pub fn reconstruct(&self, map: &StreetMap) -> Result<PathReconstruction, SimulationError> {
        let mut rebuilt: Vec<VertexId> = Vec::new();
        for pair in self.detection_points.windows(2) {
            let (from, to) = (pair[0], pair[1]);
            let Some(segment) = map.shortest_path(from.v2, to.v2)? else {
                continue;
            };
            if rebuilt.is_empty() && segment.nodes.first() != Some(&from.v1) {
                rebuilt.push(from.v1);
            }
            for v in segment.nodes {
                if rebuilt.last() != Some(&v) {
                    rebuilt.push(v);
                }
            }
        }

        let true_edges = edge_set(&self.true_route);
        let rebuilt_edges = edge_set(&rebuilt);
        let mut true_length = 0.0;
        for &(a, b) in &true_edges {
            true_length += map.edge_length(a, b)?;
        }
        let mut rebuilt_length = 0.0;
        let mut shared_length = 0.0;
        for &(a, b) in &rebuilt_edges {
            let length = map.edge_length(a, b)?;
            rebuilt_length += length;
            if true_edges.contains(&(a, b)) {
                shared_length += length;
            }
        }
        if true_length == 0.0 || rebuilt_length == 0.0 {
            return Ok(PathReconstruction::default());
        }

        let (Some(&true_end), Some(&rebuilt_end)) = (self.true_route.last(), rebuilt.last()) else {
            return Ok(PathReconstruction::default());
        };
        let target_gap = map.position(true_end)?.distance(map.position(rebuilt_end)?);
        Ok(PathReconstruction {
            matching: shared_length / true_length,
            target_diff: 1.0 / (1.0 + target_gap),
            length_diff: 1.0 / (1.0 + (true_length - rebuilt_length).abs()),
        })
    }
}

/// Undirected edges walked by a vertex sequence, self-loops dropped.
fn edge_set(route: &[VertexId]) -> BTreeSet<(VertexId, VertexId)> {
    route
        .windows(2)
        .filter(|w| w[0] != w[1])
        .map(|w| (w[0].min(w[1]), w[0].max(w[1])))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use watchman_types::Position;

    /// `0 - 1 - 2 - 3` along the x axis, 10 apart, plus a detour
    /// `1 - 4 - 2` above the street.
    fn street() -> StreetMap {
        let mut map = StreetMap::new();
        for (id, x, y) in [
            (0, 0.0, 0.0),
            (1, 10.0, 0.0),
            (2, 20.0, 0.0),
            (3, 30.0, 0.0),
            (4, 15.0, 20.0),
        ] {
            map.add_vertex(VertexId(id), Position::new(x, y)).unwrap();
        }
        for (a, b) in [(0, 1), (1, 2), (2, 3), (1, 4), (4, 2)] {
            map.add_edge(VertexId(a), VertexId(b)).unwrap();
        }
        map.build_graph();
        map
    }

    fn outcome(tick: u64, active: usize, transmitting: bool, detected: bool) -> TickOutcome {
        TickOutcome {
            tick: Tick(tick),
            active_routers: active,
            router_count: 2,
            transmitting,
            detected,
            location: EdgeRef::new(VertexId(0), VertexId(1), 0.5),
        }
    }

    #[test]
    fn test_scalar_metrics() {
        let mut tracker = MetricsTracker::new();
        tracker.start_run(
            EdgeRef::new(VertexId(0), VertexId(1), 0.0),
            &[VertexId(1)],
            10.0,
        );
        tracker.record(outcome(1, 0, true, false));
        tracker.record(outcome(2, 1, true, true));
        tracker.record(outcome(3, 2, false, false));
        tracker.record(outcome(4, 1, true, false));

        let metrics = tracker.snapshot(PathReconstruction::default());
        assert_eq!(metrics.activity, 0.75);
        assert!((metrics.detection - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(metrics.last_tracking, 2);
        assert_eq!(metrics.path, 10.0);
        // 4 of 8 router-ticks active
        assert_eq!(metrics.router_activity, 0.5);
    }

    #[test]
    fn test_empty_run_is_all_zero() {
        let tracker = MetricsTracker::new();
        let metrics = tracker.snapshot(PathReconstruction::default());
        assert_eq!(metrics, RunMetrics::default());
    }

    #[test]
    fn test_reconstruction_of_fully_tracked_route() {
        let map = street();
        let mut tracker = MetricsTracker::new();
        let start = EdgeRef::new(VertexId(0), VertexId(1), 0.0);
        tracker.start_run(start, &[VertexId(1), VertexId(2), VertexId(3)], 30.0);
        for (tick, (a, b)) in [(5, (0, 1)), (15, (1, 2)), (25, (2, 3))] {
            tracker.record(TickOutcome {
                tick: Tick(tick),
                active_routers: 1,
                router_count: 1,
                transmitting: true,
                detected: true,
                location: EdgeRef::new(VertexId(a), VertexId(b), 0.5),
            });
        }

        let score = tracker.reconstruct(&map).unwrap();
        assert_eq!(score.matching, 1.0);
        assert_eq!(score.target_diff, 1.0);
        assert_eq!(score.length_diff, 1.0);
    }

    #[test]
    fn test_reconstruction_without_detections_scores_zero() {
        let map = street();
        let mut tracker = MetricsTracker::new();
        tracker.start_run(
            EdgeRef::new(VertexId(0), VertexId(1), 0.0),
            &[VertexId(1), VertexId(2)],
            20.0,
        );
        assert_eq!(tracker.reconstruct(&map).unwrap(), PathReconstruction::default());
    }

    #[test]
    fn test_reconstruction_of_partial_route() {
        let map = street();
        let mut tracker = MetricsTracker::new();
        tracker.start_run(
            EdgeRef::new(VertexId(0), VertexId(1), 0.0),
            &[VertexId(1), VertexId(2), VertexId(3)],
            30.0,
        );
        // Last seen heading for vertex 2
        tracker.record(TickOutcome {
            tick: Tick(12),
            active_routers: 1,
            router_count: 1,
            transmitting: true,
            detected: true,
            location: EdgeRef::new(VertexId(1), VertexId(2), 0.2),
        });

        let score = tracker.reconstruct(&map).unwrap();
        // Rebuilt 0-1-2 covers 20 of 30
        assert!((score.matching - 2.0 / 3.0).abs() < 1e-12);
        assert!((score.length_diff - 1.0 / 11.0).abs() < 1e-12);
        assert!((score.target_diff - 1.0 / 11.0).abs() < 1e-12);
    }
}
