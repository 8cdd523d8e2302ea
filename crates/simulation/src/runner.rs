//! Tick scheduler.
//!
//! The runner owns every piece of engine state: street map, router
//! registry, attacker, strategy, event log, metrics and RNG. Hosts drive it
//! through synchronous calls; nothing runs in the background.

use crate::attacker::{AttackerConfig, AttackerModel};
use crate::metrics::{MetricsTracker, TickOutcome};
use crate::strategy::{ActiveStrategy, DetectionStrategy, Scene, StrategyConfig};
use crate::{EventLog, RouterRegistry, SimulationConfig, SimulationError, WeightedEdgeSampler};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::sync::Arc;
use tracing::{debug, info};
use watchman_core::{LogTracer, SimulationEvent, Tracer};
use watchman_graph::{GraphError, StreetMap};
use watchman_types::{
    EdgeRef, PathReconstruction, Position, Router, RouterId, RouterIndex, RunMetrics, Tick,
    VertexId,
};

/// Deterministic chase simulation engine.
///
/// Given the same seed and the same sequence of calls, produces identical
/// events every run. Instances are independent; clone one to run the same
/// deployment on another thread.
#[derive(Clone)]
pub struct SimulationRunner {
    config: SimulationConfig,

    /// Street graph.
    map: StreetMap,

    /// Deployed routers.
    registry: RouterRegistry,

    /// Installed detection strategy, if any.
    strategy: Option<ActiveStrategy>,

    /// Attacker of the current run.
    attacker: Option<AttackerModel>,

    /// Pending events for the host.
    events: EventLog,

    /// Counters of the current run.
    metrics: MetricsTracker,

    /// Metrics frozen when the run finished.
    final_metrics: Option<RunMetrics>,

    /// Edge pool, built on first use after each graph change.
    sampler: Option<WeightedEdgeSampler>,

    /// RNG for transmissions and sampling (seeded for determinism).
    rng: ChaCha8Rng,

    tick: Tick,
    done: bool,

    tracer: Arc<dyn Tracer>,
}

impl SimulationRunner {
    /// Create an empty engine.
    pub fn new(config: SimulationConfig) -> Self {
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        Self {
            config,
            map: StreetMap::new(),
            registry: RouterRegistry::new(),
            strategy: None,
            attacker: None,
            events: EventLog::new(),
            metrics: MetricsTracker::new(),
            final_metrics: None,
            sampler: None,
            rng,
            tick: Tick::ZERO,
            done: false,
            tracer: Arc::new(LogTracer),
        }
    }

    /// Create an empty engine with default settings and the given seed.
    pub fn with_seed(seed: u64) -> Self {
        Self::new(SimulationConfig::new(seed))
    }

    /// Replace the debug trace sink.
    pub fn with_tracer(mut self, tracer: Arc<dyn Tracer>) -> Self {
        self.tracer = tracer;
        self
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Restart the RNG stream from `seed`; later resets reuse it.
    pub fn reseed(&mut self, seed: u64) {
        self.config.seed = seed;
        self.rng = ChaCha8Rng::seed_from_u64(seed);
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Graph
    // ═══════════════════════════════════════════════════════════════════════

    pub fn add_vertex(&mut self, id: VertexId, position: Position) -> Result<(), SimulationError> {
        self.map.add_vertex(id, position)?;
        self.sampler = None;
        Ok(())
    }

    pub fn add_edge(&mut self, v1: VertexId, v2: VertexId) -> Result<(), SimulationError> {
        self.map.add_edge(v1, v2)?;
        self.sampler = None;
        Ok(())
    }

    /// Build adjacency and refresh strategy structures.
    pub fn build_graph(&mut self) -> Result<(), SimulationError> {
        self.map.build_graph();
        self.prepare_strategy()
    }

    pub fn map(&self) -> &StreetMap {
        &self.map
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Strategy
    // ═══════════════════════════════════════════════════════════════════════

    /// Install a strategy, discarding the previous one and all its state.
    pub fn set_strategy(&mut self, config: StrategyConfig) -> Result<(), SimulationError> {
        let strategy = ActiveStrategy::from_config(config)?;
        debug!(strategy = strategy.name(), "Strategy installed");
        self.strategy = Some(strategy);
        self.prepare_strategy()
    }

    pub fn strategy(&self) -> Option<&ActiveStrategy> {
        self.strategy.as_ref()
    }

    fn prepare_strategy(&mut self) -> Result<(), SimulationError> {
        if !self.map.is_built() {
            return Ok(());
        }
        if let Some(strategy) = self.strategy.as_mut() {
            let scene = Scene {
                map: &self.map,
                routers: self.registry.as_slice(),
            };
            strategy.prepare(&scene)?;
        }
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Routers
    // ═══════════════════════════════════════════════════════════════════════

    /// Deploy a router `fraction` of the way along `v1 -> v2`.
    pub fn add_router(
        &mut self,
        id: RouterId,
        v1: VertexId,
        v2: VertexId,
        fraction: f64,
        radius: f64,
    ) -> Result<RouterIndex, SimulationError> {
        let location = EdgeRef::new(v1, v2, fraction);
        if !(0.0..=1.0).contains(&fraction) {
            return Err(SimulationError::InvalidFraction(fraction));
        }
        let position = self.map.position_on(location)?;
        self.registry.add(id, location, position, radius)
    }

    pub fn router(&self, index: RouterIndex) -> Result<&Router, SimulationError> {
        self.registry.get(index)
    }

    pub fn router_index(&self, id: RouterId) -> Result<RouterIndex, SimulationError> {
        self.registry.index_of(id)
    }

    pub fn routers(&self) -> &RouterRegistry {
        &self.registry
    }

    pub fn count_routers(&self) -> usize {
        self.registry.len()
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Attacker
    // ═══════════════════════════════════════════════════════════════════════

    /// Place the attacker and start a fresh run.
    ///
    /// Returns `Ok(false)` and changes nothing if the target is unreachable
    /// or the route is shorter than `min_path_length`.
    pub fn set_attacker(&mut self, config: AttackerConfig) -> Result<bool, SimulationError> {
        if !self.map.is_built() {
            return Err(GraphError::NotBuilt.into());
        }
        if let Some(alpha) = config.alpha_router {
            self.registry.get(alpha)?;
        }
        let Some(model) = AttackerModel::plan(&self.map, &config)? else {
            debug!(
                v1 = %config.v1,
                v2 = %config.v2,
                target = %config.target,
                min_path_length = config.min_path_length,
                "Attacker rejected"
            );
            return Ok(false);
        };

        // Last fallible step; nothing below can fail.
        if let Some(strategy) = self.strategy.as_mut() {
            let scene = Scene {
                map: &self.map,
                routers: self.registry.as_slice(),
            };
            strategy.prepare(&scene)?;
            strategy.on_run_start(&scene, config.alpha_router)?;
        }

        let planned = model.planned_path();
        self.metrics
            .start_run(model.location(), &planned.nodes, planned.length);
        debug!(
            target = %config.target,
            path_length = planned.length,
            hops = planned.nodes.len(),
            "Attacker placed"
        );
        if self.tracer.enabled() {
            self.tracer.trace(format_args!(
                "attacker at {} heading for {} (path {:.3})",
                model.position(),
                config.target,
                planned.length
            ));
        }

        self.attacker = Some(model);
        self.registry.clear_activity();
        self.events.clear();
        self.final_metrics = None;
        self.tick = Tick::ZERO;
        self.done = false;
        Ok(true)
    }

    pub fn attacker(&self) -> Option<&AttackerModel> {
        self.attacker.as_ref()
    }

    /// Number of vertices in the planned route, 0 without an attacker.
    pub fn path_len(&self) -> usize {
        self.attacker.as_ref().map_or(0, AttackerModel::path_len)
    }

    /// Vertex `index` of the planned route.
    pub fn path_node(&self, index: usize) -> Result<VertexId, SimulationError> {
        let attacker = self.attacker.as_ref().ok_or(SimulationError::NoAttacker)?;
        attacker
            .path_node(index)
            .ok_or(SimulationError::OutOfRange {
                index,
                count: attacker.path_len(),
            })
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Ticks
    // ═══════════════════════════════════════════════════════════════════════

    /// Advance the simulation by one tick.
    ///
    /// No-op once the run is done or before an attacker is placed.
    pub fn do_tick(&mut self) -> Result<(), SimulationError> {
        if self.done {
            return Ok(());
        }
        let Some(attacker) = self.attacker.as_mut() else {
            return Ok(());
        };
        if !self.map.is_built() {
            return Err(GraphError::NotBuilt.into());
        }

        let tick = self.tick.next();
        attacker.advance(&self.map)?;
        let position = attacker.position();
        let location = attacker.location();
        let arrived = attacker.has_arrived();
        let transmitting = attacker.transmits(&mut self.rng);

        let verdicts = match self.strategy.as_mut() {
            Some(strategy) => strategy.evaluate(
                &Scene {
                    map: &self.map,
                    routers: self.registry.as_slice(),
                },
                position,
                transmitting,
            ),
            None => Vec::new(),
        };

        let mut detected = Vec::new();
        for i in 0..self.registry.len() {
            let index = RouterIndex(i);
            let verdict = verdicts.get(i).copied().unwrap_or_default();

            match self.registry.set_active(index, verdict.active, tick) {
                Some(true) => self.events.push(SimulationEvent::RouterActive {
                    tick,
                    router: index,
                }),
                Some(false) => self.events.push(SimulationEvent::RouterInactive {
                    tick,
                    router: index,
                }),
                None => {}
            }

            let hears = transmitting && self.registry.get(index)?.in_reach(position);
            if !hears {
                continue;
            }
            if verdict.detects {
                detected.push(index);
                self.events.push(SimulationEvent::RouterDetects {
                    tick,
                    router: index,
                    position,
                });
            } else {
                self.events.push(SimulationEvent::RouterMisses {
                    tick,
                    router: index,
                    position,
                });
            }
        }

        self.metrics.record(TickOutcome {
            tick,
            active_routers: self.registry.active_count(),
            router_count: self.registry.len(),
            transmitting,
            detected: !detected.is_empty(),
            location,
        });

        if let Some(strategy) = self.strategy.as_mut() {
            let scene = Scene {
                map: &self.map,
                routers: self.registry.as_slice(),
            };
            strategy.on_detections(&scene, &detected)?;
        }

        if self.tracer.enabled() {
            self.tracer.trace(format_args!(
                "tick={} attacker={} transmitting={} detections={}",
                tick.get(),
                position,
                transmitting,
                detected.len()
            ));
        }
        self.tick = tick;

        let out_of_budget = self.config.max_ticks.is_some_and(|max| tick.get() >= max);
        if arrived || out_of_budget {
            self.finish()?;
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<(), SimulationError> {
        let reconstruction = self.metrics.reconstruct(&self.map)?;
        let metrics = self.metrics.snapshot(reconstruction);
        info!(
            tick = self.tick.get(),
            activity = metrics.activity,
            detection = metrics.detection,
            last_tracking = metrics.last_tracking,
            path = metrics.path,
            "Simulation finished"
        );
        self.events.push(SimulationEvent::SimulationFinished {
            tick: self.tick,
            metrics,
        });
        self.final_metrics = Some(metrics);
        self.done = true;
        Ok(())
    }

    /// Current tick, 0 before the first `do_tick` of a run.
    pub fn tick(&self) -> Tick {
        self.tick
    }

    /// Whether the run reached its terminal state.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Run ticks until the run is done, returning the final metrics.
    ///
    /// Stops early with `NoAttacker` if no attacker is placed, and with
    /// `Stalled` if the attacker cannot move and there is no tick budget.
    pub fn run_to_completion(&mut self) -> Result<RunMetrics, SimulationError> {
        let attacker = self.attacker.as_ref().ok_or(SimulationError::NoAttacker)?;
        if !self.done && self.config.max_ticks.is_none() && !attacker.can_progress() {
            return Err(SimulationError::Stalled);
        }
        while !self.done {
            self.do_tick()?;
        }
        Ok(self.metrics())
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Events & metrics
    // ═══════════════════════════════════════════════════════════════════════

    /// Remove the oldest pending event.
    pub fn pop_event(&mut self) -> Option<SimulationEvent> {
        self.events.pop()
    }

    /// Remove every pending event, oldest first.
    pub fn drain_events(&mut self) -> Vec<SimulationEvent> {
        self.events.drain().collect()
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    /// Metrics of the current run; final once the run is done.
    ///
    /// Path reconstruction is only scored when the run finishes.
    pub fn metrics(&self) -> RunMetrics {
        self.final_metrics
            .unwrap_or_else(|| self.metrics.snapshot(PathReconstruction::default()))
    }

    pub fn metrics_tracker(&self) -> &MetricsTracker {
        &self.metrics
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Randomness
    // ═══════════════════════════════════════════════════════════════════════

    /// Draw an edge of the largest connected component, weighted by length.
    pub fn random_weighted_edge(&mut self) -> Result<(VertexId, VertexId), SimulationError> {
        if self.sampler.is_none() {
            self.sampler = Some(WeightedEdgeSampler::from_map(&self.map)?);
        }
        let sampler = self.sampler.as_ref().ok_or(SimulationError::EmptyEdgePool)?;
        Ok(sampler.sample(&mut self.rng))
    }

    /// Uniform float in `[0, 1)` from the engine RNG.
    pub fn random_float(&mut self) -> f64 {
        self.rng.gen()
    }

    /// Uniform index in `[0, len)`, `None` if `len` is 0.
    pub fn random_index(&mut self, len: usize) -> Option<usize> {
        (len > 0).then(|| self.rng.gen_range(0..len))
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Resets
    // ═══════════════════════════════════════════════════════════════════════

    /// Clear the run: tick, attacker, events, metrics and router activity.
    ///
    /// Graph, routers and strategy configuration are kept.
    pub fn reset(&mut self) {
        self.attacker = None;
        self.events.clear();
        self.metrics = MetricsTracker::new();
        self.final_metrics = None;
        self.registry.clear_activity();
        self.tick = Tick::ZERO;
        self.done = false;
    }

    /// `reset`, then drop routers and strategy and reseed the RNG.
    pub fn reset_deployment(&mut self) {
        self.reset();
        self.strategy = None;
        self.registry.clear();
        self.rng = ChaCha8Rng::seed_from_u64(self.config.seed);
    }

    /// Return to the just-constructed state, keeping config and tracer.
    pub fn full_reset(&mut self) {
        self.reset_deployment();
        self.map = StreetMap::new();
        self.sampler = None;
    }
}

impl std::fmt::Debug for SimulationRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulationRunner")
            .field("vertices", &self.map.vertex_count())
            .field("edges", &self.map.edge_count())
            .field("routers", &self.registry.len())
            .field("strategy", &self.strategy.as_ref().map(|s| s.name()))
            .field("tick", &self.tick)
            .field("done", &self.done)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use watchman_core::BufferTracer;

    /// Two vertices 10 apart with one router in the middle.
    fn line_runner() -> SimulationRunner {
        let mut runner = SimulationRunner::with_seed(1);
        runner.add_vertex(VertexId(0), Position::new(0.0, 0.0)).unwrap();
        runner.add_vertex(VertexId(1), Position::new(10.0, 0.0)).unwrap();
        runner.add_edge(VertexId(0), VertexId(1)).unwrap();
        runner.build_graph().unwrap();
        runner
            .add_router(RouterId(7), VertexId(0), VertexId(1), 0.5, 1.0)
            .unwrap();
        runner
    }

    #[test]
    fn test_tick_without_attacker_is_noop() {
        let mut runner = line_runner();
        runner.do_tick().unwrap();
        assert_eq!(runner.tick(), Tick::ZERO);
        assert!(runner.events().is_empty());
    }

    #[test]
    fn test_set_attacker_requires_built_graph() {
        let mut runner = line_runner();
        runner.add_vertex(VertexId(2), Position::new(20.0, 0.0)).unwrap();
        let err = runner
            .set_attacker(AttackerConfig::new(VertexId(0), VertexId(1), VertexId(1)))
            .unwrap_err();
        assert_eq!(err, SimulationError::Graph(GraphError::NotBuilt));
    }

    #[test]
    fn test_rejected_attacker_keeps_previous_run() {
        let mut runner = line_runner();
        runner
            .set_strategy(StrategyConfig::Sample { distance: 1.0 })
            .unwrap();
        assert!(runner
            .set_attacker(AttackerConfig::new(VertexId(0), VertexId(1), VertexId(1)))
            .unwrap());
        runner.do_tick().unwrap();
        runner.do_tick().unwrap();

        let rejected = runner
            .set_attacker(
                AttackerConfig::new(VertexId(0), VertexId(1), VertexId(1))
                    .with_min_path_length(50.0),
            )
            .unwrap();
        assert!(!rejected);
        assert_eq!(runner.tick(), Tick(2));
        assert_eq!(
            runner.attacker().unwrap().position(),
            Position::new(2.0, 0.0)
        );
    }

    #[test]
    fn test_alpha_router_must_exist() {
        let mut runner = line_runner();
        let err = runner
            .set_attacker(
                AttackerConfig::new(VertexId(0), VertexId(1), VertexId(1))
                    .with_alpha_router(RouterIndex(3)),
            )
            .unwrap_err();
        assert_eq!(err, SimulationError::OutOfRange { index: 3, count: 1 });
    }

    #[test]
    fn test_without_strategy_routers_only_miss() {
        let mut runner = line_runner();
        runner
            .set_attacker(AttackerConfig::new(VertexId(0), VertexId(1), VertexId(1)))
            .unwrap();
        let events: Vec<_> = (0..10)
            .flat_map(|_| {
                runner.do_tick().unwrap();
                runner.drain_events()
            })
            .collect();
        assert!(events
            .iter()
            .all(|e| !matches!(e, SimulationEvent::RouterDetects { .. })));
        // Heard at x = 4, 5, 6
        let misses = events
            .iter()
            .filter(|e| matches!(e, SimulationEvent::RouterMisses { .. }))
            .count();
        assert_eq!(misses, 3);
        assert!(runner.is_done());
    }

    #[test]
    fn test_tick_budget_finishes_run() {
        let mut runner = SimulationRunner::new(SimulationConfig::new(1).with_max_ticks(3));
        runner.add_vertex(VertexId(0), Position::new(0.0, 0.0)).unwrap();
        runner.add_vertex(VertexId(1), Position::new(100.0, 0.0)).unwrap();
        runner.add_edge(VertexId(0), VertexId(1)).unwrap();
        runner.build_graph().unwrap();
        runner
            .set_attacker(AttackerConfig::new(VertexId(0), VertexId(1), VertexId(1)))
            .unwrap();

        let metrics = runner.run_to_completion().unwrap();
        assert_eq!(runner.tick(), Tick(3));
        assert_eq!(metrics.path, 100.0);
        assert!(!runner.attacker().unwrap().has_arrived());
    }

    #[test]
    fn test_parked_attacker_without_budget_is_refused() {
        let mut runner = line_runner();
        assert_eq!(runner.config().max_ticks, None);
        assert!(runner
            .set_attacker(
                AttackerConfig::new(VertexId(0), VertexId(1), VertexId(1))
                    .with_fraction(0.2)
                    .with_speed(0.0)
            )
            .unwrap());
        assert_eq!(
            runner.run_to_completion().unwrap_err(),
            SimulationError::Stalled
        );
        assert_eq!(runner.tick(), Tick::ZERO);

        // Manual ticks still work
        runner.do_tick().unwrap();
        assert_eq!(runner.tick(), Tick(1));
        assert!(!runner.is_done());
    }

    #[test]
    fn test_set_attacker_rejects_missing_street() {
        let mut runner = SimulationRunner::with_seed(1);
        for (id, x, y) in [(0, 0.0, 0.0), (1, 10.0, 0.0), (2, 0.0, 10.0)] {
            runner.add_vertex(VertexId(id), Position::new(x, y)).unwrap();
        }
        runner.add_edge(VertexId(0), VertexId(1)).unwrap();
        runner.add_edge(VertexId(0), VertexId(2)).unwrap();
        runner.build_graph().unwrap();

        let err = runner
            .set_attacker(
                AttackerConfig::new(VertexId(1), VertexId(2), VertexId(2)).with_fraction(0.5),
            )
            .unwrap_err();
        assert_eq!(
            err,
            SimulationError::Graph(GraphError::UnknownEdge(VertexId(1), VertexId(2)))
        );
        assert!(runner.attacker().is_none());
    }

    #[test]
    fn test_buffer_tracer_receives_tick_lines() {
        let tracer = Arc::new(BufferTracer::new());
        let mut runner = line_runner().with_tracer(tracer.clone());
        runner
            .set_attacker(AttackerConfig::new(VertexId(0), VertexId(1), VertexId(1)))
            .unwrap();
        runner.do_tick().unwrap();

        let lines = tracer.take();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("attacker at"));
        assert!(lines[1].starts_with("tick=1 "));
    }

    #[test]
    fn test_reseed_restarts_stream() {
        let mut a = line_runner();
        let mut b = line_runner();
        b.random_float();
        a.reseed(99);
        b.reseed(99);
        assert_eq!(a.config().seed, 99);
        assert_eq!(a.random_float(), b.random_float());

        // Deployment resets go back to the new seed
        let first = a.random_float();
        a.reset_deployment();
        a.random_float();
        assert_eq!(a.random_float(), first);
    }

    #[test]
    fn test_random_helpers() {
        let mut runner = line_runner();
        assert_eq!(runner.random_index(0), None);
        assert!(runner.random_index(5).unwrap() < 5);
        let f = runner.random_float();
        assert!((0.0..1.0).contains(&f));
        assert_eq!(
            runner.random_weighted_edge().unwrap(),
            (VertexId(0), VertexId(1))
        );
    }
}
