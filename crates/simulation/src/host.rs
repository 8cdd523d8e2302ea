//! Primitive-typed call surface over [`SimulationRunner`].
//!
//! Hosts that can only pass integers, floats and booleans across their
//! boundary drive the engine through [`ScalarHost`]. Structured values are
//! rebuilt on the host side from several scalar getters. Events are read
//! through a single staging slot: `pop_event` moves the oldest event into
//! the slot and the `event_*` accessors read it without side effects until
//! the next `pop_event`.

use crate::{AttackerConfig, SimulationConfig, SimulationError, SimulationRunner, StrategyConfig};
use watchman_core::SimulationEvent;
use watchman_types::{Attacker, Position, Router, RouterId, RouterIndex, VertexId};

/// Scalar adapter owning one engine.
#[derive(Debug, Clone)]
pub struct ScalarHost {
    runner: SimulationRunner,
    /// Event moved out of the log by the last `pop_event`.
    staged: Option<SimulationEvent>,
    /// Edge drawn by the last `random_weighted_edge_new`.
    sampled_edge: Option<(VertexId, VertexId)>,
}

impl ScalarHost {
    pub fn new(config: SimulationConfig) -> Self {
        Self::from_runner(SimulationRunner::new(config))
    }

    /// Wrap an existing engine.
    pub fn from_runner(runner: SimulationRunner) -> Self {
        Self {
            runner,
            staged: None,
            sampled_edge: None,
        }
    }

    pub fn runner(&self) -> &SimulationRunner {
        &self.runner
    }

    pub fn into_runner(self) -> SimulationRunner {
        self.runner
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Graph
    // ═══════════════════════════════════════════════════════════════════════

    pub fn add_vertex(&mut self, id: u32, x: f64, y: f64) -> Result<(), SimulationError> {
        self.runner.add_vertex(VertexId(id), Position::new(x, y))
    }

    pub fn add_edge(&mut self, v1: u32, v2: u32) -> Result<(), SimulationError> {
        self.runner.add_edge(VertexId(v1), VertexId(v2))
    }

    pub fn build_graph(&mut self) -> Result<(), SimulationError> {
        self.runner.build_graph()
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Strategy
    // ═══════════════════════════════════════════════════════════════════════

    pub fn set_sample_strategy(&mut self, distance: f64) -> Result<(), SimulationError> {
        self.runner
            .set_strategy(StrategyConfig::Sample { distance })
    }

    pub fn set_sliding_window_strategy(
        &mut self,
        distance: f64,
        time: u64,
    ) -> Result<(), SimulationError> {
        self.runner
            .set_strategy(StrategyConfig::SlidingWindow { distance, time })
    }

    pub fn set_k_smartest_neighbors_strategy(
        &mut self,
        k: usize,
        distance: f64,
        lazy: bool,
    ) -> Result<(), SimulationError> {
        self.runner
            .set_strategy(StrategyConfig::KSmartestNeighbors { k, distance, lazy })
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Attacker
    // ═══════════════════════════════════════════════════════════════════════

    /// Place the attacker. A negative `alpha_router_index` means none.
    ///
    /// A placed attacker starts a new run and drops the staged event.
    #[allow(clippy::too_many_arguments)]
    pub fn set_attacker(
        &mut self,
        v1: u32,
        v2: u32,
        target: u32,
        fraction: f64,
        speed: f64,
        tx_prob: f64,
        alpha_router_index: i64,
        min_path_length: f64,
    ) -> Result<bool, SimulationError> {
        let mut config = AttackerConfig::new(VertexId(v1), VertexId(v2), VertexId(target))
            .with_fraction(fraction)
            .with_speed(speed)
            .with_tx_prob(tx_prob)
            .with_min_path_length(min_path_length);
        if let Ok(alpha) = usize::try_from(alpha_router_index) {
            config = config.with_alpha_router(RouterIndex(alpha));
        }
        let placed = self.runner.set_attacker(config)?;
        if placed {
            self.staged = None;
        }
        Ok(placed)
    }

    fn attacker(&self) -> Result<&Attacker, SimulationError> {
        self.runner
            .attacker()
            .map(|a| a.state())
            .ok_or(SimulationError::NoAttacker)
    }

    pub fn get_attacker_v1(&self) -> Result<u32, SimulationError> {
        Ok(self.attacker()?.location.v1.0)
    }

    pub fn get_attacker_v2(&self) -> Result<u32, SimulationError> {
        Ok(self.attacker()?.location.v2.0)
    }

    pub fn get_attacker_fraction(&self) -> Result<f64, SimulationError> {
        Ok(self.attacker()?.location.fraction)
    }

    pub fn get_attacker_x(&self) -> Result<f64, SimulationError> {
        Ok(self.attacker()?.position.x)
    }

    pub fn get_attacker_y(&self) -> Result<f64, SimulationError> {
        Ok(self.attacker()?.position.y)
    }

    pub fn get_attacker_speed(&self) -> Result<f64, SimulationError> {
        Ok(self.attacker()?.speed)
    }

    pub fn get_attacker_tx_prob(&self) -> Result<f64, SimulationError> {
        Ok(self.attacker()?.tx_prob)
    }

    /// Number of vertices in the planned route.
    pub fn get_path_length(&self) -> usize {
        self.runner.path_len()
    }

    pub fn get_path_node(&self, index: usize) -> Result<u32, SimulationError> {
        Ok(self.runner.path_node(index)?.0)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Routers
    // ═══════════════════════════════════════════════════════════════════════

    pub fn add_router(
        &mut self,
        id: u32,
        v1: u32,
        v2: u32,
        fraction: f64,
        radius: f64,
    ) -> Result<usize, SimulationError> {
        let index =
            self.runner
                .add_router(RouterId(id), VertexId(v1), VertexId(v2), fraction, radius)?;
        Ok(index.get())
    }

    fn router(&self, index: usize) -> Result<&Router, SimulationError> {
        self.runner.router(RouterIndex(index))
    }

    pub fn get_router_id_by_index(&self, index: usize) -> Result<u32, SimulationError> {
        Ok(self.router(index)?.id.0)
    }

    pub fn get_router_v1_by_index(&self, index: usize) -> Result<u32, SimulationError> {
        Ok(self.router(index)?.location.v1.0)
    }

    pub fn get_router_v2_by_index(&self, index: usize) -> Result<u32, SimulationError> {
        Ok(self.router(index)?.location.v2.0)
    }

    pub fn get_router_fraction_by_index(&self, index: usize) -> Result<f64, SimulationError> {
        Ok(self.router(index)?.location.fraction)
    }

    pub fn get_router_x_by_index(&self, index: usize) -> Result<f64, SimulationError> {
        Ok(self.router(index)?.position.x)
    }

    pub fn get_router_y_by_index(&self, index: usize) -> Result<f64, SimulationError> {
        Ok(self.router(index)?.position.y)
    }

    pub fn get_router_radius_by_index(&self, index: usize) -> Result<f64, SimulationError> {
        Ok(self.router(index)?.radius)
    }

    pub fn get_router_active_by_index(&self, index: usize) -> Result<bool, SimulationError> {
        Ok(self.router(index)?.active)
    }

    /// Tick the router became active, or -1 while inactive.
    pub fn get_router_active_since_by_index(&self, index: usize) -> Result<i64, SimulationError> {
        Ok(self
            .router(index)?
            .active_since
            .map_or(-1, |tick| tick.get() as i64))
    }

    pub fn get_router_index_by_id(&self, id: u32) -> Result<usize, SimulationError> {
        Ok(self.runner.router_index(RouterId(id))?.get())
    }

    pub fn count_routers(&self) -> usize {
        self.runner.count_routers()
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Metrics
    // ═══════════════════════════════════════════════════════════════════════

    pub fn metric_activity(&self) -> f64 {
        self.runner.metrics().activity
    }

    pub fn metric_detection(&self) -> f64 {
        self.runner.metrics().detection
    }

    pub fn metric_last_tracking(&self) -> u64 {
        self.runner.metrics().last_tracking
    }

    pub fn metric_path(&self) -> f64 {
        self.runner.metrics().path
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Events
    // ═══════════════════════════════════════════════════════════════════════

    /// Stage the oldest event. Returns `false` and clears the slot when the
    /// log is empty.
    pub fn pop_event(&mut self) -> bool {
        self.staged = self.runner.pop_event();
        self.staged.is_some()
    }

    fn staged(&self) -> Result<&SimulationEvent, SimulationError> {
        self.staged.as_ref().ok_or(SimulationError::NoCurrentEvent)
    }

    pub fn event_is_router_detects(&self) -> Result<bool, SimulationError> {
        Ok(matches!(
            self.staged()?,
            SimulationEvent::RouterDetects { .. }
        ))
    }

    pub fn event_is_router_misses(&self) -> Result<bool, SimulationError> {
        Ok(matches!(self.staged()?, SimulationEvent::RouterMisses { .. }))
    }

    pub fn event_is_router_active(&self) -> Result<bool, SimulationError> {
        Ok(matches!(self.staged()?, SimulationEvent::RouterActive { .. }))
    }

    pub fn event_is_router_inactive(&self) -> Result<bool, SimulationError> {
        Ok(matches!(
            self.staged()?,
            SimulationEvent::RouterInactive { .. }
        ))
    }

    pub fn event_is_simulation_finished(&self) -> Result<bool, SimulationError> {
        Ok(matches!(
            self.staged()?,
            SimulationEvent::SimulationFinished { .. }
        ))
    }

    pub fn event_is_multi_run_finished(&self) -> Result<bool, SimulationError> {
        Ok(matches!(
            self.staged()?,
            SimulationEvent::MultiRunFinished { .. }
        ))
    }

    pub fn event_get_tick(&self) -> Result<u64, SimulationError> {
        let event = self.staged()?;
        event.tick().map(|t| t.get()).ok_or(SimulationError::MissingField {
            event: event.type_name(),
            field: "tick",
        })
    }

    pub fn event_router_get_index(&self) -> Result<usize, SimulationError> {
        let event = self.staged()?;
        event
            .router()
            .map(RouterIndex::get)
            .ok_or(SimulationError::MissingField {
                event: event.type_name(),
                field: "router",
            })
    }

    fn event_position(&self) -> Result<Position, SimulationError> {
        let event = self.staged()?;
        event.position().ok_or(SimulationError::MissingField {
            event: event.type_name(),
            field: "position",
        })
    }

    pub fn event_position_get_x(&self) -> Result<f64, SimulationError> {
        Ok(self.event_position()?.x)
    }

    pub fn event_position_get_y(&self) -> Result<f64, SimulationError> {
        Ok(self.event_position()?.y)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Sampling
    // ═══════════════════════════════════════════════════════════════════════

    /// Draw a length-weighted random edge and stage it for the getters.
    pub fn random_weighted_edge_new(&mut self) -> Result<(), SimulationError> {
        self.sampled_edge = Some(self.runner.random_weighted_edge()?);
        Ok(())
    }

    pub fn random_weighted_edge_v1(&self) -> Result<u32, SimulationError> {
        let (v1, _) = self.sampled_edge.ok_or(SimulationError::EmptyEdgePool)?;
        Ok(v1.0)
    }

    pub fn random_weighted_edge_v2(&self) -> Result<u32, SimulationError> {
        let (_, v2) = self.sampled_edge.ok_or(SimulationError::EmptyEdgePool)?;
        Ok(v2.0)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Ticks & resets
    // ═══════════════════════════════════════════════════════════════════════

    pub fn do_tick(&mut self) -> Result<(), SimulationError> {
        self.runner.do_tick()
    }

    pub fn get_tick(&self) -> u64 {
        self.runner.tick().get()
    }

    pub fn is_done(&self) -> bool {
        self.runner.is_done()
    }

    /// Clear the run. Drops the staged event.
    pub fn reset(&mut self) {
        self.staged = None;
        self.runner.reset();
    }

    /// Clear everything. Drops the staged event and sampled edge.
    pub fn full_reset(&mut self) {
        self.staged = None;
        self.sampled_edge = None;
        self.runner.full_reset();
    }
}
