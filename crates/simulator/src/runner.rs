//! Multi-run experiment driver.
//!
//! An experiment deploys routers once, plans one attacker route per
//! iteration, then runs every (iteration, strategy) pair as an independent
//! job on its own engine clone:
//!
//! ```text
//!   plan (sequential, master RNG)          jobs (rayon)            aggregator
//!  ┌─────────────────────────────┐   ┌───────────────────┐   ┌──────────────────┐
//!  │ alpha router + target per   │──►│ clone + reseed    │──►│ reorder by job,  │
//!  │ iteration, min length       │   │ set strategy      │   │ RunLedger.record │
//!  │ retry / shrink policy       │   │ run to completion │   │                  │
//!  └─────────────────────────────┘   └───────────────────┘   └──────────────────┘
//!                                          crossbeam channel ─┘
//! ```
//!
//! Results are appended in job order, so the ledger is identical whether
//! jobs run in parallel or not.

use crate::map::{populate_grid, GridLayout};
use crate::{ExperimentConfig, ExperimentError, GridConfig, RunLedger};
use crossbeam::channel;
use rayon::prelude::*;
use tracing::{debug, info, warn};
use watchman_simulation::{
    AttackerConfig, AttackerModel, SimulationConfig, SimulationError, SimulationRunner,
};
use watchman_types::{Position, RouterId, RouterIndex, RunMetrics, VertexId};

/// Attacker route chosen for one iteration, shared by every strategy.
#[derive(Debug, Clone, PartialEq)]
pub struct RunPlan {
    pub iteration: usize,
    pub attacker: AttackerConfig,
}

/// Outcome of one job.
#[derive(Debug, Clone, PartialEq)]
pub struct RunResult {
    pub iteration: usize,
    pub label: String,
    pub metrics: RunMetrics,
    pub ticks: u64,
}

/// A deployed map plus the plan for evaluating strategies on it.
#[derive(Debug, Clone)]
pub struct Experiment {
    config: ExperimentConfig,

    /// Built map with routers deployed and no strategy installed.
    base: SimulationRunner,

    /// Candidate attacker targets: the vertices of the largest component.
    targets: Vec<VertexId>,

    /// Minimum path length currently in force.
    min_path_length: f64,
}

impl Experiment {
    /// Generate a street grid and deploy routers on it.
    pub fn on_grid(config: ExperimentConfig, grid: &GridConfig) -> Result<Self, ExperimentError> {
        let mut runner = SimulationRunner::new(Self::engine_config(&config, config.seed));
        let GridLayout {
            vertices,
            edges,
            diagonal,
        } = populate_grid(&mut runner, grid, derive_seed(config.seed, u64::MAX, 0))?;
        info!(vertices, edges, diagonal, "Street grid ready");
        Self::deploy(config, runner, diagonal)
    }

    /// Deploy routers on a caller-supplied map.
    ///
    /// `runner` must hold a built graph. Its routers and strategy are
    /// discarded and its RNG is reseeded from the experiment seed.
    pub fn on_map(
        config: ExperimentConfig,
        mut runner: SimulationRunner,
    ) -> Result<Self, ExperimentError> {
        runner.reset_deployment();
        runner.reseed(config.seed);
        let diagonal = bounding_diagonal(&runner);
        Self::deploy(config, runner, diagonal)
    }

    fn deploy(
        config: ExperimentConfig,
        mut runner: SimulationRunner,
        diagonal: f64,
    ) -> Result<Self, ExperimentError> {
        if config.router_count == 0 {
            return Err(ExperimentError::Empty("router"));
        }
        if config.strategies.is_empty() {
            return Err(ExperimentError::Empty("strategy"));
        }

        for i in 0..config.router_count {
            let (v1, v2) = runner.random_weighted_edge()?;
            let fraction = runner.random_float();
            runner.add_router(RouterId(i as u32), v1, v2, fraction, config.router_radius)?;
        }
        let targets = runner
            .map()
            .largest_connected_component()
            .map_err(SimulationError::from)?;
        let min_path_length = config.min_path_length.unwrap_or(0.5 * diagonal);
        debug!(
            routers = config.router_count,
            targets = targets.len(),
            min_path_length,
            "Routers deployed"
        );

        Ok(Self {
            config,
            base: runner,
            targets,
            min_path_length,
        })
    }

    fn engine_config(config: &ExperimentConfig, seed: u64) -> SimulationConfig {
        let engine = SimulationConfig::new(seed);
        match config.max_ticks {
            Some(max_ticks) => engine.with_max_ticks(max_ticks),
            None => engine,
        }
    }

    pub fn config(&self) -> &ExperimentConfig {
        &self.config
    }

    /// The deployed map every job starts from.
    pub fn base(&self) -> &SimulationRunner {
        &self.base
    }

    /// Minimum path length after any shrinking done while planning.
    pub fn min_path_length(&self) -> f64 {
        self.min_path_length
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Planning
    // ═══════════════════════════════════════════════════════════════════════

    /// Choose an alpha router and a target for every iteration.
    ///
    /// An iteration whose `target_attempts` random targets all fail is
    /// retried; once `iterations / 2` retries are used up, each further
    /// failure shrinks the minimum path length by 1%.
    pub fn plan_runs(&mut self) -> Result<Vec<RunPlan>, ExperimentError> {
        let mut plans = Vec::with_capacity(self.config.iterations);
        let mut retries_left = self.config.iterations / 2;

        for iteration in 0..self.config.iterations {
            loop {
                if let Some(attacker) = self.draw_attacker()? {
                    plans.push(RunPlan {
                        iteration,
                        attacker,
                    });
                    break;
                }
                if retries_left > 0 {
                    retries_left -= 1;
                    debug!(iteration, retries_left, "No valid attacker path, retrying");
                    continue;
                }
                if self.min_path_length == 0.0 {
                    return Err(ExperimentError::NoTarget { iteration });
                }
                self.min_path_length *= 0.99;
                if self.min_path_length < f64::EPSILON {
                    self.min_path_length = 0.0;
                }
                warn!(
                    iteration,
                    min_path_length = self.min_path_length,
                    "No valid attacker path, shrinking minimum length"
                );
            }
        }
        Ok(plans)
    }

    /// One alpha router plus up to `target_attempts` random targets.
    fn draw_attacker(&mut self) -> Result<Option<AttackerConfig>, ExperimentError> {
        let Some(alpha) = self.base.random_index(self.base.count_routers()) else {
            return Err(ExperimentError::Empty("router"));
        };
        let alpha = RouterIndex(alpha);
        let start = self.base.router(alpha)?.location;

        for _ in 0..self.config.target_attempts {
            let Some(target) = self.base.random_index(self.targets.len()) else {
                return Ok(None);
            };
            let attacker = AttackerConfig::new(start.v1, start.v2, self.targets[target])
                .with_fraction(start.fraction)
                .with_speed(self.config.attacker_speed)
                .with_tx_prob(self.config.tx_prob)
                .with_alpha_router(alpha)
                .with_min_path_length(self.min_path_length);
            if AttackerModel::plan(self.base.map(), &attacker)?.is_some() {
                // Runs replay the route without a length floor
                return Ok(Some(attacker.with_min_path_length(0.0)));
            }
        }
        Ok(None)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Execution
    // ═══════════════════════════════════════════════════════════════════════

    /// Plan every iteration and run every strategy on it.
    pub fn run(&mut self) -> Result<RunLedger, ExperimentError> {
        let plans = self.plan_runs()?;
        self.run_plans(&plans)
    }

    /// Run every strategy on the given plans.
    pub fn run_plans(&self, plans: &[RunPlan]) -> Result<RunLedger, ExperimentError> {
        let strategies = self.config.strategies.len();
        let jobs: Vec<(usize, &RunPlan, usize)> = plans
            .iter()
            .flat_map(|plan| (0..strategies).map(move |s| (plan, s)))
            .enumerate()
            .map(|(job, (plan, s))| (job, plan, s))
            .collect();

        info!(
            runs = jobs.len(),
            strategies,
            parallel = self.config.parallel,
            "Starting experiment"
        );

        let (tx, rx) = channel::unbounded::<(usize, Result<RunResult, ExperimentError>)>();
        let execute = |&(job, plan, strategy): &(usize, &RunPlan, usize)| {
            (job, self.run_job(plan, strategy))
        };
        if self.config.parallel {
            jobs.par_iter().for_each_with(tx, |tx, job| {
                // The receiver outlives every sender
                let _ = tx.send(execute(job));
            });
        } else {
            for job in &jobs {
                let _ = tx.send(execute(job));
            }
            drop(tx);
        }

        let mut slots: Vec<Option<Result<RunResult, ExperimentError>>> =
            (0..jobs.len()).map(|_| None).collect();
        for (job, result) in rx.iter() {
            slots[job] = Some(result);
        }

        let mut ledger = RunLedger::new();
        for (job, slot) in slots.into_iter().enumerate() {
            let result = slot.ok_or(ExperimentError::MissingResult { job })??;
            ledger.record(&result.label, &result.metrics, result.ticks)?;
        }
        info!(runs = ledger.total_runs(), "Experiment finished");
        Ok(ledger)
    }

    /// Run one strategy on one plan with an independent engine.
    pub fn run_job(&self, plan: &RunPlan, strategy: usize) -> Result<RunResult, ExperimentError> {
        let entry = self
            .config
            .strategies
            .get(strategy)
            .ok_or(ExperimentError::Empty("strategy"))?;
        let mut runner = self.base.clone();
        runner.reseed(derive_seed(
            self.config.seed,
            plan.iteration as u64,
            strategy as u64,
        ));
        runner.set_strategy(entry.config.clone())?;
        if !runner.set_attacker(plan.attacker.clone())? {
            return Err(ExperimentError::NoTarget {
                iteration: plan.iteration,
            });
        }
        let metrics = runner.run_to_completion()?;
        debug!(
            iteration = plan.iteration,
            strategy = %entry.label,
            ticks = runner.tick().get(),
            detection = metrics.detection,
            "Run finished"
        );
        Ok(RunResult {
            iteration: plan.iteration,
            label: entry.label.clone(),
            metrics,
            ticks: runner.tick().get(),
        })
    }
}

/// Seed for one job, mixed from the master seed (splitmix64 finaliser).
pub fn derive_seed(master: u64, iteration: u64, strategy: u64) -> u64 {
    let mut z = master
        ^ iteration.wrapping_mul(0x9E37_79B9_7F4A_7C15)
        ^ strategy.wrapping_mul(0xC2B2_AE3D_27D4_EB4F);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

fn bounding_diagonal(runner: &SimulationRunner) -> f64 {
    let mut vertices = runner.map().vertices().map(|(_, p)| p);
    let Some(first) = vertices.next() else {
        return 0.0;
    };
    let (min, max) = vertices.fold((first, first), |(min, max), p| {
        (
            Position::new(min.x.min(p.x), min.y.min(p.y)),
            Position::new(max.x.max(p.x), max.y.max(p.y)),
        )
    });
    min.distance(max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StrategySpec;
    use watchman_simulation::StrategyConfig;

    fn small_config() -> ExperimentConfig {
        ExperimentConfig::new(21)
            .with_iterations(4)
            .with_router_count(6)
            .with_router_radius(40.0)
            .with_attacker_speed(20.0)
            .with_strategies(vec![
                StrategySpec::new(StrategyConfig::Sample { distance: 40.0 }),
                StrategySpec::new(StrategyConfig::KSmartestNeighbors {
                    k: 2,
                    distance: 300.0,
                    lazy: true,
                }),
            ])
    }

    fn small_grid() -> GridConfig {
        GridConfig::new(5, 5).with_drop_ratio(0.0)
    }

    #[test]
    fn test_plans_start_at_alpha_router() {
        let mut experiment = Experiment::on_grid(small_config(), &small_grid()).unwrap();
        let plans = experiment.plan_runs().unwrap();
        assert_eq!(plans.len(), 4);

        for (i, plan) in plans.iter().enumerate() {
            assert_eq!(plan.iteration, i);
            let alpha = plan.attacker.alpha_router.unwrap();
            let router = experiment.base().router(alpha).unwrap();
            assert_eq!(plan.attacker.v1, router.location.v1);
            assert_eq!(plan.attacker.v2, router.location.v2);
            assert_eq!(plan.attacker.fraction, router.location.fraction);
            assert_eq!(plan.attacker.min_path_length, 0.0);
        }
    }

    #[test]
    fn test_job_does_not_touch_base() {
        let mut experiment = Experiment::on_grid(small_config(), &small_grid()).unwrap();
        let plans = experiment.plan_runs().unwrap();
        let result = experiment.run_job(&plans[0], 1).unwrap();

        assert_eq!(result.label, "KSmartestNeighbors(k=2,d=300)");
        assert!(result.ticks > 0);
        assert!(experiment.base().strategy().is_none());
        assert!(experiment.base().attacker().is_none());
        assert_eq!(experiment.base().count_routers(), 6);
    }

    #[test]
    fn test_unreachable_minimum_shrinks() {
        // Three vertices in a row: no path is 1000 long
        let mut runner = SimulationRunner::with_seed(1);
        for (id, x) in [(0, 0.0), (1, 10.0), (2, 20.0)] {
            runner.add_vertex(VertexId(id), Position::new(x, 0.0)).unwrap();
        }
        runner.add_edge(VertexId(0), VertexId(1)).unwrap();
        runner.add_edge(VertexId(1), VertexId(2)).unwrap();
        runner.build_graph().unwrap();

        let config = small_config()
            .with_iterations(2)
            .with_min_path_length(1000.0)
            .with_target_attempts(4);
        let mut experiment = Experiment::on_map(config, runner).unwrap();
        let plans = experiment.plan_runs().unwrap();
        assert_eq!(plans.len(), 2);
        assert!(experiment.min_path_length() < 20.0);
    }

    #[test]
    fn test_empty_config_rejected() {
        let config = small_config().with_router_count(0);
        assert_eq!(
            Experiment::on_grid(config, &small_grid()).unwrap_err(),
            ExperimentError::Empty("router")
        );
        let config = small_config().with_strategies(Vec::new());
        assert_eq!(
            Experiment::on_grid(config, &small_grid()).unwrap_err(),
            ExperimentError::Empty("strategy")
        );
    }

    #[test]
    fn test_derive_seed_spreads() {
        let seeds: std::collections::HashSet<u64> = (0..10)
            .flat_map(|i| (0..3).map(move |s| derive_seed(7, i, s)))
            .collect();
        assert_eq!(seeds.len(), 30);
        assert_eq!(derive_seed(7, 1, 2), derive_seed(7, 1, 2));
    }
}
