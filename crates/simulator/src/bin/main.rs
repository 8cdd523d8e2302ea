//! Watchman Simulator CLI
//!
//! Compare detection strategies on a synthetic street grid.
//!
//! # Example
//!
//! ```bash
//! # Ten runs per strategy on a 12x12 grid with a fixed seed
//! watchman-sim --seed 42 -n 10 --routers 30
//!
//! # Sweep k for the neighbour strategy and print the ledger as JSON
//! watchman-sim -n 20 --ksn-k 1 --ksn-k 2 --ksn-k 4 --json
//! ```

use clap::Parser;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use watchman_simulation::StrategyConfig;
use watchman_simulator::{Experiment, ExperimentConfig, GridConfig, StrategySpec};

/// Watchman Simulator
///
/// Runs every selected strategy against the same attacker routes.
/// Reproducible when the same seed is used.
#[derive(Parser, Debug)]
#[command(name = "watchman-sim")]
#[command(version, about, long_about = None)]
struct Args {
    /// Grid columns
    #[arg(long, default_value = "12")]
    columns: u32,

    /// Grid rows
    #[arg(long, default_value = "12")]
    rows: u32,

    /// Distance between grid vertices
    #[arg(long, default_value = "100")]
    spacing: f64,

    /// Vertex jitter as a fraction of the spacing
    #[arg(long, default_value = "0.2")]
    jitter: f64,

    /// Share of grid streets to drop
    #[arg(long, default_value = "0.1")]
    drop_ratio: f64,

    /// Number of routers
    #[arg(short = 'r', long, default_value = "20")]
    routers: usize,

    /// Router hearing radius
    #[arg(long, default_value = "20")]
    radius: f64,

    /// Runs per strategy
    #[arg(short = 'n', long, default_value = "10")]
    iterations: usize,

    /// Random seed for reproducible results. When omitted, a random seed is used.
    #[arg(long)]
    seed: Option<u64>,

    /// Attacker transmission probability per tick (0.0-1.0)
    #[arg(long, default_value = "0.5")]
    tx_prob: f64,

    /// Attacker distance per tick
    #[arg(long, default_value = "5")]
    speed: f64,

    /// Minimum attacker path length. Defaults to half the map diagonal.
    #[arg(long)]
    min_path_length: Option<f64>,

    /// Tick budget per run
    #[arg(long, default_value = "100000")]
    max_ticks: u64,

    /// Sample strategy distances (repeatable)
    #[arg(long)]
    sample_distance: Vec<f64>,

    /// Sliding-window strategy distances (repeatable)
    #[arg(long)]
    window_distance: Vec<f64>,

    /// Consecutive ticks the sliding-window strategy needs
    #[arg(long, default_value = "3")]
    window_time: u64,

    /// k values for the k-smartest-neighbours strategy (repeatable)
    #[arg(long)]
    ksn_k: Vec<usize>,

    /// Neighbour search distance for the k-smartest-neighbours strategy
    #[arg(long, default_value = "250")]
    ksn_distance: f64,

    /// Compute neighbour lists on first use instead of up front
    #[arg(long)]
    lazy: bool,

    /// Run jobs on the calling thread
    #[arg(long)]
    sequential: bool,

    /// Print the ledger as JSON instead of a table
    #[arg(long)]
    json: bool,
}

impl Args {
    fn strategies(&self) -> Vec<StrategySpec> {
        let mut strategies: Vec<StrategySpec> = self
            .sample_distance
            .iter()
            .map(|&distance| StrategySpec::new(StrategyConfig::Sample { distance }))
            .collect();
        strategies.extend(self.window_distance.iter().map(|&distance| {
            StrategySpec::new(StrategyConfig::SlidingWindow {
                distance,
                time: self.window_time,
            })
        }));
        strategies.extend(self.ksn_k.iter().map(|&k| {
            StrategySpec::new(StrategyConfig::KSmartestNeighbors {
                k,
                distance: self.ksn_distance,
                lazy: self.lazy,
            })
        }));
        strategies
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,watchman_simulator=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let seed = args.seed.unwrap_or_else(rand::random);

    let mut config = ExperimentConfig::new(seed)
        .with_iterations(args.iterations)
        .with_router_count(args.routers)
        .with_router_radius(args.radius)
        .with_attacker_speed(args.speed)
        .with_tx_prob(args.tx_prob)
        .with_max_ticks(Some(args.max_ticks))
        .with_parallel(!args.sequential);
    if let Some(length) = args.min_path_length {
        config = config.with_min_path_length(length);
    }
    let strategies = args.strategies();
    if !strategies.is_empty() {
        config = config.with_strategies(strategies);
    }

    let grid = GridConfig::new(args.columns, args.rows)
        .with_spacing(args.spacing)
        .with_jitter(args.jitter)
        .with_drop_ratio(args.drop_ratio);

    info!(
        seed,
        iterations = config.iterations,
        routers = config.router_count,
        strategies = config.strategies.len(),
        columns = grid.columns,
        rows = grid.rows,
        "Experiment configured"
    );

    let ledger = match Experiment::on_grid(config, &grid).and_then(|mut e| e.run()) {
        Ok(ledger) => ledger,
        Err(e) => {
            error!(error = %e, "Experiment failed");
            return ExitCode::FAILURE;
        }
    };

    if args.json {
        match serde_json::to_string_pretty(&ledger.finish()) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                error!(error = %e, "Could not serialize ledger");
                return ExitCode::FAILURE;
            }
        }
    } else {
        ledger.print_summary();
    }
    ExitCode::SUCCESS
}
