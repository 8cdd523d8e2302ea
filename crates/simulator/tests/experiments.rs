//! Multi-run experiments end to end.

use tracing_test::traced_test;
use watchman_core::SimulationEvent;
use watchman_simulation::StrategyConfig;
use watchman_simulator::{Experiment, ExperimentConfig, GridConfig, StrategySpec};

fn config(seed: u64) -> ExperimentConfig {
    ExperimentConfig::new(seed)
        .with_iterations(6)
        .with_router_count(10)
        .with_router_radius(50.0)
        .with_attacker_speed(25.0)
        .with_tx_prob(0.7)
        .with_strategies(vec![
            StrategySpec::new(StrategyConfig::Sample { distance: 50.0 }),
            StrategySpec::new(StrategyConfig::SlidingWindow {
                distance: 50.0,
                time: 2,
            }),
            StrategySpec::new(StrategyConfig::KSmartestNeighbors {
                k: 3,
                distance: 400.0,
                lazy: false,
            }),
        ])
}

fn grid() -> GridConfig {
    GridConfig::new(6, 6).with_drop_ratio(0.15)
}

fn run(config: ExperimentConfig) -> SimulationEvent {
    let mut experiment = Experiment::on_grid(config, &grid()).unwrap();
    experiment.run().unwrap().finish()
}

#[test]
fn test_every_label_gets_one_entry_per_iteration() {
    let mut experiment = Experiment::on_grid(config(3), &grid()).unwrap();
    let ledger = experiment.run().unwrap();

    assert_eq!(ledger.total_runs(), 18);
    for label in [
        "Sample(d=50)",
        "SlidingWindow(d=50,t=2)",
        "KSmartestNeighbors(k=3,d=400)",
    ] {
        assert_eq!(ledger.runs(label), 6, "{label}");
        let series = ledger.series(label).unwrap();
        assert_eq!(series.detection.len(), 6);
        assert!(series.detection.iter().all(|d| (0.0..=1.0).contains(d)));
        assert!(series.activity.iter().all(|a| (0.0..=1.0).contains(a)));
        assert!(series.path.iter().all(|&p| p >= experiment.min_path_length()));
    }
}

#[test]
fn test_strategies_share_attacker_routes() {
    let mut experiment = Experiment::on_grid(config(5), &grid()).unwrap();
    let ledger = experiment.run().unwrap();

    let paths: Vec<_> = ledger
        .labels()
        .map(|label| ledger.series(label).unwrap().path.clone())
        .collect();
    assert!(paths.windows(2).all(|w| w[0] == w[1]));
}

#[test]
fn test_same_seed_same_ledger() {
    assert_eq!(run(config(9)), run(config(9)));
}

#[test]
fn test_parallel_matches_sequential() {
    assert_eq!(
        run(config(11).with_parallel(true)),
        run(config(11).with_parallel(false))
    );
}

#[test]
fn test_ledger_serializes() {
    let event = run(config(13).with_iterations(2));
    let json = serde_json::to_value(&event).unwrap();
    assert!(json.to_string().contains("KSmartestNeighbors(k=3,d=400)"));
}

#[traced_test]
#[test]
fn test_experiment_is_logged() {
    run(config(17).with_iterations(1).with_parallel(false));
    assert!(logs_contain("Starting experiment"));
    assert!(logs_contain("Experiment finished"));
}
