// Replications and the files they are exported to

use car_wash::experiment::replication_seed;
use car_wash::report::{write_json, write_replications_csv};
use car_wash::{
    GatePolicy, Params, ReplicationOutcome, ReplicationSettings,
    SimulationConfig, Simulator, run_replications,
};

fn settings(count: usize, base_seed: u64, threads: Option<usize>) -> ReplicationSettings {
    ReplicationSettings {
        count,
        base_seed,
        threads,
    }
}

#[test]
fn thread_count_does_not_change_summary() {
    let params = Params::new(60, 0.01, 3000).with_policy(GatePolicy::OpenGate);

    let single = run_replications(&params, &settings(40, 5, Some(1))).unwrap();
    let many = run_replications(&params, &settings(40, 5, Some(4))).unwrap();

    assert_eq!(single, many);
    assert_eq!(single.outcomes, many.outcomes);
}

#[test]
fn each_replication_matches_a_single_seeded_run() {
    let params = Params::new(45, 0.02, 1500);
    let summary = run_replications(&params, &settings(8, 100, None)).unwrap();

    assert_eq!(summary.runs, 8);
    assert_eq!(summary.failed_runs, 0);
    for outcome in &summary.outcomes {
        let seed = replication_seed(100, outcome.replication);
        assert_eq!(outcome.seed, seed);

        let report = Simulator::seeded(&params, seed).unwrap().run();
        assert_eq!(*outcome, ReplicationOutcome::new(outcome.replication, seed, &report));
    }
}

#[test]
fn closed_gate_summary_never_ends_late() {
    let params = Params::new(240, 0.0025, 6000);
    let summary = run_replications(&params, &settings(50, 1, None)).unwrap();

    assert_eq!(summary.ending_tick.min, 6000.0);
    assert_eq!(summary.ending_tick.max, 6000.0);
    assert_eq!(summary.customers_served.n, 50);
    assert!(summary.customers_served.mean > 0.0);
    // a 240 s wash can finish at most 25 cars in 6000 s
    assert!(summary.customers_served.max <= 25.0);
}

#[test]
fn open_gate_summary_drains_every_run() {
    let params = Params::new(240, 0.0025, 6000).with_policy(GatePolicy::OpenGate);
    let summary = run_replications(&params, &settings(50, 1, None)).unwrap();

    assert_eq!(summary.left_in_queue.max, 0.0);
    assert!(summary.ending_tick.min >= 6000.0);
}

#[test]
fn zero_replications() {
    let summary = run_replications(&Params::default(), &settings(0, 1, None)).unwrap();

    assert_eq!(summary.runs, 0);
    assert_eq!(summary.failed_runs, 0);
    assert!(summary.outcomes.is_empty());
    assert_eq!(summary.customers_served.n, 0);
}

#[test]
fn no_arrivals_means_no_average_wait_samples() {
    let params = Params::new(10, 0.0, 100);
    let summary = run_replications(&params, &settings(5, 1, None)).unwrap();

    assert_eq!(summary.average_wait.n, 0);
    assert_eq!(summary.customers_served.max, 0.0);
}

#[test]
fn csv_rows_round_trip() {
    let params = Params::new(30, 0.05, 500);
    let summary = run_replications(&params, &settings(6, 9, None)).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("replications.csv");

    write_replications_csv(&summary.outcomes, &path).unwrap();

    let mut reader = csv::Reader::from_path(&path).unwrap();
    let headers = reader.headers().unwrap().clone();
    assert_eq!(
        headers.iter().collect::<Vec<_>>(),
        vec![
            "replication",
            "seed",
            "customers_served",
            "average_wait",
            "ending_tick",
            "arrivals",
            "left_in_queue"
        ]
    );
    let rows: Vec<ReplicationOutcome> = reader.deserialize().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 6);
    for (row, outcome) in rows.iter().zip(&summary.outcomes) {
        assert_eq!(row.replication, outcome.replication);
        assert_eq!(row.customers_served, outcome.customers_served);
        assert_eq!(row.ending_tick, outcome.ending_tick);
        assert_eq!(row.average_wait.is_some(), outcome.average_wait.is_some());
    }
}

#[test]
fn summary_json_has_parameters_and_statistics() {
    let params = Params::new(30, 0.05, 500).with_policy(GatePolicy::OpenGate);
    let summary = run_replications(&params, &settings(4, 2, None)).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("summary.json");

    write_json(&summary, &path).unwrap();

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(json["params"]["service_duration"], 30);
    assert_eq!(json["params"]["policy"], "open-gate");
    assert_eq!(json["runs"], 4);
    assert!(json["customers_served"]["mean"].is_number());
    assert!(json.get("outcomes").is_none());
}

#[test]
fn bundled_experiment_configs_parse() {
    let dir = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("experiments");

    let baseline = SimulationConfig::load(dir.join("baseline.toml")).unwrap();
    assert_eq!(baseline.simulation, Params::default());
    assert_eq!(baseline.seed, Some(42));
    assert!(baseline.replications.is_none());

    let drain = SimulationConfig::load(dir.join("drain_sweep.toml")).unwrap();
    assert_eq!(drain.simulation.policy, GatePolicy::OpenGate);
    assert_eq!(drain.replications.map(|r| r.count), Some(500));
}

#[test]
fn missing_config_file_is_an_io_error() {
    let result = SimulationConfig::load("/definitely/not/here.toml");
    assert!(matches!(result, Err(car_wash::ConfigError::Io(_))));
}
