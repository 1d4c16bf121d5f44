//! Monte Carlo replications of one parameter set
//!
//! Replication `i` runs with its own `StdRng` seeded from `base_seed + i`, so
//! a summary depends only on the parameters and the base seed, never on how
//! many threads ran it.

use des::parallel::{ParallelRunner, log_progress};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::arrival::BernoulliArrivals;
use crate::error::SimulationError;
use crate::params::{Params, ReplicationSettings, ValidatedParams};
use crate::simulator::{SimulationReport, build_event_loop};

/// Flat per-replication record, one CSV row each
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplicationOutcome {
    pub replication: usize,
    pub seed: u64,
    pub customers_served: usize,
    pub average_wait: Option<f64>,
    pub ending_tick: usize,
    pub arrivals: usize,
    pub left_in_queue: usize,
}

impl ReplicationOutcome {
    pub fn new(replication: usize, seed: u64, report: &SimulationReport) -> Self {
        ReplicationOutcome {
            replication,
            seed,
            customers_served: report.customers_served,
            average_wait: report.average_wait,
            ending_tick: report.ending_tick,
            arrivals: report.arrivals,
            left_in_queue: report.left_in_queue,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeanStd {
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
    /// Number of values summarised
    pub n: usize,
}

impl MeanStd {
    /// Population statistics; all zero for an empty slice
    pub fn from_values(values: &[f64]) -> MeanStd {
        if values.is_empty() {
            return MeanStd {
                mean: 0.0,
                std: 0.0,
                min: 0.0,
                max: 0.0,
                n: 0,
            };
        }

        let n = values.len();
        let mean = values.iter().sum::<f64>() / n as f64;
        let variance = values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n as f64;
        MeanStd {
            mean,
            std: variance.sqrt(),
            min: values.iter().copied().fold(f64::INFINITY, f64::min),
            max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            n,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplicationSummary {
    pub params: ValidatedParams,
    pub base_seed: u64,
    pub runs: usize,
    pub failed_runs: usize,
    pub customers_served: MeanStd,
    /// Over the runs that served at least one customer
    pub average_wait: MeanStd,
    pub ending_tick: MeanStd,
    pub left_in_queue: MeanStd,
    #[serde(skip)]
    pub outcomes: Vec<ReplicationOutcome>,
}

impl ReplicationSummary {
    fn from_outcomes(
        params: ValidatedParams,
        base_seed: u64,
        runs: usize,
        outcomes: Vec<ReplicationOutcome>,
    ) -> Self {
        let column = |f: fn(&ReplicationOutcome) -> f64| -> Vec<f64> {
            outcomes.iter().map(f).collect()
        };
        let waits: Vec<f64> = outcomes.iter().filter_map(|o| o.average_wait).collect();

        ReplicationSummary {
            params,
            base_seed,
            runs,
            failed_runs: runs - outcomes.len(),
            customers_served: MeanStd::from_values(&column(|o| o.customers_served as f64)),
            average_wait: MeanStd::from_values(&waits),
            ending_tick: MeanStd::from_values(&column(|o| o.ending_tick as f64)),
            left_in_queue: MeanStd::from_values(&column(|o| o.left_in_queue as f64)),
            outcomes,
        }
    }
}

pub fn replication_seed(base_seed: u64, replication: usize) -> u64 {
    base_seed.wrapping_add(replication as u64)
}

pub fn run_replications(
    params: &Params,
    settings: &ReplicationSettings,
) -> Result<ReplicationSummary, SimulationError> {
    let validated = params.validate()?;
    let distribution = validated.arrival_distribution();
    let base_seed = settings.base_seed;

    info!(
        replications = settings.count,
        base_seed,
        threads = ?settings.threads,
        policy = %validated.policy,
        "running replications"
    );

    let mut runner = ParallelRunner::new(settings.count, move |replication| {
        let rng = StdRng::seed_from_u64(replication_seed(base_seed, replication));
        build_event_loop(validated, BernoulliArrivals::new(distribution, rng))
    })
    .progress(log_progress((settings.count / 10).max(1)));
    if let Some(threads) = settings.threads {
        runner = runner.num_threads(threads);
    }

    let outcomes: Vec<ReplicationOutcome> = runner
        .run()
        .into_iter()
        .enumerate()
        .filter_map(|(replication, result)| match result {
            Ok(mut reports) => reports.pop().map(|report| {
                ReplicationOutcome::new(
                    replication,
                    replication_seed(base_seed, replication),
                    &report,
                )
            }),
            Err(message) => {
                warn!(replication, %message, "replication failed");
                None
            }
        })
        .collect();

    Ok(ReplicationSummary::from_outcomes(
        validated,
        base_seed,
        settings.count,
        outcomes,
    ))
}
