//! Car wash simulation CLI
//!
//! ```bash
//! # Reference run: 240 s washes, p = 0.0025, 6000 s
//! car_wash
//!
//! # Keep washing after closing until the queue drains
//! car_wash --policy open-gate --seed 7
//!
//! # 1000 seeded replications on 8 threads, summary to JSON
//! car_wash --replications 1000 --threads 8 --summary-json summary.json
//!
//! # Parameters from a file, with a flag override
//! car_wash --config experiments/baseline.toml --total-time 3600
//! ```

use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

use car_wash::report::{write_json, write_replications_csv};
use car_wash::{
    ConsoleReport, GatePolicy, ReplicationSettings, ReplicationSummary, SimulationConfig,
    Simulator, run_replications,
};
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Single-bay car wash queue simulation
#[derive(Parser, Debug)]
#[command(name = "car_wash")]
#[command(version, about, long_about = None)]
struct Args {
    /// TOML config file; flags override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Seconds needed to wash one car [default: 240]
    #[arg(short = 'w', long, allow_negative_numbers = true)]
    wash_time: Option<i64>,

    /// Probability of a customer arriving in any second [default: 0.0025]
    #[arg(short = 'p', long, allow_negative_numbers = true)]
    arrival_prob: Option<f64>,

    /// Closing time in seconds [default: 6000]
    #[arg(short = 't', long, allow_negative_numbers = true)]
    total_time: Option<i64>,

    /// closed-gate stops at closing time, open-gate drains the queue first
    #[arg(long)]
    policy: Option<GatePolicy>,

    /// Seed for a single run, or the base seed for replications.
    /// When omitted a single run is seeded from the OS.
    #[arg(long)]
    seed: Option<u64>,

    /// Run this many seeded replications and report summary statistics
    #[arg(short = 'r', long)]
    replications: Option<usize>,

    /// Worker threads for replications (defaults to one per core)
    #[arg(long)]
    threads: Option<usize>,

    /// Write the run report or replication summary as JSON
    #[arg(long)]
    summary_json: Option<PathBuf>,

    /// Write one CSV row per replication
    #[arg(long)]
    csv: Option<PathBuf>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,car_wash=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let mut config = match &args.config {
        Some(path) => {
            info!(path = %path.display(), "loading config");
            SimulationConfig::load(path)?
        }
        None => SimulationConfig::default(),
    };

    let params = &mut config.simulation;
    if let Some(wash_time) = args.wash_time {
        params.service_duration = wash_time;
    }
    if let Some(arrival_prob) = args.arrival_prob {
        params.arrival_probability = arrival_prob;
    }
    if let Some(total_time) = args.total_time {
        params.total_duration = total_time;
    }
    if let Some(policy) = args.policy {
        params.policy = policy;
    }

    if args.replications.is_some() || config.replications.is_some() {
        let mut settings = config.replications.unwrap_or_default();
        if let Some(count) = args.replications {
            settings.count = count;
        }
        if let Some(seed) = args.seed.or(config.seed) {
            settings.base_seed = seed;
        }
        if args.threads.is_some() {
            settings.threads = args.threads;
        }
        return run_batch(&config, &settings, &args);
    }

    let ignored = batch_only_flags(&args);
    if !ignored.is_empty() {
        warn!(flags = ?ignored, "ignored without --replications or a [replications] table");
    }

    let simulator = match args.seed.or(config.seed) {
        Some(seed) => Simulator::seeded(&config.simulation, seed)?,
        None => Simulator::from_entropy(&config.simulation)?,
    };
    let report = simulator.run_with(&mut ConsoleReport::stdout())?;

    if let Some(path) = &args.summary_json {
        write_json(&report, path)?;
        info!(path = %path.display(), "wrote run report");
    }
    Ok(())
}

/// Flags that only mean something when running replications
fn batch_only_flags(args: &Args) -> Vec<&'static str> {
    let mut flags = Vec::new();
    if args.csv.is_some() {
        flags.push("--csv");
    }
    if args.threads.is_some() {
        flags.push("--threads");
    }
    flags
}

fn run_batch(
    config: &SimulationConfig,
    settings: &ReplicationSettings,
    args: &Args,
) -> Result<(), Box<dyn Error>> {
    let summary = run_replications(&config.simulation, settings)?;
    print_summary(&summary);

    if let Some(path) = &args.summary_json {
        write_json(&summary, path)?;
        info!(path = %path.display(), "wrote replication summary");
    }
    if let Some(path) = &args.csv {
        write_replications_csv(&summary.outcomes, path)?;
        info!(path = %path.display(), rows = summary.outcomes.len(), "wrote replications");
    }
    Ok(())
}

fn print_summary(summary: &ReplicationSummary) {
    let params = &summary.params;
    println!("Seconds to wash one car: {}", params.service_duration);
    println!(
        "Probability of customer arrival during a second: {}",
        params.arrival_probability
    );
    println!("Total simulation seconds: {}", params.total_duration);
    println!("Policy: {}", params.policy);
    println!();
    println!(
        "Replications: {} (base seed {}, {} failed)",
        summary.runs, summary.base_seed, summary.failed_runs
    );
    println!(
        "  Customers served: {:.2} ± {:.2} (min {}, max {})",
        summary.customers_served.mean,
        summary.customers_served.std,
        summary.customers_served.min,
        summary.customers_served.max
    );
    if summary.average_wait.n > 0 {
        println!(
            "  Average wait: {:.2} ± {:.2} sec (over {} runs with customers)",
            summary.average_wait.mean, summary.average_wait.std, summary.average_wait.n
        );
    }
    match params.policy {
        GatePolicy::ClosedGate => println!(
            "  Left in queue at closing: {:.2} ± {:.2}",
            summary.left_in_queue.mean, summary.left_in_queue.std
        ),
        GatePolicy::OpenGate => println!(
            "  Ending second: {:.1} ± {:.1} (max {})",
            summary.ending_tick.mean, summary.ending_tick.std, summary.ending_tick.max
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(argv: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("car_wash").chain(argv.iter().copied())).unwrap()
    }

    #[test]
    fn batch_only_flags_are_reported() {
        assert_eq!(
            batch_only_flags(&args(&["--csv", "runs.csv", "--threads", "4"])),
            vec!["--csv", "--threads"]
        );
        assert!(batch_only_flags(&args(&["--seed", "7", "--summary-json", "run.json"])).is_empty());
    }

    #[test]
    fn negative_durations_reach_validation() {
        let parsed = args(&["--wash-time", "-5", "--total-time", "-1"]);
        assert_eq!(parsed.wash_time, Some(-5));
        assert_eq!(parsed.total_time, Some(-1));
    }

    #[test]
    fn policy_flag_uses_cli_spellings() {
        assert_eq!(args(&["--policy", "open-gate"]).policy, Some(GatePolicy::OpenGate));
        assert!(Args::try_parse_from(["car_wash", "--policy", "drain"]).is_err());
    }
}
