//! Car wash: a single-server queue simulated one logical second at a time
//!
//! Each tick a customer may arrive (Bernoulli with probability `p`) and join
//! a FIFO queue. Whenever the single washer is idle, the customer at the head
//! of the queue starts a wash of fixed length and their wait is recorded.
//!
//! Two closing-time behaviours are available through [`GatePolicy`]:
//! - `ClosedGate`: stop after exactly `total_duration` ticks, leaving anyone
//!   still queued unserved.
//! - `OpenGate`: take arrivals up to `total_duration`, then keep washing until
//!   the queue is empty and report the tick the wash actually stopped.
//!
//! Randomness lives only in the [`ArrivalSource`], so a run is reproducible
//! from a seed, and tests can script arrivals exactly.

pub mod arrival;
pub mod averager;
pub mod error;
pub mod experiment;
pub mod params;
pub mod report;
pub mod simulator;
pub mod washer;

pub use arrival::{ArrivalSource, BernoulliArrivals, ScriptedArrivals};
pub use averager::Averager;
pub use error::{ConfigError, EmptyAccumulator, OutputError, SimulationError};
pub use experiment::{MeanStd, ReplicationOutcome, ReplicationSummary, run_replications};
pub use params::{GatePolicy, Params, ReplicationSettings, SimulationConfig, ValidatedParams};
pub use report::{ConsoleReport, ReportSink};
pub use simulator::{CarWash, SimulationReport, Simulator};
pub use washer::Washer;

/// Events on the car wash's event loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// One logical second passes
    Tick,
}
