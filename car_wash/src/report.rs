//! Where results go: the console report and file export

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use serde::Serialize;

use crate::error::OutputError;
use crate::experiment::ReplicationOutcome;
use crate::params::{GatePolicy, ValidatedParams};
use crate::simulator::SimulationReport;

/// Consumer of a run's parameters (before it starts) and results (after)
pub trait ReportSink {
    fn parameters(&mut self, params: &ValidatedParams) -> Result<(), OutputError>;

    fn results(
        &mut self,
        params: &ValidatedParams,
        report: &SimulationReport,
    ) -> Result<(), OutputError>;
}

/// Plain-text report in the wording of the classic car wash exercise
pub struct ConsoleReport<W: Write> {
    out: W,
}

impl ConsoleReport<io::Stdout> {
    pub fn stdout() -> Self {
        ConsoleReport { out: io::stdout() }
    }
}

impl<W: Write> ConsoleReport<W> {
    pub fn new(out: W) -> Self {
        ConsoleReport { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ReportSink for ConsoleReport<W> {
    fn parameters(&mut self, params: &ValidatedParams) -> Result<(), OutputError> {
        writeln!(self.out, "Seconds to wash one car: {}", params.service_duration)?;
        writeln!(
            self.out,
            "Probability of customer arrival during a second: {}",
            params.arrival_probability
        )?;
        match params.policy {
            GatePolicy::ClosedGate => {
                writeln!(self.out, "Total simulation seconds: {}", params.total_duration)?
            }
            GatePolicy::OpenGate => writeln!(
                self.out,
                "Total simulation seconds (open \"hours\"): {}",
                params.total_duration
            )?,
        }
        Ok(())
    }

    fn results(
        &mut self,
        params: &ValidatedParams,
        report: &SimulationReport,
    ) -> Result<(), OutputError> {
        writeln!(self.out, "Customers served: {}", report.customers_served)?;
        if let Some(average_wait) = report.average_wait {
            writeln!(self.out, "Average wait: {} sec", average_wait)?;
        }
        if params.policy == GatePolicy::OpenGate {
            writeln!(
                self.out,
                "Ending second (or last customer served): {}",
                report.ending_tick
            )?;
        }
        self.out.flush()?;
        Ok(())
    }
}

/// Pretty-printed JSON
pub fn write_json<T: Serialize, P: AsRef<Path>>(value: &T, path: P) -> Result<(), OutputError> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json)?;
    Ok(())
}

/// One CSV row per replication
pub fn write_replications_csv<P: AsRef<Path>>(
    outcomes: &[ReplicationOutcome],
    path: P,
) -> Result<(), OutputError> {
    let mut writer = csv::Writer::from_path(path)?;
    for outcome in outcomes {
        writer.serialize(outcome)?;
    }
    writer.flush()?;
    Ok(())
}
