//! The tick loop
//!
//! [`CarWash`] is a `des` agent that handles one [`Event::Tick`] per logical
//! second and schedules the next tick for as long as its gate policy keeps
//! the wash running. [`Simulator`] validates parameters, wires the agent into
//! an [`EventLoop`] and hands back the final [`SimulationReport`].

use std::collections::VecDeque;

use des::{Agent, EventLoop, Response};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use crate::arrival::{ArrivalSource, BernoulliArrivals};
use crate::averager::Averager;
use crate::error::{OutputError, SimulationError};
use crate::params::{GatePolicy, Params, ValidatedParams};
use crate::report::ReportSink;
use crate::washer::Washer;
use crate::Event;

/// Outcome of one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationReport {
    pub customers_served: usize,
    /// `None` when nobody was served
    pub average_wait: Option<f64>,
    /// First tick that was not simulated
    pub ending_tick: usize,
    /// Customers that joined the queue
    pub arrivals: usize,
    /// Customers still queued when the wash stopped
    pub left_in_queue: usize,
}

pub struct CarWash<A> {
    params: ValidatedParams,
    arrivals: A,
    arrival_times: VecDeque<usize>,
    washer: Washer,
    wait_times: Averager,
    current_tick: usize,
    arrival_count: usize,
}

impl<A: ArrivalSource> CarWash<A> {
    pub fn new(params: ValidatedParams, arrivals: A) -> CarWash<A> {
        CarWash {
            params,
            arrivals,
            arrival_times: VecDeque::new(),
            washer: Washer::new(params.service_duration),
            wait_times: Averager::new(),
            current_tick: 0,
            arrival_count: 0,
        }
    }

    /// Whether the loop executes tick `tick`
    pub fn keeps_running(&self, tick: usize) -> bool {
        match self.params.policy {
            GatePolicy::ClosedGate => tick < self.params.total_duration,
            GatePolicy::OpenGate => {
                tick < self.params.total_duration || !self.arrival_times.is_empty()
            }
        }
    }

    fn admits_arrivals(&self, tick: usize) -> bool {
        match self.params.policy {
            GatePolicy::ClosedGate => true,
            GatePolicy::OpenGate => tick <= self.params.total_duration,
        }
    }

    /// Simulate one second
    pub fn step(&mut self) {
        let tick = self.current_tick;

        if self.arrivals.query() && self.admits_arrivals(tick) {
            trace!(tick, queued = self.arrival_times.len(), "customer arrived");
            self.arrival_times.push_back(tick);
            self.arrival_count += 1;
        }

        if !self.washer.is_busy() {
            if let Some(arrived) = self.arrival_times.pop_front() {
                let wait = tick - arrived;
                debug!(tick, arrived, wait, "washing next car");
                self.wait_times.record(wait as f64);
                self.washer.start_washing();
            }
        }

        self.washer.tick();
        self.current_tick += 1;
    }

    /// Tick that will be simulated next
    pub fn current_tick(&self) -> usize {
        self.current_tick
    }

    pub fn queue_len(&self) -> usize {
        self.arrival_times.len()
    }

    pub fn washer(&self) -> &Washer {
        &self.washer
    }

    pub fn report(&self) -> SimulationReport {
        SimulationReport {
            customers_served: self.wait_times.count(),
            average_wait: self.wait_times.mean().ok(),
            ending_tick: self.current_tick,
            arrivals: self.arrival_count,
            left_in_queue: self.arrival_times.len(),
        }
    }
}

impl<A: ArrivalSource> Agent<Event, SimulationReport> for CarWash<A> {
    fn act(&mut self, current_t: usize, data: &Event) -> Response<Event> {
        match data {
            Event::Tick => {
                debug_assert_eq!(current_t, self.current_tick);
                self.step();
                if self.keeps_running(self.current_tick) {
                    Response::event(self.current_tick, Event::Tick)
                } else {
                    Response::new()
                }
            }
        }
    }

    fn stats(&self) -> SimulationReport {
        self.report()
    }
}

/// Build the event loop for one run: a single car wash and, if the policy
/// runs tick 0 at all, the first tick
pub fn build_event_loop<A>(
    params: ValidatedParams,
    arrivals: A,
) -> EventLoop<Event, SimulationReport>
where
    A: ArrivalSource + 'static,
{
    let car_wash = CarWash::new(params, arrivals);
    let initial_events = if car_wash.keeps_running(0) {
        vec![(0, Event::Tick)]
    } else {
        Vec::new()
    };
    let agents: Vec<Box<dyn Agent<Event, SimulationReport>>> = vec![Box::new(car_wash)];
    EventLoop::new(initial_events, agents)
}

pub struct Simulator<A> {
    params: ValidatedParams,
    arrivals: A,
}

impl Simulator<BernoulliArrivals> {
    /// Arrivals drawn at `params.arrival_probability` from a `StdRng` seeded
    /// with `seed`
    pub fn seeded(params: &Params, seed: u64) -> Result<Self, SimulationError> {
        Self::with_rng(params, StdRng::seed_from_u64(seed))
    }

    /// Arrivals drawn at `params.arrival_probability` from an OS-seeded
    /// `StdRng`
    pub fn from_entropy(params: &Params) -> Result<Self, SimulationError> {
        Self::with_rng(params, StdRng::from_os_rng())
    }

    fn with_rng(params: &Params, rng: StdRng) -> Result<Self, SimulationError> {
        let params = params.validate()?;
        let arrivals = BernoulliArrivals::new(params.arrival_distribution(), rng);
        Ok(Simulator { params, arrivals })
    }
}

impl<A: ArrivalSource + 'static> Simulator<A> {
    pub fn new(params: &Params, arrivals: A) -> Result<Simulator<A>, SimulationError> {
        Ok(Simulator {
            params: params.validate()?,
            arrivals,
        })
    }

    pub fn params(&self) -> &ValidatedParams {
        &self.params
    }

    pub fn run(self) -> SimulationReport {
        info!(
            service_duration = self.params.service_duration,
            arrival_probability = self.params.arrival_probability,
            total_duration = self.params.total_duration,
            policy = %self.params.policy,
            "starting car wash simulation"
        );

        let mut event_loop = build_event_loop(self.params, self.arrivals);
        event_loop.run();
        let report = event_loop
            .stats()
            .pop()
            .expect("event loop holds exactly one car wash");

        info!(
            customers_served = report.customers_served,
            average_wait = ?report.average_wait,
            ending_tick = report.ending_tick,
            left_in_queue = report.left_in_queue,
            "car wash simulation finished"
        );
        report
    }

    /// Echo the parameters to `sink`, run, then hand it the results
    pub fn run_with<R: ReportSink + ?Sized>(
        self,
        sink: &mut R,
    ) -> Result<SimulationReport, OutputError> {
        let params = self.params;
        sink.parameters(&params)?;
        let report = self.run();
        sink.results(&params, &report)?;
        Ok(report)
    }
}
