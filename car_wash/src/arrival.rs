//! Sources of customer arrivals
//!
//! The simulator asks its source exactly once per tick, so the `n`th query is
//! the question "did a customer arrive during tick `n`?".

use std::collections::HashSet;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Bernoulli, Distribution};

use crate::error::SimulationError;

pub trait ArrivalSource {
    fn query(&mut self) -> bool;
}

impl<A: ArrivalSource + ?Sized> ArrivalSource for Box<A> {
    fn query(&mut self) -> bool {
        (**self).query()
    }
}

/// Independent arrivals with a fixed per-tick probability
#[derive(Debug, Clone)]
pub struct BernoulliArrivals {
    distribution: Bernoulli,
    rng: StdRng,
}

impl BernoulliArrivals {
    pub fn new(distribution: Bernoulli, rng: StdRng) -> BernoulliArrivals {
        BernoulliArrivals { distribution, rng }
    }

    /// Reproducible stream for a given seed
    pub fn seeded(probability: f64, seed: u64) -> Result<BernoulliArrivals, SimulationError> {
        Ok(BernoulliArrivals::new(
            bernoulli(probability)?,
            StdRng::seed_from_u64(seed),
        ))
    }

    pub fn from_entropy(probability: f64) -> Result<BernoulliArrivals, SimulationError> {
        Ok(BernoulliArrivals::new(
            bernoulli(probability)?,
            StdRng::from_os_rng(),
        ))
    }
}

pub(crate) fn bernoulli(probability: f64) -> Result<Bernoulli, SimulationError> {
    Bernoulli::new(probability).map_err(|_| {
        SimulationError::invalid(format!(
            "arrival probability must lie in [0, 1], got {probability}"
        ))
    })
}

impl ArrivalSource for BernoulliArrivals {
    fn query(&mut self) -> bool {
        self.distribution.sample(&mut self.rng)
    }
}

/// Arrivals on a fixed set of query indices (ticks)
#[derive(Debug, Clone, Default)]
pub struct ScriptedArrivals {
    arrivals: HashSet<usize>,
    queries: usize,
}

impl ScriptedArrivals {
    pub fn new(arrival_ticks: impl IntoIterator<Item = usize>) -> ScriptedArrivals {
        ScriptedArrivals {
            arrivals: arrival_ticks.into_iter().collect(),
            queries: 0,
        }
    }

    /// A customer on every tick
    pub fn every_tick(ticks: usize) -> ScriptedArrivals {
        ScriptedArrivals::new(0..ticks)
    }

    /// How many times the source has been asked so far
    pub fn queries(&self) -> usize {
        self.queries
    }
}

impl ArrivalSource for ScriptedArrivals {
    fn query(&mut self) -> bool {
        let arrived = self.arrivals.contains(&self.queries);
        self.queries += 1;
        arrived
    }
}
