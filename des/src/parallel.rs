//! Run independent [`EventLoop`] scenarios side by side on a rayon pool
//!
//! Each scenario is built from its index by a caller-supplied closure, run
//! until its queue is empty on a worker thread, and reduced to the stats of
//! its agents. Results come back in scenario order.
//!
//! ```rust
//! use des::parallel::ParallelRunner;
//! # use des::{Agent, EventLoop};
//! # struct Fixed(usize);
//! # impl Agent<u8, usize> for Fixed {
//! #     fn stats(&self) -> usize { self.0 }
//! # }
//!
//! let results = ParallelRunner::new(16, |scenario_id| {
//!     let agents: Vec<Box<dyn Agent<u8, usize>>> = vec![Box::new(Fixed(scenario_id))];
//!     EventLoop::new(vec![(0, 1)], agents)
//! })
//! .num_threads(4)
//! .run();
//!
//! assert_eq!(results[3], Ok(vec![3]));
//! ```
//!
//! Results do not depend on the thread count as long as every scenario
//! derives its randomness from `scenario_id` (for example
//! `StdRng::seed_from_u64(base_seed + scenario_id as u64)`) and scenarios
//! share no mutable state.
//!
//! A panic inside one scenario is caught and reported as `Err(message)` for
//! that scenario only.

use crate::EventLoop;
use rayon::prelude::*;
use std::any::Any;
use std::marker::PhantomData;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{info, warn};

type ProgressCallback = Arc<dyn Fn(usize, usize) + Send + Sync>;

pub struct ParallelRunner<T, S, F>
where
    F: Fn(usize) -> EventLoop<T, S> + Send + Sync,
    S: Send,
{
    num_scenarios: usize,
    builder: F,
    num_threads: Option<usize>,
    progress_callback: Option<ProgressCallback>,
    _scenario: PhantomData<fn() -> (T, S)>,
}

impl<T, S, F> ParallelRunner<T, S, F>
where
    F: Fn(usize) -> EventLoop<T, S> + Send + Sync,
    S: Send,
{
    /// `builder` creates a fresh loop for each scenario index in
    /// `0..num_scenarios`
    pub fn new(num_scenarios: usize, builder: F) -> Self {
        ParallelRunner {
            num_scenarios,
            builder,
            num_threads: None,
            progress_callback: None,
            _scenario: PhantomData,
        }
    }

    /// Use a dedicated pool with `n` threads instead of rayon's global pool
    pub fn num_threads(mut self, n: usize) -> Self {
        self.num_threads = Some(n);
        self
    }

    /// Called with `(completed, total)` after every scenario finishes
    pub fn progress<P>(mut self, callback: P) -> Self
    where
        P: Fn(usize, usize) + Send + Sync + 'static,
    {
        self.progress_callback = Some(Arc::new(callback));
        self
    }

    /// Run every scenario to completion and return the per-agent stats of
    /// each, in scenario order
    pub fn run(self) -> Vec<Result<Vec<S>, String>> {
        let completed = AtomicUsize::new(0);

        let execute = || {
            (0..self.num_scenarios)
                .into_par_iter()
                .map(|scenario_id| {
                    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                        let mut event_loop = (self.builder)(scenario_id);
                        event_loop.run();
                        event_loop.stats()
                    }));

                    let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                    if let Some(callback) = &self.progress_callback {
                        callback(done, self.num_scenarios);
                    }

                    result.map_err(panic_message)
                })
                .collect()
        };

        let pool = self.num_threads.and_then(|n| {
            rayon::ThreadPoolBuilder::new()
                .num_threads(n)
                .build()
                .map_err(|e| warn!(threads = n, error = %e, "falling back to global rayon pool"))
                .ok()
        });

        match pool {
            Some(pool) => pool.install(execute),
            None => execute(),
        }
    }
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

/// Progress callback that logs every `interval` completed scenarios and at
/// the end
pub fn log_progress(interval: usize) -> impl Fn(usize, usize) + Send + Sync {
    let interval = interval.max(1);
    move |completed, total| {
        if completed % interval == 0 || completed == total {
            info!(completed, total, "scenarios finished");
        }
    }
}
