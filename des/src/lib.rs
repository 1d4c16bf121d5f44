//! Minimal discrete-event engine
//!
//! An [`EventLoop`] owns a min-heap of timestamped events and a set of
//! [`Agent`]s. Every popped event is broadcast to every agent and the events
//! an agent responds with are scheduled. Once the queue is empty,
//! [`EventLoop::stats`] collects one `S` from every agent.

pub mod parallel;

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use tracing::warn;

struct Event<T> {
    t: usize,
    // insertion order, so events sharing a timestamp pop first-in first-out
    seq: usize,
    data: T,
}

impl<T> PartialEq for Event<T> {
    fn eq(&self, other: &Self) -> bool {
        self.t == other.t && self.seq == other.seq
    }
}

impl<T> Eq for Event<T> {}

impl<T> Ord for Event<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .t
            .cmp(&self.t)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl<T> PartialOrd for Event<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Events an agent wants scheduled after acting on an event
pub struct Response<T> {
    pub events: Vec<(usize, T)>,
}

impl<T> Response<T> {
    pub fn new() -> Response<T> {
        Response { events: Vec::new() }
    }

    /// Schedule a single event
    pub fn event(t: usize, data: T) -> Response<T> {
        Response {
            events: vec![(t, data)],
        }
    }
}

impl<T> Default for Response<T> {
    fn default() -> Self {
        Response::new()
    }
}

pub trait Agent<T, S> {
    fn act(&mut self, _current_t: usize, _data: &T) -> Response<T> {
        Response::new()
    }

    fn stats(&self) -> S;
}

pub struct EventLoop<T, S> {
    queue: BinaryHeap<Event<T>>,
    next_seq: usize,
    current_t: usize,
    agents: Vec<Box<dyn Agent<T, S>>>,
}

impl<T, S> EventLoop<T, S> {
    pub fn new(events: Vec<(usize, T)>, agents: Vec<Box<dyn Agent<T, S>>>) -> EventLoop<T, S> {
        let mut event_loop = EventLoop {
            queue: BinaryHeap::with_capacity(events.len()),
            next_seq: 0,
            current_t: 0,
            agents,
        };
        for (t, data) in events {
            event_loop.schedule(t, data);
        }
        event_loop
    }

    fn schedule(&mut self, t: usize, data: T) {
        self.queue.push(Event {
            t,
            seq: self.next_seq,
            data,
        });
        self.next_seq += 1;
    }

    fn broadcast(&mut self) {
        let Some(event) = self.queue.pop() else {
            return;
        };
        self.current_t = event.t;

        let mut scheduled = Vec::new();
        for agent in &mut self.agents {
            scheduled.extend(agent.act(self.current_t, &event.data).events);
        }

        for (t, data) in scheduled {
            if t < self.current_t {
                warn!(t, current_t = self.current_t, "dropping event scheduled in the past");
                continue;
            }
            self.schedule(t, data);
        }
    }

    /// Process events in time order until the queue is empty
    pub fn run(&mut self) {
        while !self.queue.is_empty() {
            self.broadcast();
        }
    }

    /// Timestamp of the most recently processed event
    pub fn current_t(&self) -> usize {
        self.current_t
    }

    /// Number of events still waiting to be processed
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn stats(&self) -> Vec<S> {
        self.agents.iter().map(|agent| agent.stats()).collect()
    }
}
