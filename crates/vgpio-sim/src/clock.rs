//! Bench clock

use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::watch;
use vgpio_sync::ClockEdges;

/// Rising-edge source. Edges are counted from 1; the count is 0 before the
/// first edge.
#[derive(Debug)]
pub struct SimClock {
    name: String,
    period: Duration,
    edges: watch::Sender<u64>,
}

impl SimClock {
    pub fn new(name: impl Into<String>, period_ns: u64) -> Self {
        let (edges, _) = watch::channel(0);
        SimClock {
            name: name.into(),
            period: Duration::from_nanos(period_ns),
            edges,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Rising edges elapsed so far
    pub fn edges(&self) -> u64 {
        *self.edges.borrow()
    }

    /// Simulated time of the latest edge in nanoseconds
    pub fn now_ns(&self) -> u128 {
        u128::from(self.edges()) * self.period.as_nanos()
    }

    /// Wait for `count` rising edges
    pub async fn cycles(&self, count: u64) {
        for _ in 0..count {
            self.rising_edge().await;
        }
    }

    /// Publish the next rising edge and return its number
    pub(crate) fn tick(&self) -> u64 {
        self.edges.send_modify(|edge| *edge += 1);
        self.edges()
    }
}

#[async_trait(?Send)]
impl ClockEdges for SimClock {
    async fn rising_edge(&self) {
        let mut rx = self.edges.subscribe();
        // The sender lives as long as `self`, so this only returns on an edge.
        let _ = rx.changed().await;
    }
}
