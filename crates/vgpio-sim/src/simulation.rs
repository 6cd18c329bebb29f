//! Bench run loop

use crate::clock::SimClock;
use crate::error::{SimError, SimResult};
use crate::signal::SimSignal;
use crate::value::LogicValue;
use indexmap::IndexMap;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::future::Future;
use std::rc::Rc;
use tokio::runtime::{Builder, Runtime};
use tokio::task::LocalSet;
use tracing::{debug, trace};
use vgpio_sync::SignalHandle;

/// Configuration for a bench run
#[derive(Debug, Clone)]
pub struct SimConfig {
    pub clock_name: String,
    pub clock_period_ns: u64,
    /// Rising edges after which an unfinished test is abandoned
    pub cycle_limit: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        SimConfig {
            clock_name: "clk".to_string(),
            clock_period_ns: 25,
            cycle_limit: 1_000_000,
        }
    }
}

type Stimulus = Vec<(Rc<SimSignal>, LogicValue)>;

/// Signals, clock and stimulus schedule of one test run
pub struct Simulation {
    config: SimConfig,
    clock: Rc<SimClock>,
    signals: RefCell<IndexMap<String, Rc<SimSignal>>>,
    schedule: RefCell<BTreeMap<u64, Stimulus>>,
}

impl Simulation {
    pub fn new(config: SimConfig) -> Self {
        let clock = Rc::new(SimClock::new(
            config.clock_name.clone(),
            config.clock_period_ns,
        ));
        Simulation {
            config,
            clock,
            signals: RefCell::new(IndexMap::new()),
            schedule: RefCell::new(BTreeMap::new()),
        }
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn clock(&self) -> Rc<SimClock> {
        self.clock.clone()
    }

    /// Rising edges elapsed so far
    pub fn edges(&self) -> u64 {
        self.clock.edges()
    }

    pub fn add_signal(
        &self,
        name: impl Into<String>,
        initial: LogicValue,
    ) -> SimResult<Rc<SimSignal>> {
        let name = name.into();
        let mut signals = self.signals.borrow_mut();
        if signals.contains_key(&name) {
            return Err(SimError::DuplicateSignal(name));
        }
        let signal = Rc::new(SimSignal::new(name.clone(), initial));
        signals.insert(name, signal.clone());
        Ok(signal)
    }

    /// Look up a registered signal by name
    pub fn signal(&self, name: &str) -> SimResult<Rc<SimSignal>> {
        self.signals
            .borrow()
            .get(name)
            .cloned()
            .ok_or_else(|| SimError::UnknownSignal(name.to_string()))
    }

    /// Drive `value` onto `signal` at rising edge `edge`, before the edge is
    /// published. Edges that have already elapsed are driven immediately.
    pub fn schedule(&self, edge: u64, signal: &Rc<SimSignal>, value: LogicValue) {
        if edge <= self.edges() {
            signal.drive(value);
            return;
        }
        self.schedule
            .borrow_mut()
            .entry(edge)
            .or_default()
            .push((signal.clone(), value));
    }

    /// Run `test` against the clock until it finishes or the cycle limit
    /// elapses.
    ///
    /// Must be awaited on a paused current-thread runtime (see [`runtime`]) so
    /// that time only moves once every task is idle.
    pub async fn run<F: Future>(&self, test: F) -> SimResult<F::Output> {
        debug!(
            clock = self.clock.name(),
            limit = self.config.cycle_limit,
            "simulation started"
        );
        tokio::select! {
            biased;
            output = test => {
                debug!(edges = self.edges(), "simulation finished");
                Ok(output)
            }
            limit = self.drive() => Err(SimError::CycleLimit { limit }),
        }
    }

    async fn drive(&self) -> u64 {
        while self.clock.edges() < self.config.cycle_limit {
            tokio::time::sleep(self.clock.period()).await;
            let edge = self.clock.edges() + 1;
            self.apply_due(edge);
            self.clock.tick();
        }
        // Let the test observe the final edge before it is abandoned.
        tokio::task::yield_now().await;
        self.config.cycle_limit
    }

    fn apply_due(&self, edge: u64) {
        let due = self.schedule.borrow_mut().remove(&edge);
        for (signal, value) in due.into_iter().flatten() {
            if signal.drive(value) {
                trace!(edge, signal = signal.name(), "stimulus applied");
            }
        }
    }
}

/// Build the paused current-thread runtime benches run on
pub fn runtime() -> std::io::Result<Runtime> {
    Builder::new_current_thread()
        .enable_time()
        .start_paused(true)
        .build()
}

/// Run `future` inside a `LocalSet` on a fresh bench runtime
pub fn block_on<F: Future>(future: F) -> SimResult<F::Output> {
    let runtime = runtime()?;
    let local = LocalSet::new();
    Ok(local.block_on(&runtime, future))
}

#[cfg(test)]
mod tests {
    use super::*;
    use vgpio_sync::ClockEdges;

    #[test]
    fn test_duplicate_signal_rejected() {
        let sim = Simulation::new(SimConfig::default());
        sim.add_signal("la_data_in", LogicValue::zeros(128)).unwrap();
        assert!(matches!(
            sim.add_signal("la_data_in", LogicValue::zeros(128)),
            Err(SimError::DuplicateSignal(_))
        ));
        assert_eq!(sim.signal("la_data_in").unwrap().width(), 128);
        assert!(matches!(
            sim.signal("la_data_out"),
            Err(SimError::UnknownSignal(_))
        ));
    }

    #[test]
    fn test_stimulus_visible_on_its_edge() {
        let seen = block_on(async {
            let sim = Simulation::new(SimConfig::default());
            let bus = sim.add_signal("bus", LogicValue::zeros(8)).unwrap();
            sim.schedule(3, &bus, LogicValue::from_u64(8, 7));
            sim.run(async {
                let clock = sim.clock();
                let mut seen = Vec::new();
                for _ in 0..4 {
                    clock.rising_edge().await;
                    seen.push((clock.edges(), bus.value()));
                }
                seen
            })
            .await
        })
        .unwrap()
        .unwrap();

        assert_eq!(seen[1], (2, LogicValue::from_u64(8, 0)));
        assert_eq!(seen[2], (3, LogicValue::from_u64(8, 7)));
    }

    #[test]
    fn test_cycle_limit() {
        let result = block_on(async {
            let sim = Simulation::new(SimConfig {
                cycle_limit: 10,
                ..Default::default()
            });
            sim.run(std::future::pending::<()>()).await
        })
        .unwrap();
        assert!(matches!(result, Err(SimError::CycleLimit { limit: 10 })));
    }

    #[test]
    fn test_body_finishing_on_last_edge_completes() {
        let result = block_on(async {
            let sim = Simulation::new(SimConfig {
                cycle_limit: 10,
                ..Default::default()
            });
            sim.run(async {
                sim.clock().cycles(10).await;
                sim.edges()
            })
            .await
        })
        .unwrap();
        assert!(matches!(result, Ok(10)));
    }
}
