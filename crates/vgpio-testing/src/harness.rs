//! Scenario execution

use crate::error::{Result, ScenarioError};
use crate::plan::Step;
use crate::scenario::Scenario;
use std::fmt;
use std::rc::Rc;
use tracing::{error, info, warn};
use vgpio_sim::{LogicValue, SimClock, SimConfig, SimSignal, Simulation};
use vgpio_sync::{ClockEdges, SignalError, TimeoutError, VirtualGpio};

type Vgpio = VirtualGpio<SimSignal, SimClock>;

/// What a step observed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Reached { value: u32 },
    Settled,
    Sampled { value: u32, in_range: bool },
    Polled { value: u32, reached: bool },
    Clear { value: u32 },
}

impl StepOutcome {
    pub fn passed(&self) -> bool {
        !matches!(self, StepOutcome::Sampled { in_range: false, .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepRecord {
    pub index: usize,
    pub label: String,
    pub outcome: StepOutcome,
    /// Edge at which the step finished
    pub edge: u64,
}

/// Result of a scenario that ran to its last step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioReport {
    pub name: String,
    pub records: Vec<StepRecord>,
    pub final_value: u32,
    pub edges: u64,
    /// Simulated time at the end of the run
    pub sim_time_ns: u128,
    pub observer_updates: u64,
    pub observer_fault: Option<SignalError>,
}

impl ScenarioReport {
    pub fn passed(&self) -> bool {
        self.records.iter().all(|record| record.outcome.passed())
    }

    pub fn failed_checks(&self) -> impl Iterator<Item = &StepRecord> {
        self.records
            .iter()
            .filter(|record| !record.outcome.passed())
    }
}

impl fmt::Display for ScenarioReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verdict = if self.passed() { "PASS" } else { "FAIL" };
        writeln!(
            f,
            "{}: {verdict} after {} cycles / {} ns (vgpio={:#x}, {} observed changes)",
            self.name, self.edges, self.sim_time_ns, self.final_value, self.observer_updates
        )?;
        for record in &self.records {
            let mark = if record.outcome.passed() { "ok" } else { "FAILED" };
            writeln!(
                f,
                "  [{:>2}] {:<40} @{:<8} {mark}",
                record.index, record.label, record.edge
            )?;
        }
        if let Some(fault) = &self.observer_fault {
            writeln!(f, "  observer stopped early: {fault}")?;
        }
        Ok(())
    }
}

enum StepFailure {
    Timeout(TimeoutError),
    ErrorCode(u32),
}

/// Run `scenario` on the current paused runtime and `LocalSet`
pub async fn execute(scenario: &Scenario) -> Result<ScenarioReport> {
    scenario.validate()?;

    let sim = Simulation::new(SimConfig {
        clock_period_ns: scenario.bench.clock_period_ns,
        cycle_limit: scenario.bench.cycle_limit,
        ..Default::default()
    });
    let bus = sim
        .add_signal(
            scenario.bench.bus_name.clone(),
            LogicValue::unknown(scenario.bench.bus_width),
        )
        .map_err(|source| ScenarioError::Simulation {
            scenario: scenario.name.clone(),
            source,
        })?;
    scenario
        .firmware
        .load(&sim, &scenario.bench.bus_name)
        .map_err(|source| ScenarioError::Simulation {
            scenario: scenario.name.clone(),
            source,
        })?;

    info!("[TEST] start {}", scenario.name);
    let result = sim
        .run(run_steps(scenario, sim.clock(), bus))
        .await
        .map_err(|source| ScenarioError::Simulation {
            scenario: scenario.name.clone(),
            source,
        })?;

    match &result {
        Ok(report) if report.passed() => info!("[TEST] {} complete - PASS", scenario.name),
        Ok(_) => error!("[TEST] {} complete - FAIL", scenario.name),
        Err(err) => error!("[TEST] {} aborted: {err}", scenario.name),
    }
    result
}

/// Run `scenario` on a fresh bench runtime
pub fn run_scenario(scenario: &Scenario) -> Result<ScenarioReport> {
    vgpio_sim::block_on(execute(scenario)).map_err(|source| ScenarioError::Simulation {
        scenario: scenario.name.clone(),
        source,
    })?
}

async fn run_steps(
    scenario: &Scenario,
    clock: Rc<SimClock>,
    bus: Rc<SimSignal>,
) -> Result<ScenarioReport> {
    let mut vgpio = VirtualGpio::with_config(bus, clock.clone(), scenario.vgpio)
        .map_err(|e| ScenarioError::InvalidScenario(e.to_string()))?;
    vgpio.start();

    let mut records = Vec::with_capacity(scenario.steps.len());
    for (index, step) in scenario.steps.iter().enumerate() {
        let label = step.label();
        match run_step(&vgpio, &clock, step, &label).await {
            Ok(outcome) => records.push(StepRecord {
                index,
                label,
                outcome,
                edge: clock.edges(),
            }),
            Err(failure) => {
                vgpio.shutdown().await;
                return Err(match failure {
                    StepFailure::Timeout(source) => ScenarioError::Milestone {
                        scenario: scenario.name.clone(),
                        step: index,
                        label,
                        source,
                    },
                    StepFailure::ErrorCode(value) => ScenarioError::ErrorCode {
                        scenario: scenario.name.clone(),
                        step: index,
                        value,
                    },
                });
            }
        }
    }

    let final_value = vgpio.read_current();
    vgpio.shutdown().await;

    Ok(ScenarioReport {
        name: scenario.name.clone(),
        records,
        final_value,
        edges: clock.edges(),
        sim_time_ns: clock.now_ns(),
        observer_updates: vgpio.update_count(),
        observer_fault: vgpio.fault(),
    })
}

async fn run_step(
    vgpio: &Vgpio,
    clock: &SimClock,
    step: &Step,
    label: &str,
) -> std::result::Result<StepOutcome, StepFailure> {
    match step {
        Step::Wait {
            value,
            timeout_cycles,
            ..
        } => {
            info!("[TEST] Waiting for {label} (vgpio={value:#x})");
            let budget = timeout_cycles.unwrap_or(vgpio.config().default_timeout_cycles);
            vgpio
                .wait_output(*value, budget)
                .await
                .map_err(StepFailure::Timeout)?;
            info!("[TEST] {label}");
            Ok(StepOutcome::Reached { value: *value })
        }
        Step::Settle { cycles } => {
            clock.cycles(*cycles).await;
            Ok(StepOutcome::Settled)
        }
        Step::Sample { mask, min, max, .. } => {
            let value = vgpio.read_current() & mask;
            let in_range = (*min..=*max).contains(&value);
            if in_range {
                info!("[TEST] {label}: {value:#x} - PASS");
            } else {
                error!("[TEST] {label}: {value:#x} outside {min:#x}..={max:#x} - FAIL");
            }
            Ok(StepOutcome::Sampled { value, in_range })
        }
        Step::PollUntil {
            at_least,
            max_cycles,
        } => {
            let mut value = vgpio.read_current();
            for _ in 0..*max_cycles {
                clock.rising_edge().await;
                value = vgpio.read_current();
                if value >= *at_least {
                    break;
                }
            }
            let reached = value >= *at_least;
            if !reached {
                warn!("[TEST] vgpio still {value:#x} after {max_cycles} cycles");
            }
            Ok(StepOutcome::Polled { value, reached })
        }
        Step::Reject { value, .. } => {
            let current = vgpio.read_current();
            if current == *value {
                error!("[TEST] {label}: vgpio={current:#x}");
                return Err(StepFailure::ErrorCode(current));
            }
            Ok(StepOutcome::Clear { value: current })
        }
    }
}
