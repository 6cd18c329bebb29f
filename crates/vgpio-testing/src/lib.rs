//! Firmware milestone scenarios
//!
//! A [`Scenario`] pairs a model of what the firmware writes to the virtual
//! GPIO register (and when) with the testbench steps that follow those
//! milestones. The built-in scenarios mirror the peripheral test scripts of
//! the multi-peripheral SoC: ADC, UART, SPI, I2C, SRAM, PWM and a
//! system-integration run.

pub mod builtin;
pub mod error;
pub mod firmware;
pub mod harness;
pub mod plan;
pub mod scenario;

pub use builtin::{builtin, builtins};
pub use error::{Result, ScenarioError};
pub use firmware::{BusOverride, FirmwareModel, FirmwareWrite};
pub use harness::{execute, run_scenario, ScenarioReport, StepOutcome, StepRecord};
pub use plan::{Step, ERROR_CODE};
pub use scenario::{BenchConfig, Scenario};
