//! Scenario description and loading

use crate::error::{Result, ScenarioError};
use crate::firmware::FirmwareModel;
use crate::plan::Step;
use serde::{Deserialize, Serialize};
use std::path::Path;
use vgpio_sync::VgpioConfig;

/// Bench parameters of a scenario
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchConfig {
    /// Cycles after which the whole test is abandoned
    pub cycle_limit: u64,
    pub clock_period_ns: u64,
    /// Bus carrying the register in its low bits
    pub bus_name: String,
    pub bus_width: usize,
}

impl Default for BenchConfig {
    fn default() -> Self {
        BenchConfig {
            cycle_limit: 1_000_000,
            clock_period_ns: 25,
            bus_name: "la_data_in".to_string(),
            bus_width: 128,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub bench: BenchConfig,
    #[serde(default)]
    pub vgpio: VgpioConfig,
    pub firmware: FirmwareModel,
    pub steps: Vec<Step>,
}

impl Scenario {
    /// Parse a scenario from a TOML file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ScenarioError::Io(format!("{}: {e}", path.as_ref().display())))?;
        Self::from_str(&contents)
    }

    /// Parse a scenario from TOML text
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Result<Self> {
        let scenario: Scenario =
            toml::from_str(s).map_err(|e| ScenarioError::Parse(e.to_string()))?;
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| ScenarioError::Parse(e.to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: String| {
            Err(ScenarioError::InvalidScenario(format!(
                "{}: {reason}",
                self.name
            )))
        };

        if self.name.trim().is_empty() {
            return Err(ScenarioError::InvalidScenario(
                "scenario name is empty".to_string(),
            ));
        }
        if let Err(e) = self.vgpio.validate() {
            return invalid(e.to_string());
        }
        if self.bench.cycle_limit == 0 {
            return invalid("cycle limit must be positive".to_string());
        }
        if self.bench.clock_period_ns == 0 {
            return invalid("clock period must be positive".to_string());
        }
        if self.bench.bus_width < self.vgpio.width as usize {
            return invalid(format!(
                "bus '{}' is {} bits wide, narrower than the {}-bit register",
                self.bench.bus_name, self.bench.bus_width, self.vgpio.width
            ));
        }
        if let Err(e) = self.firmware.check_overrides(self.bench.bus_width) {
            return invalid(e.to_string());
        }
        if self.steps.is_empty() {
            return invalid("no steps".to_string());
        }
        for (index, step) in self.steps.iter().enumerate() {
            if let Step::Sample { min, max, .. } = step {
                if min > max {
                    return invalid(format!("step {index}: sample range {min}..={max} is empty"));
                }
            }
        }
        Ok(())
    }
}
