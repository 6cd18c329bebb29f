//! Firmware models
//!
//! The firmware under test is not simulated here. What matters to the
//! testbench is the sequence of values it writes to the register and the
//! number of cycles between the writes.

use serde::{Deserialize, Serialize};
use vgpio_sim::{LogicValue, SimResult, Simulation};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirmwareWrite {
    /// Cycles since the previous write (or since boot for the first one)
    pub after_cycles: u64,
    pub value: u32,
}

/// Raw bus pattern forced at an absolute edge, e.g. `"x"` while the logic
/// analyzer is being reconfigured. Patterns use [`LogicValue::parse`] syntax.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusOverride {
    pub at_cycle: u64,
    pub pattern: String,
}

/// Timed register writes. The bus stays unresolved until the first write.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirmwareModel {
    #[serde(default)]
    pub boot_cycles: u64,
    #[serde(default)]
    pub writes: Vec<FirmwareWrite>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub overrides: Vec<BusOverride>,
}

impl FirmwareModel {
    pub fn boot(cycles: u64) -> Self {
        FirmwareModel {
            boot_cycles: cycles,
            ..Default::default()
        }
    }

    pub fn then(mut self, after_cycles: u64, value: u32) -> Self {
        self.writes.push(FirmwareWrite {
            after_cycles,
            value,
        });
        self
    }

    pub fn force(mut self, at_cycle: u64, pattern: &str) -> Self {
        self.overrides.push(BusOverride {
            at_cycle,
            pattern: pattern.to_string(),
        });
        self
    }

    /// Absolute edge of every write
    pub fn timeline(&self) -> Vec<(u64, u32)> {
        let mut edge = self.boot_cycles;
        self.writes
            .iter()
            .map(|write| {
                edge += write.after_cycles;
                (edge, write.value)
            })
            .collect()
    }

    /// Edge of the last write
    pub fn duration(&self) -> u64 {
        self.timeline().last().map(|(edge, _)| *edge).unwrap_or(0)
    }

    /// Check every override pattern against a bus of `width` bits
    pub fn check_overrides(&self, width: usize) -> SimResult<()> {
        for forced in &self.overrides {
            LogicValue::parse(width, &forced.pattern)?;
        }
        Ok(())
    }

    /// Schedule every write and override on the bus named `bus`
    pub fn load(&self, sim: &Simulation, bus: &str) -> SimResult<()> {
        let bus = sim.signal(bus)?;
        for (edge, value) in self.timeline() {
            sim.schedule(
                edge,
                &bus,
                LogicValue::from_u64(bus.width(), u64::from(value)),
            );
        }
        for forced in &self.overrides {
            let value = LogicValue::parse(bus.width(), &forced.pattern)?;
            sim.schedule(forced.at_cycle, &bus, value);
        }
        Ok(())
    }
}
