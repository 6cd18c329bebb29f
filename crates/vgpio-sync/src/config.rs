//! Configuration for the virtual GPIO primitive

use crate::error::{Result, VgpioError};
use serde::{Deserialize, Serialize};

/// Width of the milestone register in bits
pub const DEFAULT_WIDTH: u32 = 32;

/// Cycle budget used by [`crate::VirtualGpio::wait_milestone`]
pub const DEFAULT_TIMEOUT_CYCLES: u32 = 100_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VgpioConfig {
    /// Number of low bus bits that make up the register
    pub width: u32,
    /// Budget in clock edges when the caller does not name one
    pub default_timeout_cycles: u32,
}

impl Default for VgpioConfig {
    fn default() -> Self {
        VgpioConfig {
            width: DEFAULT_WIDTH,
            default_timeout_cycles: DEFAULT_TIMEOUT_CYCLES,
        }
    }
}

impl VgpioConfig {
    pub fn with_width(width: u32) -> Result<Self> {
        let config = VgpioConfig {
            width,
            ..Default::default()
        };
        config.validate()?;
        Ok(config)
    }

    pub fn with_default_timeout(mut self, cycles: u32) -> Self {
        self.default_timeout_cycles = cycles;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.width > 32 {
            return Err(VgpioError::InvalidWidth(self.width));
        }
        Ok(())
    }

    /// Bit mask selecting the register from the low bus bits
    pub fn mask(&self) -> u32 {
        if self.width >= 32 {
            u32::MAX
        } else {
            (1u32 << self.width) - 1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = VgpioConfig::default();
        assert_eq!(config.width, 32);
        assert_eq!(config.default_timeout_cycles, 100_000);
        assert_eq!(config.mask(), 0xFFFF_FFFF);
    }

    #[test]
    fn test_narrow_width_mask() {
        let config = VgpioConfig::with_width(12).unwrap();
        assert_eq!(config.mask(), 0xFFF);
    }

    #[test]
    fn test_width_out_of_range() {
        assert_eq!(
            VgpioConfig::with_width(0),
            Err(VgpioError::InvalidWidth(0))
        );
        assert_eq!(
            VgpioConfig::with_width(33),
            Err(VgpioError::InvalidWidth(33))
        );
    }
}
