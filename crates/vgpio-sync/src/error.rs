//! Error types for the milestone synchronization primitive

use thiserror::Error;

/// Result type for vgpio configuration
pub type Result<T> = std::result::Result<T, VgpioError>;

/// Errors raised while configuring the primitive
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VgpioError {
    /// Register width outside the supported range
    #[error("invalid register width {0}: must be between 1 and 32 bits")]
    InvalidWidth(u32),
}

/// A milestone was not reached within its cycle budget.
///
/// This is the only failure a waiting test sequence ever sees. Both values are
/// rendered as fixed-width hexadecimal so they line up in simulation logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("timeout: vgpio did not reach {expected:#010x} within {cycles} cycles (stuck at {observed:#010x})")]
pub struct TimeoutError {
    /// Milestone value the caller waited for
    pub expected: u32,
    /// Register value sampled after the budget ran out
    pub observed: u32,
    /// Cycle budget that was exhausted
    pub cycles: u32,
}
