//! Simulator-facing interfaces
//!
//! The primitive never talks to a simulator directly. It consumes a handle to
//! the bus carrying the register and a source of rising clock edges. Both are
//! polled from a single-threaded executor, so the futures are not `Send`.

use async_trait::async_trait;
use bitvec::prelude::*;
use thiserror::Error;

/// Errors reported by a signal handle
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignalError {
    /// Some bits are X or Z, so the bus has no integer value yet
    #[error("signal '{name}' has {unknown} unresolved bit(s)")]
    Unresolved { name: String, unknown: usize },
    /// The simulator released the handle
    #[error("signal '{name}' is no longer attached to the simulator")]
    Detached { name: String },
}

/// A multi-bit signal exposed by the design under test
#[async_trait(?Send)]
pub trait SignalHandle {
    /// Hierarchical name, used in diagnostics only
    fn name(&self) -> &str;

    /// Sample the current value, least significant bit first.
    ///
    /// Fails when any bit of the signal cannot be resolved to 0 or 1.
    fn sample(&self) -> Result<BitVec, SignalError>;

    /// Suspend until the value of the signal changes
    async fn changed(&self) -> Result<(), SignalError>;
}

/// Rising edges of the clock that paces the waiter
#[async_trait(?Send)]
pub trait ClockEdges {
    /// Suspend until the next rising edge
    async fn rising_edge(&self);
}

/// Pack the lowest `width` bits of a sampled bus into a register value.
///
/// Missing high bits of a bus narrower than `width` read as zero.
pub fn low_word(bits: &BitSlice, width: u32) -> u32 {
    bits.iter()
        .by_vals()
        .take(width.min(32) as usize)
        .enumerate()
        .fold(0u32, |acc, (i, bit)| acc | (u32::from(bit) << i))
}
