//! Virtual bench for the vgpio channel
//!
//! A small discrete-event environment: named multi-bit signals
//! with 4-state values, one clock, and a schedule of values to drive at given
//! edges. Time is tokio's virtual clock on a paused current-thread runtime, so
//! it only advances once every task is waiting. That gives each edge a fixed
//! order: scheduled values are driven first, then the rising edge is
//! published.

pub mod clock;
pub mod error;
pub mod signal;
pub mod simulation;
pub mod value;

pub use clock::SimClock;
pub use error::{SimError, SimResult};
pub use signal::SimSignal;
pub use simulation::{block_on, runtime, SimConfig, Simulation};
pub use value::LogicValue;
