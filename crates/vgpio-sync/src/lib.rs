//! Virtual GPIO milestone synchronization
//!
//! Firmware running inside a simulated design reports progress by writing
//! milestone numbers to a software-visible "virtual GPIO" register. This crate
//! provides the testbench side of that channel:
//!
//! - a background observer that follows every change of the register and
//!   caches the latest masked value
//! - a direct read that samples the register on demand
//! - a waiter that suspends the calling test sequence until a milestone is
//!   reached, bounded by a budget of clock edges
//!
//! Everything runs cooperatively on a single-threaded tokio runtime inside a
//! [`tokio::task::LocalSet`]. The simulator side is abstracted behind
//! [`SignalHandle`] and [`ClockEdges`].
//!
//! # Example
//! ```rust,ignore
//! let mut vgpio = VirtualGpio::new(la_data_in, clock);
//! vgpio.start();
//!
//! vgpio.wait_output(1, 100_000).await?; // firmware ready
//! vgpio.wait_output(2, 100_000).await?; // peripheral enabled
//!
//! vgpio.shutdown().await;
//! ```

pub mod config;
pub mod error;
pub mod observer;
pub mod signal;
pub mod vgpio;

pub use config::{VgpioConfig, DEFAULT_TIMEOUT_CYCLES, DEFAULT_WIDTH};
pub use error::{Result, TimeoutError, VgpioError};
pub use observer::ObserverState;
pub use signal::{low_word, ClockEdges, SignalError, SignalHandle};
pub use vgpio::VirtualGpio;
