//! Driven signals

use crate::value::LogicValue;
use async_trait::async_trait;
use bitvec::prelude::*;
use std::cell::Cell;
use tokio::sync::watch;
use tracing::trace;
use vgpio_sync::{SignalError, SignalHandle};

/// A named, fixed-width signal whose subscribers are woken on every
/// transition.
#[derive(Debug)]
pub struct SimSignal {
    name: String,
    width: usize,
    value: watch::Sender<LogicValue>,
    attached: Cell<bool>,
}

impl SimSignal {
    pub fn new(name: impl Into<String>, initial: LogicValue) -> Self {
        let width = initial.width();
        let (value, _) = watch::channel(initial);
        SimSignal {
            name: name.into(),
            width,
            value,
            attached: Cell::new(true),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn value(&self) -> LogicValue {
        self.value.borrow().clone()
    }

    pub fn is_attached(&self) -> bool {
        self.attached.get()
    }

    /// Drive a new value, resized to the signal width.
    ///
    /// Returns whether the value actually changed; subscribers are only woken
    /// on a change.
    pub fn drive(&self, value: LogicValue) -> bool {
        let value = if value.width() == self.width {
            value
        } else {
            value.resized(self.width)
        };
        let changed = self.value.send_if_modified(|current| {
            if *current == value {
                false
            } else {
                *current = value;
                true
            }
        });
        if changed {
            trace!(signal = %self.name, "driven to {}", self.value());
        }
        changed
    }

    pub fn drive_u64(&self, value: u64) -> bool {
        self.drive(LogicValue::from_u64(self.width, value))
    }

    /// Release the signal: pending and later subscriptions fail, as do reads
    pub fn detach(&self) {
        self.attached.set(false);
        self.value.send_modify(|_| {});
    }

    fn ensure_attached(&self) -> Result<(), SignalError> {
        if self.is_attached() {
            Ok(())
        } else {
            Err(SignalError::Detached {
                name: self.name.clone(),
            })
        }
    }
}

#[async_trait(?Send)]
impl SignalHandle for SimSignal {
    fn name(&self) -> &str {
        &self.name
    }

    fn sample(&self) -> Result<BitVec, SignalError> {
        self.ensure_attached()?;
        let value = self.value.borrow();
        value.resolve().ok_or_else(|| SignalError::Unresolved {
            name: self.name.clone(),
            unknown: value.unknown_count(),
        })
    }

    async fn changed(&self) -> Result<(), SignalError> {
        self.ensure_attached()?;
        let mut rx = self.value.subscribe();
        rx.changed().await.map_err(|_| SignalError::Detached {
            name: self.name.clone(),
        })?;
        self.ensure_attached()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drive_reports_transitions_only() {
        let signal = SimSignal::new("la_data_in", LogicValue::zeros(128));
        assert!(!signal.drive_u64(0));
        assert!(signal.drive_u64(1));
        assert!(!signal.drive_u64(1));
    }

    #[test]
    fn test_sample_unresolved() {
        let signal = SimSignal::new("la_data_in", LogicValue::unknown(16));
        assert_eq!(
            signal.sample(),
            Err(SignalError::Unresolved {
                name: "la_data_in".into(),
                unknown: 16
            })
        );
    }

    #[test]
    fn test_drive_resizes() {
        let signal = SimSignal::new("bus", LogicValue::zeros(8));
        signal.drive(LogicValue::from_u64(16, 0x1234));
        assert_eq!(signal.value(), LogicValue::from_u64(8, 0x34));
    }

    #[test]
    fn test_detached_sample_fails() {
        let signal = SimSignal::new("bus", LogicValue::zeros(8));
        assert!(signal.is_attached());
        signal.detach();
        assert!(!signal.is_attached());
        assert!(matches!(
            signal.sample(),
            Err(SignalError::Detached { .. })
        ));
    }

    #[tokio::test]
    async fn test_changed_wakes_on_detach() {
        let signal = SimSignal::new("bus", LogicValue::zeros(8));
        let local = tokio::task::LocalSet::new();
        local
            .run_until(async {
                let signal = std::rc::Rc::new(signal);
                let waiter = {
                    let signal = signal.clone();
                    tokio::task::spawn_local(async move { signal.changed().await })
                };
                tokio::task::yield_now().await;
                signal.detach();
                let result = waiter.await.unwrap();
                assert!(matches!(result, Err(SignalError::Detached { .. })));
            })
            .await;
    }
}
