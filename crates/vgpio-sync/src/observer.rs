//! Register observer
//!
//! The observer is a small state machine:
//!
//! ```text
//! Idle --start--> Running --stop--> Stopping --loop exit--> Stopped
//!                    |  ^
//!                    +--+ change: cache updated
//! ```
//!
//! A read error while `Running` is a fault: it is logged, recorded and ends
//! the loop. Once a stop has been requested the same error is teardown noise
//! and is dropped silently.

use crate::signal::{low_word, SignalError, SignalHandle};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use tracing::{trace, warn};

/// Lifecycle of the background observer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ObserverState {
    #[default]
    Idle,
    Running,
    Stopping,
    Stopped,
}

/// Cached register and run state, shared by the primitive and its task.
///
/// Only touched from the `LocalSet` thread, and no update spans a suspension
/// point.
#[derive(Debug, Default)]
pub(crate) struct Shared {
    cached: Cell<u32>,
    state: Cell<ObserverState>,
    updates: Cell<u64>,
    fault: RefCell<Option<SignalError>>,
}

impl Shared {
    pub(crate) fn cached(&self) -> u32 {
        self.cached.get()
    }

    pub(crate) fn store(&self, value: u32) {
        self.cached.set(value);
    }

    pub(crate) fn state(&self) -> ObserverState {
        self.state.get()
    }

    pub(crate) fn set_state(&self, state: ObserverState) {
        self.state.set(state);
    }

    pub(crate) fn updates(&self) -> u64 {
        self.updates.get()
    }

    pub(crate) fn fault(&self) -> Option<SignalError> {
        self.fault.borrow().clone()
    }

    fn record_update(&self, value: u32) {
        self.cached.set(value);
        self.updates.set(self.updates.get() + 1);
    }

    fn record_fault(&self, error: SignalError) {
        *self.fault.borrow_mut() = Some(error);
    }
}

/// Marks the observer stopped when its task ends, including when the task is
/// aborted before it was ever polled.
pub(crate) struct ExitGuard(Rc<Shared>);

impl ExitGuard {
    pub(crate) fn new(shared: Rc<Shared>) -> Self {
        ExitGuard(shared)
    }
}

impl Drop for ExitGuard {
    fn drop(&mut self) {
        trace!(previous = ?self.0.state(), "vgpio observer exited");
        self.0.set_state(ObserverState::Stopped);
    }
}

/// Outcome of one read step
#[derive(Debug)]
enum ReadStep {
    Update(u32),
    Fault(SignalError),
    Teardown,
}

fn classify(state: ObserverState, sampled: Result<u32, SignalError>) -> ReadStep {
    match (state, sampled) {
        (ObserverState::Running, Ok(value)) => ReadStep::Update(value),
        (ObserverState::Running, Err(error)) => ReadStep::Fault(error),
        _ => ReadStep::Teardown,
    }
}

/// Follow every change of `signal` until stopped or faulted
pub(crate) async fn observe<S: SignalHandle>(signal: Rc<S>, shared: Rc<Shared>, width: u32) {
    while shared.state() == ObserverState::Running {
        let sampled = match signal.changed().await {
            Ok(()) => signal.sample().map(|bits| low_word(&bits, width)),
            Err(error) => Err(error),
        };

        match classify(shared.state(), sampled) {
            ReadStep::Update(value) => {
                trace!(signal = signal.name(), "vgpio changed to {value:#010x}");
                shared.record_update(value);
            }
            ReadStep::Fault(error) => {
                warn!(signal = signal.name(), "vgpio monitor error: {error}");
                shared.record_fault(error);
                break;
            }
            ReadStep::Teardown => break,
        }
    }
}
