//! The virtual GPIO primitive: observer lifecycle, direct read and waiter

use crate::config::VgpioConfig;
use crate::error::{Result, TimeoutError};
use crate::observer::{observe, ExitGuard, ObserverState, Shared};
use crate::signal::{low_word, ClockEdges, SignalError, SignalHandle};
use std::rc::Rc;
use tokio::task::JoinHandle;
use tracing::{debug, error, trace, warn};

/// Testbench end of the firmware milestone channel.
///
/// One instance is built per test run and dropped at teardown; dropping it
/// stops the observer.
pub struct VirtualGpio<S, C> {
    signal: Rc<S>,
    clock: Rc<C>,
    config: VgpioConfig,
    shared: Rc<Shared>,
    task: Option<JoinHandle<()>>,
}

impl<S, C> VirtualGpio<S, C> {
    pub fn config(&self) -> &VgpioConfig {
        &self.config
    }

    pub fn state(&self) -> ObserverState {
        self.shared.state()
    }

    /// Last value seen by the observer or a direct read, without sampling
    pub fn cached_value(&self) -> u32 {
        self.shared.cached()
    }

    /// Number of changes the observer has applied to the cache
    pub fn update_count(&self) -> u64 {
        self.shared.updates()
    }

    /// Error that ended the observer while it was running, if any
    pub fn fault(&self) -> Option<SignalError> {
        self.shared.fault()
    }

    /// Request the observer to stop.
    ///
    /// Safe to call at any time and any number of times. Cancellation takes
    /// effect at the task's next suspension point.
    pub fn stop(&mut self) {
        match self.shared.state() {
            ObserverState::Idle => trace!("vgpio stop requested before start"),
            ObserverState::Running => {
                self.shared.set_state(ObserverState::Stopping);
                if let Some(task) = &self.task {
                    task.abort();
                }
                debug!("vgpio observer stopping");
            }
            ObserverState::Stopping | ObserverState::Stopped => {}
        }
    }

    /// Stop the observer and wait until its task has finished
    pub async fn shutdown(&mut self) {
        self.stop();
        if let Some(task) = self.task.take() {
            match task.await {
                Ok(()) => {}
                Err(err) if err.is_cancelled() => {}
                Err(err) => error!("vgpio observer task failed: {err}"),
            }
        }
    }
}

impl<S, C> VirtualGpio<S, C>
where
    S: SignalHandle + 'static,
    C: ClockEdges,
{
    pub fn new(signal: Rc<S>, clock: Rc<C>) -> Self {
        VirtualGpio {
            signal,
            clock,
            config: VgpioConfig::default(),
            shared: Rc::new(Shared::default()),
            task: None,
        }
    }

    pub fn with_config(signal: Rc<S>, clock: Rc<C>, config: VgpioConfig) -> Result<Self> {
        config.validate()?;
        let mut vgpio = Self::new(signal, clock);
        vgpio.config = config;
        Ok(vgpio)
    }

    /// Spawn the background observer on the current `LocalSet`.
    ///
    /// Only the first call has an effect; a stopped observer is never resumed.
    ///
    /// # Panics
    ///
    /// Panics if called outside a [`tokio::task::LocalSet`], as
    /// [`tokio::task::spawn_local`] does. Every bench entry point
    /// (`vgpio_sim::block_on`, `LocalSet::run_until`) provides one.
    pub fn start(&mut self) {
        let state = self.shared.state();
        if state != ObserverState::Idle {
            warn!(?state, "vgpio observer already started, ignoring start");
            return;
        }

        self.shared.set_state(ObserverState::Running);
        let guard = ExitGuard::new(self.shared.clone());
        let signal = self.signal.clone();
        let shared = self.shared.clone();
        let width = self.config.width;
        self.task = Some(tokio::task::spawn_local(async move {
            let _guard = guard;
            observe(signal, shared, width).await;
        }));
        debug!(signal = self.signal.name(), "vgpio observer started");
    }

    /// Sample the register now and refresh the cache.
    ///
    /// When the bus cannot be resolved the cached value is returned unchanged.
    ///
    /// Any number of waiters may call this alongside the observer without
    /// locking only because they all run on one thread and never yield
    /// between sampling and storing. Moving the primitive onto a preemptive
    /// multi-threaded executor would need the cache behind a synchronization
    /// primitive; the `Rc` fields keep that from compiling by accident.
    pub fn read_current(&self) -> u32 {
        match self.signal.sample() {
            Ok(bits) => {
                let value = low_word(&bits, self.config.width);
                self.shared.store(value);
                value
            }
            Err(err) => {
                trace!("vgpio direct read kept cached value: {err}");
                self.shared.cached()
            }
        }
    }

    /// Wait until the register equals `expected`, checking once per rising
    /// edge for at most `timeout_cycles` edges.
    ///
    /// A value that already matches returns before any edge is consumed.
    pub async fn wait_output(
        &self,
        expected: u32,
        timeout_cycles: u32,
    ) -> std::result::Result<(), TimeoutError> {
        debug!("Waiting for vgpio={expected:#010x}");

        for cycle in 0..timeout_cycles {
            if self.read_current() == expected {
                debug!("vgpio reached {expected:#010x} after {cycle} cycles");
                return Ok(());
            }
            self.clock.rising_edge().await;
        }

        let observed = self.read_current();
        error!("Timeout waiting for vgpio={expected:#010x}. Current value: {observed:#010x}");
        Err(TimeoutError {
            expected,
            observed,
            cycles: timeout_cycles,
        })
    }

    /// [`wait_output`](Self::wait_output) with the configured default budget
    pub async fn wait_milestone(&self, expected: u32) -> std::result::Result<(), TimeoutError> {
        self.wait_output(expected, self.config.default_timeout_cycles)
            .await
    }
}

impl<S, C> Drop for VirtualGpio<S, C> {
    fn drop(&mut self) {
        self.stop();
    }
}
