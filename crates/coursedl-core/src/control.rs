//! Run control: pause, resume and exit, driven by interrupts.
//!
//! A single `PauseController` is shared by the interrupt handler and every
//! worker. Workers poll it before claiming an item; it never interrupts a
//! transfer that is already running.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Default gap under which a second interrupt means "exit".
pub const DEFAULT_DOUBLE_INTERRUPT_WINDOW: Duration = Duration::from_secs(2);

/// Process-wide run state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PauseState {
    Running,
    Paused,
    /// Terminal: no new items are claimed.
    Exiting,
}

#[derive(Debug)]
struct Inner {
    state: PauseState,
    last_interrupt: Option<Instant>,
}

/// Shared pause/resume/exit flag with the interrupt state machine.
#[derive(Debug)]
pub struct PauseController {
    inner: Mutex<Inner>,
    double_interrupt_window: Duration,
}

impl Default for PauseController {
    fn default() -> Self {
        Self::new(DEFAULT_DOUBLE_INTERRUPT_WINDOW)
    }
}

impl PauseController {
    pub fn new(double_interrupt_window: Duration) -> Self {
        Self {
            inner: Mutex::new(Inner {
                state: PauseState::Running,
                last_interrupt: None,
            }),
            double_interrupt_window,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn current(&self) -> PauseState {
        self.lock().state
    }

    /// Running → Paused. No effect in any other state.
    pub fn signal_pause(&self) {
        self.transition(PauseState::Running, PauseState::Paused);
    }

    /// Paused → Running. No effect in any other state.
    pub fn signal_resume(&self) {
        self.transition(PauseState::Paused, PauseState::Running);
    }

    pub fn signal_exit(&self) {
        let mut inner = self.lock();
        if inner.state != PauseState::Exiting {
            tracing::info!(from = ?inner.state, "exit requested; no new items will be claimed");
            inner.state = PauseState::Exiting;
        }
    }

    fn transition(&self, from: PauseState, to: PauseState) {
        let mut inner = self.lock();
        if inner.state == from {
            tracing::info!(?from, ?to, "run state changed");
            inner.state = to;
        }
    }

    /// Handle one interrupt (e.g. Ctrl-C) and return the new state.
    pub fn on_interrupt(&self) -> PauseState {
        self.on_interrupt_at(Instant::now())
    }

    /// Interrupt state machine with an explicit clock:
    /// a second interrupt within the window exits, otherwise pause toggles.
    pub fn on_interrupt_at(&self, now: Instant) -> PauseState {
        let mut inner = self.lock();
        let rapid = inner
            .last_interrupt
            .map(|prev| now.saturating_duration_since(prev) < self.double_interrupt_window)
            .unwrap_or(false);
        inner.last_interrupt = Some(now);

        let next = match inner.state {
            PauseState::Exiting => PauseState::Exiting,
            _ if rapid => PauseState::Exiting,
            PauseState::Running => PauseState::Paused,
            PauseState::Paused => PauseState::Running,
        };
        if next != inner.state {
            tracing::info!(from = ?inner.state, to = ?next, rapid, "interrupt received");
            inner.state = next;
        }
        next
    }

    /// Wait while paused. Returns `true` when work may be claimed and `false`
    /// once the run is exiting or `abort` is set.
    pub async fn wait_until_runnable(&self, poll_interval: Duration, abort: &AtomicBool) -> bool {
        loop {
            if abort.load(Ordering::SeqCst) {
                return false;
            }
            match self.current() {
                PauseState::Running => return true,
                PauseState::Exiting => return false,
                PauseState::Paused => tokio::time::sleep(poll_interval).await,
            }
        }
    }
}
