//! One-time initialization gate.
//!
//! # State Transitions
//! ```text
//! Uninitialized → Initializing: first caller wins the compare-and-set
//! Initializing  → Ready:         bootstrap succeeded (terminal)
//! Initializing  → Uninitialized: bootstrap failed or panicked (retryable)
//! ```
//!
//! # Design Decisions
//! - Atomic compare-and-set, never check-then-set on a flag
//! - Callers arriving during `Initializing` park on a condvar, not a spin
//! - After `Ready` the fast path is a single atomic load

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Condvar, Mutex, PoisonError};

/// Lifecycle state as seen from outside the dispatcher.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeState {
    Uninitialized = 0,
    Initializing = 1,
    Ready = 2,
}

impl From<u8> for BridgeState {
    fn from(val: u8) -> Self {
        match val {
            1 => BridgeState::Initializing,
            2 => BridgeState::Ready,
            _ => BridgeState::Uninitialized,
        }
    }
}

/// Runs a bootstrap closure exactly once to success.
#[derive(Debug)]
pub struct InitGate {
    state: AtomicU8,
    lock: Mutex<()>,
    released: Condvar,
}

impl Default for InitGate {
    fn default() -> Self {
        Self::new()
    }
}

impl InitGate {
    pub fn new() -> Self {
        Self {
            state: AtomicU8::new(BridgeState::Uninitialized as u8),
            lock: Mutex::new(()),
            released: Condvar::new(),
        }
    }

    pub fn state(&self) -> BridgeState {
        BridgeState::from(self.state.load(Ordering::Acquire))
    }

    pub fn is_ready(&self) -> bool {
        self.state() == BridgeState::Ready
    }

    /// Ensure `bootstrap` has completed successfully once.
    ///
    /// Returns `Ok(true)` if this call ran the bootstrap, `Ok(false)` if the
    /// gate was already (or became) ready without it. A failed bootstrap
    /// leaves the gate `Uninitialized`; a caller that was parked behind it
    /// takes its own turn.
    pub fn run<F, E>(&self, bootstrap: F) -> Result<bool, E>
    where
        F: FnOnce() -> Result<(), E>,
    {
        let mut bootstrap = Some(bootstrap);
        loop {
            match self.state() {
                BridgeState::Ready => return Ok(false),
                BridgeState::Uninitialized => {
                    if self
                        .state
                        .compare_exchange(
                            BridgeState::Uninitialized as u8,
                            BridgeState::Initializing as u8,
                            Ordering::AcqRel,
                            Ordering::Acquire,
                        )
                        .is_err()
                    {
                        continue;
                    }

                    let Some(bootstrap) = bootstrap.take() else {
                        // Unreachable: the closure is only taken by a winning CAS.
                        self.release(BridgeState::Uninitialized);
                        return Ok(false);
                    };
                    let mut guard = ReleaseOnDrop {
                        gate: self,
                        outcome: BridgeState::Uninitialized,
                    };
                    let result = bootstrap();
                    if result.is_ok() {
                        guard.outcome = BridgeState::Ready;
                    }
                    drop(guard);
                    return result.map(|()| true);
                }
                BridgeState::Initializing => self.wait_while_initializing(),
            }
        }
    }

    fn wait_while_initializing(&self) {
        let mut held = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        while self.state() == BridgeState::Initializing {
            held = self
                .released
                .wait(held)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    fn release(&self, outcome: BridgeState) {
        {
            // Store under the lock so a waiter cannot miss the wakeup
            // between its state check and its wait.
            let _held = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
            self.state.store(outcome as u8, Ordering::Release);
        }
        self.released.notify_all();
    }
}

/// Leaves the gate in `outcome` even if the bootstrap panics.
struct ReleaseOnDrop<'a> {
    gate: &'a InitGate,
    outcome: BridgeState,
}

impl Drop for ReleaseOnDrop<'_> {
    fn drop(&mut self) {
        self.gate.release(self.outcome);
    }
}
