//! # Stop Signal
//!
//! Cooperative, coarse-grained cancellation handed to every agent at spawn
//! time. Written once by the controller (running → stopped), read by all.
//!
//! Agents poll it at the top of every think phase and after every bounded
//! acquisition attempt, so shutdown latency stays bounded without any
//! mid-meal interruption.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;

#[derive(Debug, Default)]
struct StopState {
    cancelled: AtomicBool,
    /// Written once, before `cancelled` flips.
    stopped_at: Mutex<Option<Instant>>,
}

/// Shared stop flag.
///
/// Cloning is cheap; every clone observes the same flag. Once cancelled a
/// token never reverts.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    state: Arc<StopState>,
}

impl CancellationToken {
    /// Creates a token in the running state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Signals every holder to stop.
    ///
    /// Returns true for the call that actually flipped the flag, false if the
    /// token was already cancelled.
    pub fn cancel(&self) -> bool {
        let mut stopped_at = self.state.stopped_at.lock();
        if stopped_at.is_some() {
            return false;
        }
        *stopped_at = Some(Instant::now());
        self.state.cancelled.store(true, Ordering::Release);
        true
    }

    /// Returns true once [`cancel`](Self::cancel) has been called on any clone.
    #[inline]
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.state.cancelled.load(Ordering::Acquire)
    }

    /// When the winning [`cancel`](Self::cancel) happened, if it did.
    #[must_use]
    pub fn cancelled_at(&self) -> Option<Instant> {
        *self.state.stopped_at.lock()
    }
}
