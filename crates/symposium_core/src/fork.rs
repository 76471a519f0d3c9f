//! # Forks
//!
//! One exclusive resource per ring position.
//!
//! ## Contract
//!
//! ```text
//!   try_acquire(agent, timeout) ──> Some(ForkGuard)   ownership obtained
//!                               └─> None              nothing held, retry later
//!
//!   ForkGuard dropped / released ──> ownership relinquished
//! ```
//!
//! The underlying lock is never exposed. Ownership IS the guard: a fork that
//! was not acquired cannot be released, and a guard cannot be released
//! twice. Release happens on every exit path, unwinding included.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::{Mutex, MutexGuard};

/// Sentinel stored in [`Fork::holder`] while nobody holds the fork.
const NO_HOLDER: usize = usize::MAX;

/// A shared fork between two adjacent philosophers.
///
/// At most one agent holds a fork at any instant. Acquisition waits at most
/// the given timeout; there is no queueing or fairness beyond what the
/// underlying lock provides.
#[derive(Debug)]
pub struct Fork {
    /// Ring position of this fork.
    id: usize,
    /// Exclusive ownership, no payload.
    lock: Mutex<()>,
    /// Identity of the current holder, `NO_HOLDER` when free.
    holder: AtomicUsize,
}

impl Fork {
    /// Creates a free fork for ring position `id`.
    #[must_use]
    pub fn new(id: usize) -> Self {
        Self {
            id,
            lock: Mutex::new(()),
            holder: AtomicUsize::new(NO_HOLDER),
        }
    }

    /// Ring position of this fork.
    #[inline]
    #[must_use]
    pub const fn id(&self) -> usize {
        self.id
    }

    /// Attempts to take the fork on behalf of `agent`, waiting up to `timeout`.
    ///
    /// Returns `None` if the fork stayed busy for the whole timeout. In that
    /// case the caller holds nothing.
    ///
    /// # Panics
    ///
    /// Panics if the holder bookkeeping shows another agent still owning the
    /// fork after the lock was granted. Mutual exclusion is already broken at
    /// that point.
    #[must_use]
    pub fn try_acquire(&self, agent: usize, timeout: Duration) -> Option<ForkGuard<'_>> {
        let lock = self.lock.try_lock_for(timeout)?;

        let previous = self.holder.swap(agent, Ordering::AcqRel);
        assert_eq!(
            previous, NO_HOLDER,
            "fork {} granted to philosopher {agent} while held by philosopher {previous}",
            self.id
        );

        Some(ForkGuard {
            fork: self,
            agent,
            _lock: lock,
        })
    }

    /// Returns the agent currently holding this fork, if any.
    #[must_use]
    pub fn holder(&self) -> Option<usize> {
        match self.holder.load(Ordering::Acquire) {
            NO_HOLDER => None,
            agent => Some(agent),
        }
    }

    /// Returns true if a fresh probe can take the fork right now.
    ///
    /// The probe takes and immediately releases the lock.
    #[must_use]
    pub fn is_free(&self) -> bool {
        self.lock.try_lock().is_some()
    }
}

/// Proof of exclusive ownership of one [`Fork`].
///
/// Dropping the guard releases the fork.
#[must_use = "dropping the guard releases the fork immediately"]
pub struct ForkGuard<'a> {
    fork: &'a Fork,
    agent: usize,
    _lock: MutexGuard<'a, ()>,
}

impl ForkGuard<'_> {
    /// Ring position of the held fork.
    #[inline]
    #[must_use]
    pub fn fork_id(&self) -> usize {
        self.fork.id
    }

    /// Agent holding the fork through this guard.
    #[inline]
    #[must_use]
    pub fn agent(&self) -> usize {
        self.agent
    }

    /// Releases the fork.
    ///
    /// Equivalent to dropping the guard; spelled out where the release point
    /// matters to the reader.
    pub fn release(self) {
        drop(self);
    }
}

impl Drop for ForkGuard<'_> {
    fn drop(&mut self) {
        // Clear bookkeeping while the lock is still held; `_lock` drops after this body.
        let previous = self.fork.holder.swap(NO_HOLDER, Ordering::AcqRel);
        assert_eq!(
            previous, self.agent,
            "fork {} released by philosopher {} but held by philosopher {previous}",
            self.fork.id, self.agent
        );
    }
}

impl fmt::Debug for ForkGuard<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForkGuard")
            .field("fork", &self.fork.id)
            .field("agent", &self.agent)
            .finish()
    }
}
