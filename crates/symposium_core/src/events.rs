//! # Table Events
//!
//! Optional observation channel from the philosophers to whoever watches the
//! dinner (monitors, tests, the controller's log).
//!
//! ```text
//!   P0 ──┐
//!   P1 ──┼──> [bounded channel] ──> observer
//!   PN ──┘     (try_send, never blocks)
//! ```
//!
//! Sends never block an agent. When the channel is full the event is dropped
//! and counted; the statistics register, not this channel, is the source of
//! truth for results.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};

/// Something that happened at the table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TableEvent {
    /// An agent finished a meal.
    Ate {
        /// Agent that ate.
        agent: usize,
        /// Length of the meal.
        duration_ms: u64,
    },
    /// An agent gave up on its primary fork.
    PrimaryTimeout {
        /// Agent that gave up.
        agent: usize,
        /// Fork it was waiting for.
        fork: usize,
    },
    /// An agent gave up on its secondary fork and put the primary back.
    SecondaryTimeout {
        /// Agent that gave up.
        agent: usize,
        /// Fork it was waiting for.
        fork: usize,
    },
    /// An agent observed the stop signal and left the table.
    Left {
        /// Agent that left.
        agent: usize,
    },
}

impl TableEvent {
    /// Agent the event is about.
    #[must_use]
    pub const fn agent(&self) -> usize {
        match *self {
            Self::Ate { agent, .. }
            | Self::PrimaryTimeout { agent, .. }
            | Self::SecondaryTimeout { agent, .. }
            | Self::Left { agent } => agent,
        }
    }
}

/// Bounded channel carrying [`TableEvent`]s.
pub struct EventBus {
    sender: Sender<TableEvent>,
    receiver: Receiver<TableEvent>,
    dropped: Arc<AtomicU64>,
}

impl EventBus {
    /// Creates a bus holding at most `capacity` undelivered events.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity);
        Self {
            sender,
            receiver,
            dropped: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Returns a sending handle for an agent.
    #[must_use]
    pub fn sender(&self) -> EventSender {
        EventSender {
            sender: self.sender.clone(),
            dropped: Arc::clone(&self.dropped),
        }
    }

    /// Returns a receiving handle for an observer.
    #[must_use]
    pub fn receiver(&self) -> EventReceiver {
        EventReceiver {
            receiver: self.receiver.clone(),
        }
    }

    /// Events discarded because the channel was full.
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Non-blocking sending half.
#[derive(Clone)]
pub struct EventSender {
    sender: Sender<TableEvent>,
    dropped: Arc<AtomicU64>,
}

impl EventSender {
    /// Sends without waiting. Returns false if the event was dropped.
    #[inline]
    pub fn send(&self, event: TableEvent) -> bool {
        match self.sender.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                false
            }
            // Observer went away; nobody is listening.
            Err(TrySendError::Disconnected(_)) => false,
        }
    }
}

/// Receiving half.
#[derive(Clone)]
pub struct EventReceiver {
    receiver: Receiver<TableEvent>,
}

impl EventReceiver {
    /// Takes every pending event.
    #[must_use]
    pub fn drain(&self) -> Vec<TableEvent> {
        self.receiver.try_iter().collect()
    }

    /// Takes one pending event, if any.
    #[inline]
    #[must_use]
    pub fn try_recv(&self) -> Option<TableEvent> {
        self.receiver.try_recv().ok()
    }

    /// Number of events waiting.
    #[inline]
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }
}
