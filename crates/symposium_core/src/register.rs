//! # Statistics Register
//!
//! Per-philosopher accumulators shared by every agent thread.
//!
//! ## Discipline
//!
//! Only agent `i` writes entry `i`. The register does not rely on that: every
//! access goes through one mutex, so the container stays consistent under
//! any interleaving. Entries are seeded before any agent runs, so no access
//! ever sees a missing key.

use std::collections::BTreeMap;

use parking_lot::Mutex;

/// Accumulated outcome of one philosopher.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AgentStats {
    /// Total time spent eating, in milliseconds. Never decreases.
    pub eating_ms: u64,
    /// Number of completed meals.
    pub meals: u64,
    /// Times the primary fork could not be taken within the timeout.
    pub primary_timeouts: u64,
    /// Times the secondary fork could not be taken (primary was released).
    pub secondary_timeouts: u64,
}

impl AgentStats {
    /// Total failed acquisition rounds.
    #[inline]
    #[must_use]
    pub const fn timeouts(&self) -> u64 {
        self.primary_timeouts + self.secondary_timeouts
    }
}

/// Shared register keyed by agent identity.
#[derive(Debug)]
pub struct StatisticsRegister {
    entries: Mutex<BTreeMap<usize, AgentStats>>,
}

impl StatisticsRegister {
    /// Creates a register with a zeroed entry for every identity.
    #[must_use]
    pub fn new(agents: impl IntoIterator<Item = usize>) -> Self {
        let entries = agents
            .into_iter()
            .map(|agent| (agent, AgentStats::default()))
            .collect();
        Self {
            entries: Mutex::new(entries),
        }
    }

    /// Number of seeded identities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns true if no identity was seeded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Adds one meal of `duration_ms` to `agent`'s entry.
    ///
    /// # Panics
    ///
    /// Panics if `agent` was never seeded.
    pub fn add_eating(&self, agent: usize, duration_ms: u64) {
        self.update(agent, |stats| {
            stats.eating_ms = stats.eating_ms.saturating_add(duration_ms);
            stats.meals += 1;
        });
    }

    /// Records a failed primary acquisition for `agent`.
    ///
    /// # Panics
    ///
    /// Panics if `agent` was never seeded.
    pub fn record_primary_timeout(&self, agent: usize) {
        self.update(agent, |stats| stats.primary_timeouts += 1);
    }

    /// Records a failed secondary acquisition for `agent`.
    ///
    /// # Panics
    ///
    /// Panics if `agent` was never seeded.
    pub fn record_secondary_timeout(&self, agent: usize) {
        self.update(agent, |stats| stats.secondary_timeouts += 1);
    }

    /// Copies the current state.
    ///
    /// Safe to call at any time; the controller's final report is taken only
    /// after every agent has left, so that one is fully settled.
    #[must_use]
    pub fn snapshot(&self) -> RegisterSnapshot {
        RegisterSnapshot {
            entries: self.entries.lock().clone(),
        }
    }

    fn update(&self, agent: usize, apply: impl FnOnce(&mut AgentStats)) {
        let mut entries = self.entries.lock();
        match entries.get_mut(&agent) {
            Some(stats) => apply(stats),
            None => panic!("philosopher {agent} is not seated in the statistics register"),
        }
    }
}

/// Point-in-time copy of the register, in identity order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RegisterSnapshot {
    entries: BTreeMap<usize, AgentStats>,
}

impl RegisterSnapshot {
    /// Stats for one agent.
    #[must_use]
    pub fn get(&self, agent: usize) -> Option<&AgentStats> {
        self.entries.get(&agent)
    }

    /// Eating time for one agent, zero if unknown.
    #[must_use]
    pub fn eating_ms(&self, agent: usize) -> u64 {
        self.get(agent).map_or(0, |stats| stats.eating_ms)
    }

    /// Sum of all eating time.
    #[must_use]
    pub fn total_eating_ms(&self) -> u64 {
        self.entries.values().map(|stats| stats.eating_ms).sum()
    }

    /// Iterates entries in identity order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &AgentStats)> {
        self.entries.iter().map(|(agent, stats)| (*agent, stats))
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the snapshot has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
