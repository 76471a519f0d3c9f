//! # Dinner Report
//!
//! Final per-philosopher outcome, in identity order.

use std::fmt;
use std::time::Duration;

use symposium_core::{AcquisitionOrder, AgentStats};

/// How a philosopher's thread ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AgentOutcome {
    /// Saw the stop signal and left normally.
    Completed,
    /// Panicked; the message is the panic payload.
    Faulted(String),
}

/// One row of the report.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AgentReport {
    /// Agent identity.
    pub agent: usize,
    /// Accumulated register entry.
    pub stats: AgentStats,
    /// How the thread ended.
    pub outcome: AgentOutcome,
}

/// Result of a completed dinner.
#[derive(Clone, Debug)]
pub struct SimulationReport {
    /// One row per agent, in identity order.
    pub agents: Vec<AgentReport>,
    /// Acquisition order the ring used.
    pub order: AcquisitionOrder,
    /// Wall-clock time from seating to report.
    pub elapsed: Duration,
    /// Time from the stop signal until the last philosopher left.
    pub shutdown_latency: Duration,
}

impl SimulationReport {
    /// Eating time of one agent, in milliseconds.
    #[must_use]
    pub fn eating_ms(&self, agent: usize) -> Option<u64> {
        self.agents.get(agent).map(|row| row.stats.eating_ms)
    }

    /// Sum of every agent's eating time.
    #[must_use]
    pub fn total_eating_ms(&self) -> u64 {
        self.agents.iter().map(|row| row.stats.eating_ms).sum()
    }

    /// Sum of every failed acquisition round.
    #[must_use]
    pub fn total_timeouts(&self) -> u64 {
        self.agents.iter().map(|row| row.stats.timeouts()).sum()
    }

    /// True if every agent ate at least once.
    #[must_use]
    pub fn everyone_ate(&self) -> bool {
        self.agents.iter().all(|row| row.stats.eating_ms > 0)
    }

    /// Agents whose thread panicked.
    pub fn faulted(&self) -> impl Iterator<Item = &AgentReport> {
        self.agents
            .iter()
            .filter(|row| matches!(row.outcome, AgentOutcome::Faulted(_)))
    }
}

impl fmt::Display for SimulationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Eating time per philosopher ===")?;
        for row in &self.agents {
            write!(f, "Philosopher {}: {} ms", row.agent, row.stats.eating_ms)?;
            if let AgentOutcome::Faulted(message) = &row.outcome {
                write!(f, " (faulted: {message})")?;
            }
            writeln!(f)?;
        }
        writeln!(f, "=== Dinner finished ===")
    }
}
