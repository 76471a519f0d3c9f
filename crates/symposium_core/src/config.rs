//! # Dinner Configuration
//!
//! Every timing bound of the simulation lives here. The defaults reproduce
//! the classic dinner: five philosophers, ten seconds, think and eat for
//! 1..10 ms, give up on a fork after 5 ms.
//!
//! Configs can be parsed from a TOML document:
//!
//! ```toml
//! agents = 5
//! duration_ms = 1000
//! seed = 42
//! acquisition_order = "reverse_last"
//!
//! [timing]
//! think_ms = { min = 1, max = 10 }
//! eat_ms = { min = 1, max = 10 }
//! acquire_timeout_ms = 5
//! ```

use std::ops::Range;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{SimulationError, SimulationResult};
use crate::ring::AcquisitionOrder;

/// Largest ring the simulation accepts.
pub const MAX_AGENTS: usize = 64;

/// Half-open millisecond range `[min, max)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MillisRange {
    /// Inclusive lower bound.
    pub min: u64,
    /// Exclusive upper bound.
    pub max: u64,
}

impl MillisRange {
    /// Creates a range `[min, max)`.
    #[must_use]
    pub const fn new(min: u64, max: u64) -> Self {
        Self { min, max }
    }

    /// The range in a form `rand` can sample from.
    #[must_use]
    pub const fn as_range(&self) -> Range<u64> {
        self.min..self.max
    }

    /// Upper bound as a duration.
    #[must_use]
    pub const fn upper(&self) -> Duration {
        Duration::from_millis(self.max)
    }

    fn validate(&self, name: &str) -> SimulationResult<()> {
        if self.min >= self.max {
            return Err(SimulationError::InvalidConfig(format!(
                "{name} range [{}, {}) is empty",
                self.min, self.max
            )));
        }
        Ok(())
    }
}

/// Per-operation timing bounds shared by every philosopher.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// How long a philosopher thinks between attempts.
    pub think_ms: MillisRange,
    /// How long a meal lasts.
    pub eat_ms: MillisRange,
    /// Maximum wait for a single fork.
    pub acquire_timeout_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            think_ms: MillisRange::new(1, 10),
            eat_ms: MillisRange::new(1, 10),
            acquire_timeout_ms: 5,
        }
    }
}

impl TimingConfig {
    /// Tightened bounds for contention stress: near-zero thinking and a
    /// one millisecond patience per fork.
    #[must_use]
    pub const fn stress() -> Self {
        Self {
            think_ms: MillisRange::new(0, 2),
            eat_ms: MillisRange::new(1, 3),
            acquire_timeout_ms: 1,
        }
    }

    /// Acquisition timeout as a duration.
    #[inline]
    #[must_use]
    pub const fn acquire_timeout(&self) -> Duration {
        Duration::from_millis(self.acquire_timeout_ms)
    }

    /// Worst-case time for an agent to notice the stop signal: one think
    /// phase, two acquisition attempts and one meal already under way.
    #[must_use]
    pub fn shutdown_bound(&self) -> Duration {
        self.think_ms.upper() + self.acquire_timeout() * 2 + self.eat_ms.upper()
    }

    /// Checks every bound.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::InvalidConfig`] for an empty range or a zero
    /// acquisition timeout.
    pub fn validate(&self) -> SimulationResult<()> {
        self.think_ms.validate("think_ms")?;
        self.eat_ms.validate("eat_ms")?;
        if self.acquire_timeout_ms == 0 {
            return Err(SimulationError::InvalidConfig(
                "acquire_timeout_ms must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

/// Full description of one dinner.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Number of philosophers (and forks) around the table.
    pub agents: usize,
    /// Wall-clock length of the dinner.
    pub duration_ms: u64,
    /// Think/eat/acquire bounds.
    pub timing: TimingConfig,
    /// Fixed seed for reproducible runs; OS entropy when absent.
    pub seed: Option<u64>,
    /// Fork acquisition order across the ring.
    pub acquisition_order: AcquisitionOrder,
    /// Slack added on top of the shutdown bound before giving up on an agent.
    pub shutdown_grace_ms: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            agents: 5,
            duration_ms: 10_000,
            timing: TimingConfig::default(),
            seed: None,
            acquisition_order: AcquisitionOrder::ReverseLast,
            shutdown_grace_ms: 1_000,
        }
    }
}

impl SimulationConfig {
    /// The reference scenario: five philosophers for one second.
    #[must_use]
    pub fn scenario() -> Self {
        Self {
            duration_ms: 1_000,
            ..Self::default()
        }
    }

    /// Parses and validates a TOML document. Missing keys take defaults.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::ConfigParse`] for malformed TOML and
    /// [`SimulationError::InvalidConfig`] if validation fails.
    pub fn from_toml_str(document: &str) -> SimulationResult<Self> {
        let config: Self = toml::from_str(document)?;
        config.validate()?;
        Ok(config)
    }

    /// Dinner length as a duration.
    #[inline]
    #[must_use]
    pub const fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }

    /// How long the controller waits for agents after the stop signal.
    #[must_use]
    pub fn shutdown_deadline(&self) -> Duration {
        self.timing.shutdown_bound() + Duration::from_millis(self.shutdown_grace_ms)
    }

    /// Checks the ring size, the duration and every timing bound.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::InvalidConfig`] describing the first
    /// violated bound.
    pub fn validate(&self) -> SimulationResult<()> {
        if self.agents == 0 {
            return Err(SimulationError::InvalidConfig(
                "at least one philosopher is required".into(),
            ));
        }
        if self.agents > MAX_AGENTS {
            return Err(SimulationError::InvalidConfig(format!(
                "{} philosophers exceed the table size of {MAX_AGENTS}",
                self.agents
            )));
        }
        if self.duration_ms == 0 {
            return Err(SimulationError::InvalidConfig(
                "duration_ms must be greater than zero".into(),
            ));
        }
        self.timing.validate()
    }
}
