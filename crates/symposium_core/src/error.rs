//! # Simulation Error Types
//!
//! All errors that can occur while assembling or running a dinner.
//!
//! An acquisition timeout is NOT an error. It is the normal "could not
//! proceed now" outcome of [`Fork::try_acquire`](crate::Fork::try_acquire)
//! and is represented by `None`.

use thiserror::Error;

/// Errors that can occur in the simulation.
#[derive(Error, Debug)]
pub enum SimulationError {
    /// Configuration failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration document could not be parsed.
    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// The OS refused to start an agent thread.
    #[error("failed to spawn philosopher {agent}: {source}")]
    Spawn {
        /// Identity of the agent that could not be started.
        agent: usize,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },

    /// Agents did not observe the stop signal within the shutdown bound.
    #[error("shutdown stalled: philosophers {pending:?} still at the table")]
    ShutdownStalled {
        /// Identities of the agents that never left.
        pending: Vec<usize>,
    },
}

/// Result type for simulation operations.
pub type SimulationResult<T> = Result<T, SimulationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = SimulationError::InvalidConfig("agents must be at least 1".into());
        assert_eq!(err.to_string(), "invalid configuration: agents must be at least 1");

        let err = SimulationError::ShutdownStalled { pending: vec![1, 3] };
        assert_eq!(err.to_string(), "shutdown stalled: philosophers [1, 3] still at the table");
    }

    #[test]
    fn test_spawn_error_keeps_source() {
        use std::error::Error as _;

        let err = SimulationError::Spawn {
            agent: 2,
            source: std::io::Error::new(std::io::ErrorKind::Other, "no threads left"),
        };
        assert!(err.to_string().contains("philosopher 2"));
        assert!(err.source().is_some());
    }
}
