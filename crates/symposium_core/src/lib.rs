//! # SYMPOSIUM Core
//!
//! Philosophers competing for pairs of shared forks around a ring, without
//! deadlock and without unbounded blocking.
//!
//! ## Architecture Rules
//!
//! 1. **Every wait is bounded** - forks are taken with a timeout, never blocked on
//! 2. **Ownership is the guard** - a fork is released when its guard drops, on every path
//! 3. **No ambient state** - the stop signal and the register are handed to each agent
//!
//! ## Example
//!
//! ```rust,ignore
//! use symposium_core::{AcquisitionOrder, CancellationToken, Philosopher, Ring,
//!     StatisticsRegister, TableContext, TimingConfig};
//!
//! let ring = Ring::new(5, AcquisitionOrder::ReverseLast);
//! let register = Arc::new(StatisticsRegister::new(0..5));
//! let table = TableContext::new(Arc::clone(ring.forks()), register, TimingConfig::default(),
//!     CancellationToken::new());
//!
//! let mut p0 = Philosopher::new(ring.assignment(0).unwrap(), table, Some(42));
//! p0.attempt();
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod cancel;
pub mod config;
pub mod error;
pub mod events;
pub mod fork;
pub mod meal;
pub mod philosopher;
pub mod register;
pub mod ring;

pub use cancel::CancellationToken;
pub use config::{MillisRange, SimulationConfig, TimingConfig, MAX_AGENTS};
pub use error::{SimulationError, SimulationResult};
pub use events::{EventBus, EventReceiver, EventSender, TableEvent};
pub use fork::{Fork, ForkGuard};
pub use meal::{Meal, SleepingMeal};
pub use philosopher::{Attempt, Philosopher, PhilosopherState, TableContext};
pub use register::{AgentStats, RegisterSnapshot, StatisticsRegister};
pub use ring::{AcquisitionOrder, ForkAssignment, Ring};
