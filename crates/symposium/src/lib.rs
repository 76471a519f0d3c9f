//! # SYMPOSIUM
//!
//! The dinner: seats philosophers around the table built by
//! `symposium_core`, lets them dine for a fixed wall-clock duration, stops
//! them, and reports how long each one ate.
//!
//! ## Example
//!
//! ```rust,ignore
//! use symposium::{Simulation, SimulationConfig};
//!
//! let report = Simulation::new(SimulationConfig::scenario())?.run()?;
//! print!("{report}");
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod report;
pub mod simulation;

// Re-export the table
pub use symposium_core as table;

pub use report::{AgentOutcome, AgentReport, SimulationReport};
pub use simulation::Simulation;
pub use symposium_core::{AcquisitionOrder, SimulationConfig, SimulationError, TimingConfig};
