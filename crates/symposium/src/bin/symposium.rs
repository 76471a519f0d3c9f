//! # SYMPOSIUM Binary
//!
//! Five philosophers, ten seconds, no flags. Logs go to stderr, the report
//! to stdout.

use std::process::ExitCode;

use symposium::{Simulation, SimulationConfig};

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let result = Simulation::new(SimulationConfig::default()).and_then(Simulation::run);

    match result {
        Ok(report) => {
            print!("{report}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!("dinner failed: {err}");
            ExitCode::FAILURE
        }
    }
}
