//! # Simulation Controller
//!
//! THE DINNER, START TO FINISH:
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │ 1. LAY THE TABLE                                                    │
//! │    ├─ N forks, N seats, one reversed seat                           │
//! │    └─ Register seeded with zero for every philosopher               │
//! │                                                                     │
//! │ 2. SEAT EVERYONE                                                    │
//! │    └─ One named thread per philosopher, each with an exit notice    │
//! │                                                                     │
//! │ 3. DINE                                                             │
//! │    └─ Wait out the duration (or until stopped, or every seat empty) │
//! │                                                                     │
//! │ 4. STOP                                                             │
//! │    ├─ Cancel the token exactly once                                 │
//! │    └─ Wait for every exit notice, bounded by the shutdown deadline  │
//! │                                                                     │
//! │ 5. REPORT                                                           │
//! │    ├─ Join every thread, record faults                              │
//! │    └─ Snapshot the register (nobody is left to write to it)         │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use std::any::Any;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{after, select, tick, unbounded, Receiver, Sender};
use symposium_core::{
    CancellationToken, EventSender, Fork, Meal, Philosopher, Ring, SimulationConfig,
    SimulationError, SimulationResult, SleepingMeal, StatisticsRegister, TableContext,
};

use crate::report::{AgentOutcome, AgentReport, SimulationReport};

/// How often the dinner checks for an external stop.
const STOP_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Sends the agent's identity when its thread ends, normally or by panic.
struct ExitNotice {
    agent: usize,
    sender: Sender<usize>,
}

impl Drop for ExitNotice {
    fn drop(&mut self) {
        // Controller gone means nobody is waiting for us.
        let _ = self.sender.send(self.agent);
    }
}

/// One dinner, ready to run.
pub struct Simulation {
    config: SimulationConfig,
    ring: Ring,
    register: Arc<StatisticsRegister>,
    token: CancellationToken,
    meal: Arc<dyn Meal>,
    events: Option<EventSender>,
}

impl Simulation {
    /// Validates the config and lays the table.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::InvalidConfig`] if the config is rejected.
    pub fn new(config: SimulationConfig) -> SimulationResult<Self> {
        config.validate()?;

        let ring = Ring::new(config.agents, config.acquisition_order);
        let register = Arc::new(StatisticsRegister::new(0..config.agents));

        tracing::info!(
            agents = config.agents,
            duration_ms = config.duration_ms,
            order = ?ring.order(),
            wait_cycle = ring.has_wait_cycle(),
            "table laid"
        );

        Ok(Self {
            config,
            ring,
            register,
            token: CancellationToken::new(),
            meal: Arc::new(SleepingMeal),
            events: None,
        })
    }

    /// Replaces how philosophers spend their eating time.
    #[must_use]
    pub fn with_meal(mut self, meal: Arc<dyn Meal>) -> Self {
        self.meal = meal;
        self
    }

    /// Publishes table events on `sender` while the dinner runs.
    #[must_use]
    pub fn with_events(mut self, sender: EventSender) -> Self {
        self.events = Some(sender);
        self
    }

    /// The validated config.
    #[must_use]
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Shared handle to the register, for observing a dinner in progress.
    #[must_use]
    pub fn register(&self) -> Arc<StatisticsRegister> {
        Arc::clone(&self.register)
    }

    /// Shared handle to the forks, for probing them after the dinner.
    #[must_use]
    pub fn forks(&self) -> Arc<[Fork]> {
        Arc::clone(self.ring.forks())
    }

    /// Stop signal of this dinner. Cancelling it ends the dinner early.
    #[must_use]
    pub fn stop_handle(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Runs the dinner to completion and reports.
    ///
    /// Blocks for the configured duration plus the shutdown latency. A
    /// philosopher that panics is reported as faulted; the others dine on.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::Spawn`] if an agent thread cannot be
    /// started and [`SimulationError::ShutdownStalled`] if agents are still
    /// seated when the shutdown deadline passes.
    pub fn run(self) -> SimulationResult<SimulationReport> {
        let started = Instant::now();
        let (exit_tx, exit_rx) = unbounded();

        let seats = self.seat_everyone(&exit_tx)?;
        drop(exit_tx);

        let mut departed = vec![false; seats.len()];
        self.dine(&exit_rx, &mut departed);

        if self.token.cancel() {
            tracing::info!(elapsed = ?started.elapsed(), "stop signal sent");
        }
        self.await_departures(&exit_rx, &mut departed)?;
        let shutdown_latency = self
            .token
            .cancelled_at()
            .map_or(Duration::ZERO, |stopped_at| stopped_at.elapsed());

        tracing::info!(
            ?shutdown_latency,
            bound = ?self.config.timing.shutdown_bound(),
            "every philosopher left the table"
        );

        let outcomes = Self::join_all(seats);

        // Every writer is gone: this snapshot is settled.
        let snapshot = self.register.snapshot();
        let agents = outcomes
            .into_iter()
            .enumerate()
            .map(|(agent, outcome)| AgentReport {
                agent,
                stats: snapshot.get(agent).copied().unwrap_or_default(),
                outcome,
            })
            .collect();

        Ok(SimulationReport {
            agents,
            order: self.ring.order(),
            elapsed: started.elapsed(),
            shutdown_latency,
        })
    }

    fn seat_everyone(&self, exit_tx: &Sender<usize>) -> SimulationResult<Vec<JoinHandle<()>>> {
        let table = TableContext {
            forks: Arc::clone(self.ring.forks()),
            register: Arc::clone(&self.register),
            timing: self.config.timing,
            token: self.token.clone(),
            meal: Arc::clone(&self.meal),
            events: self.events.clone(),
        };

        let mut seats = Vec::with_capacity(self.ring.len());
        for &assignment in self.ring.assignments() {
            let agent = assignment.agent;
            let table = table.clone();
            let seed = self.config.seed;
            let notice = ExitNotice {
                agent,
                sender: exit_tx.clone(),
            };

            let spawned = thread::Builder::new()
                .name(format!("philosopher-{agent}"))
                .spawn(move || {
                    let _notice = notice;
                    Philosopher::new(assignment, table, seed).run();
                });

            match spawned {
                Ok(handle) => seats.push(handle),
                Err(source) => {
                    tracing::error!(agent, "failed to seat philosopher: {source}");
                    self.token.cancel();
                    // Already-seated agents see the token within the shutdown bound.
                    Self::join_all(seats);
                    return Err(SimulationError::Spawn { agent, source });
                }
            }
        }

        tracing::info!(seated = seats.len(), "dinner started");
        Ok(seats)
    }

    /// Waits out the dinner. Returns early if the stop handle was used or
    /// every seat is already empty.
    fn dine(&self, exit_rx: &Receiver<usize>, departed: &mut [bool]) {
        let dinner_over = after(self.config.duration());
        let stop_poll = tick(STOP_POLL_INTERVAL);

        loop {
            select! {
                recv(exit_rx) -> notice => match notice {
                    Ok(agent) => {
                        departed[agent] = true;
                        if !self.token.is_cancelled() {
                            tracing::warn!(agent, "philosopher left before the stop signal");
                        }
                        if departed.iter().all(|&gone| gone) {
                            return;
                        }
                    }
                    Err(_) => return,
                },
                recv(stop_poll) -> _ => {
                    if self.token.is_cancelled() {
                        tracing::info!("dinner stopped early");
                        return;
                    }
                },
                recv(dinner_over) -> _ => return,
            }
        }
    }

    /// Collects the remaining exit notices, bounded by the shutdown deadline.
    fn await_departures(
        &self,
        exit_rx: &Receiver<usize>,
        departed: &mut [bool],
    ) -> SimulationResult<()> {
        let deadline = after(self.config.shutdown_deadline());

        while departed.iter().any(|&gone| !gone) {
            select! {
                recv(exit_rx) -> notice => match notice {
                    Ok(agent) => departed[agent] = true,
                    Err(_) => break,
                },
                recv(deadline) -> _ => {
                    let pending: Vec<usize> = departed
                        .iter()
                        .enumerate()
                        .filter(|&(_, &gone)| !gone)
                        .map(|(agent, _)| agent)
                        .collect();
                    tracing::error!(?pending, "philosophers ignored the stop signal");
                    return Err(SimulationError::ShutdownStalled { pending });
                },
            }
        }
        Ok(())
    }

    fn join_all(seats: Vec<JoinHandle<()>>) -> Vec<AgentOutcome> {
        seats
            .into_iter()
            .enumerate()
            .map(|(agent, handle)| match handle.join() {
                Ok(()) => AgentOutcome::Completed,
                Err(payload) => {
                    let message = panic_message(payload.as_ref());
                    tracing::error!(agent, "philosopher faulted: {message}");
                    AgentOutcome::Faulted(message)
                }
            })
            .collect()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
