//! # Philosopher Agent
//!
//! One thread of control competing for two adjacent forks.
//!
//! ## State machine
//!
//! ```text
//!        ┌──────────────────────────── timeout ───────────────────────────┐
//!        │                 ┌───────── timeout (primary released) ─────────┤
//!        ▼                 │                                              │
//!   ┌──────────┐    ┌──────┴───────────┐    ┌──────────────────────┐    ┌─┴──────┐
//!   │ THINKING ├───>│ ACQUIRING_PRIMARY├───>│ ACQUIRING_SECONDARY  ├───>│ EATING │
//!   └────┬─────┘    └──────────────────┘    └──────────────────────┘    └────────┘
//!        │ stop signal seen                                                  │
//!        ▼                                                                   │
//!   ┌──────────┐              both forks released on every exit path ◄───────┘
//!   │  EXITED  │
//!   └──────────┘
//! ```
//!
//! Every wait is bounded: thinking and eating sleep for a drawn duration,
//! each fork attempt gives up after the acquisition timeout. An agent that
//! cannot make progress promptly puts everything back and retries later.
//! That timeout-and-retry, together with the ring's single reversed seat, is
//! what keeps the table free of deadlock.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::cancel::CancellationToken;
use crate::config::TimingConfig;
use crate::events::{EventSender, TableEvent};
use crate::fork::Fork;
use crate::meal::{Meal, SleepingMeal};
use crate::register::StatisticsRegister;
use crate::ring::ForkAssignment;

/// Where an agent is in its loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PhilosopherState {
    /// Holding nothing, sleeping between attempts.
    Thinking,
    /// Waiting (bounded) on the primary fork.
    AcquiringPrimary,
    /// Holding the primary, waiting (bounded) on the secondary.
    AcquiringSecondary,
    /// Holding both forks.
    Eating,
    /// Left the table after seeing the stop signal.
    Exited,
}

/// Result of one acquisition round.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Attempt {
    /// Both forks taken; a meal of this many milliseconds was eaten.
    Ate(u64),
    /// Primary fork stayed busy for the whole timeout.
    PrimaryTimeout,
    /// Secondary fork stayed busy; the primary was put back.
    SecondaryTimeout,
    /// Stop signal seen right after taking the primary; it was put back.
    Cancelled,
}

/// Everything the agents of one dinner share.
#[derive(Clone)]
pub struct TableContext {
    /// Forks around the table, indexed by ring position.
    pub forks: Arc<[Fork]>,
    /// Shared outcome accumulators.
    pub register: Arc<StatisticsRegister>,
    /// Timing bounds.
    pub timing: TimingConfig,
    /// Stop signal.
    pub token: CancellationToken,
    /// Work done while eating.
    pub meal: Arc<dyn Meal>,
    /// Optional observation channel.
    pub events: Option<EventSender>,
}

impl TableContext {
    /// Creates a context with sleeping meals and no event channel.
    #[must_use]
    pub fn new(
        forks: Arc<[Fork]>,
        register: Arc<StatisticsRegister>,
        timing: TimingConfig,
        token: CancellationToken,
    ) -> Self {
        Self {
            forks,
            register,
            timing,
            token,
            meal: Arc::new(SleepingMeal),
            events: None,
        }
    }
}

/// Derives an agent's RNG seed from the dinner seed.
#[must_use]
pub const fn agent_seed(seed: u64, agent: usize) -> u64 {
    seed ^ (agent as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

/// A philosopher seated at one ring position.
pub struct Philosopher {
    assignment: ForkAssignment,
    table: TableContext,
    rng: ChaCha8Rng,
    state: PhilosopherState,
}

impl Philosopher {
    /// Seats a philosopher. With `seed` the agent's random stream is
    /// reproducible; without it the stream is drawn from OS entropy.
    #[must_use]
    pub fn new(assignment: ForkAssignment, table: TableContext, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(agent_seed(seed, assignment.agent)),
            None => ChaCha8Rng::from_entropy(),
        };
        Self {
            assignment,
            table,
            rng,
            state: PhilosopherState::Thinking,
        }
    }

    /// This agent's identity.
    #[inline]
    #[must_use]
    pub const fn id(&self) -> usize {
        self.assignment.agent
    }

    /// This agent's fork assignment.
    #[inline]
    #[must_use]
    pub const fn assignment(&self) -> ForkAssignment {
        self.assignment
    }

    /// Current state.
    #[inline]
    #[must_use]
    pub const fn state(&self) -> PhilosopherState {
        self.state
    }

    /// Dines until the stop signal is seen at the top of a think phase.
    ///
    /// This is the only way out of the loop. Shutdown latency is bounded by
    /// one think phase, two acquisition timeouts and a meal under way.
    pub fn run(&mut self) {
        let agent = self.id();
        tracing::debug!(
            agent,
            primary = self.assignment.primary,
            secondary = self.assignment.secondary,
            "philosopher seated"
        );

        loop {
            self.state = PhilosopherState::Thinking;
            if self.table.token.is_cancelled() {
                break;
            }
            self.think();
            // The outcome is already in the register and on the event bus.
            self.attempt();
        }

        self.state = PhilosopherState::Exited;
        self.emit(TableEvent::Left { agent });
        tracing::debug!(agent, "philosopher left the table");
    }

    /// Sleeps for a drawn think duration. Holds nothing.
    pub fn think(&mut self) {
        self.state = PhilosopherState::Thinking;
        let think_ms = self.rng.gen_range(self.table.timing.think_ms.as_range());
        thread::sleep(Duration::from_millis(think_ms));
    }

    /// One acquisition round: primary, secondary, eat, release.
    ///
    /// Every failure path releases what was taken before returning, and so
    /// does unwinding out of the meal.
    pub fn attempt(&mut self) -> Attempt {
        let forks = Arc::clone(&self.table.forks);
        let timeout = self.table.timing.acquire_timeout();
        let ForkAssignment { agent, primary, secondary } = self.assignment;

        self.state = PhilosopherState::AcquiringPrimary;
        let Some(first) = forks[primary].try_acquire(agent, timeout) else {
            self.table.register.record_primary_timeout(agent);
            self.emit(TableEvent::PrimaryTimeout { agent, fork: primary });
            tracing::trace!(agent, fork = primary, "primary fork busy");
            self.state = PhilosopherState::Thinking;
            return Attempt::PrimaryTimeout;
        };

        if self.table.token.is_cancelled() {
            first.release();
            self.state = PhilosopherState::Thinking;
            return Attempt::Cancelled;
        }

        // A single seat eats with the one fork it already holds.
        let second = if self.assignment.single_fork() {
            None
        } else {
            self.state = PhilosopherState::AcquiringSecondary;
            let Some(second) = forks[secondary].try_acquire(agent, timeout) else {
                first.release();
                self.table.register.record_secondary_timeout(agent);
                self.emit(TableEvent::SecondaryTimeout { agent, fork: secondary });
                tracing::trace!(agent, fork = secondary, "secondary fork busy, primary put back");
                self.state = PhilosopherState::Thinking;
                return Attempt::SecondaryTimeout;
            };
            Some(second)
        };

        self.state = PhilosopherState::Eating;
        let duration_ms = self.eat();

        drop(second);
        first.release();
        self.state = PhilosopherState::Thinking;
        Attempt::Ate(duration_ms)
    }

    /// Draws a meal length, books it, then spends it. Caller holds both forks.
    fn eat(&mut self) -> u64 {
        let agent = self.id();
        let duration_ms = self.rng.gen_range(self.table.timing.eat_ms.as_range());

        self.table.register.add_eating(agent, duration_ms);
        self.table.meal.consume(agent, Duration::from_millis(duration_ms));

        self.emit(TableEvent::Ate { agent, duration_ms });
        tracing::trace!(agent, duration_ms, "meal finished");
        duration_ms
    }

    fn emit(&self, event: TableEvent) {
        if let Some(events) = &self.table.events {
            events.send(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MillisRange;
    use crate::events::EventBus;
    use crate::ring::{AcquisitionOrder, Ring};

    fn table(ring: &Ring, timing: TimingConfig) -> TableContext {
        let register = Arc::new(StatisticsRegister::new(0..ring.len()));
        TableContext::new(Arc::clone(ring.forks()), register, timing, CancellationToken::new())
    }

    #[test]
    fn test_attempt_eats_when_forks_free() {
        let ring = Ring::new(3, AcquisitionOrder::ReverseLast);
        let ctx = table(&ring, TimingConfig::default());
        let register = Arc::clone(&ctx.register);

        let mut philosopher = Philosopher::new(ring.assignment(1).unwrap(), ctx, Some(7));
        let Attempt::Ate(duration_ms) = philosopher.attempt() else {
            panic!("free forks must be taken");
        };

        assert!((1..10).contains(&duration_ms));
        assert_eq!(register.snapshot().eating_ms(1), duration_ms);
        assert_eq!(philosopher.state(), PhilosopherState::Thinking);
        assert!(ring.all_forks_free());
    }

    #[test]
    fn test_primary_timeout_holds_nothing() {
        let ring = Ring::new(3, AcquisitionOrder::ReverseLast);
        let ctx = table(&ring, TimingConfig::default());
        let register = Arc::clone(&ctx.register);
        let seat = ring.assignment(0).unwrap();

        let _blocker = ring.forks()[seat.primary].try_acquire(99, Duration::from_millis(1)).unwrap();

        let mut philosopher = Philosopher::new(seat, ctx, Some(7));
        assert_eq!(philosopher.attempt(), Attempt::PrimaryTimeout);
        assert!(ring.forks()[seat.secondary].is_free());
        assert_eq!(register.snapshot().get(0).unwrap().primary_timeouts, 1);
    }

    #[test]
    fn test_secondary_timeout_puts_primary_back() {
        let ring = Ring::new(3, AcquisitionOrder::ReverseLast);
        let bus = EventBus::new(16);
        let mut ctx = table(&ring, TimingConfig::default());
        ctx.events = Some(bus.sender());
        let register = Arc::clone(&ctx.register);
        let seat = ring.assignment(0).unwrap();

        let _blocker = ring.forks()[seat.secondary].try_acquire(99, Duration::from_millis(1)).unwrap();

        let mut philosopher = Philosopher::new(seat, ctx, Some(7));
        assert_eq!(philosopher.attempt(), Attempt::SecondaryTimeout);
        assert!(ring.forks()[seat.primary].is_free());
        assert_eq!(ring.forks()[seat.primary].holder(), None);
        assert_eq!(register.snapshot().get(0).unwrap().secondary_timeouts, 1);
        assert_eq!(
            bus.receiver().drain(),
            vec![TableEvent::SecondaryTimeout { agent: 0, fork: seat.secondary }]
        );
    }

    #[test]
    fn test_cancel_after_primary_releases() {
        let ring = Ring::new(2, AcquisitionOrder::ReverseLast);
        let ctx = table(&ring, TimingConfig::default());
        ctx.token.cancel();

        let mut philosopher = Philosopher::new(ring.assignment(0).unwrap(), ctx, Some(1));
        assert_eq!(philosopher.attempt(), Attempt::Cancelled);
        assert!(ring.all_forks_free());
    }

    #[test]
    fn test_single_seat_eats_alone() {
        let ring = Ring::new(1, AcquisitionOrder::ReverseLast);
        let ctx = table(&ring, TimingConfig::default());
        let register = Arc::clone(&ctx.register);

        let mut philosopher = Philosopher::new(ring.assignment(0).unwrap(), ctx, Some(3));
        for _ in 0..5 {
            assert!(matches!(philosopher.attempt(), Attempt::Ate(_)));
        }
        assert_eq!(register.snapshot().get(0).unwrap().meals, 5);
        assert!(ring.all_forks_free());
    }

    #[test]
    fn test_run_exits_on_stop_signal() {
        let ring = Ring::new(1, AcquisitionOrder::ReverseLast);
        let ctx = table(&ring, TimingConfig::default());
        let token = ctx.token.clone();

        let handle = thread::spawn(move || {
            let mut philosopher = Philosopher::new(ring.assignment(0).unwrap(), ctx, None);
            philosopher.run();
            philosopher.state()
        });

        thread::sleep(Duration::from_millis(30));
        token.cancel();
        assert_eq!(handle.join().unwrap(), PhilosopherState::Exited);
    }

    #[test]
    fn test_same_seed_same_meals() {
        let draw = |seed| {
            let ring = Ring::new(1, AcquisitionOrder::ReverseLast);
            let timing = TimingConfig {
                eat_ms: MillisRange::new(0, 1_000),
                ..TimingConfig::default()
            };
            let mut ctx = table(&ring, timing);
            ctx.meal = Arc::new(NoMeal);
            let mut philosopher = Philosopher::new(ring.assignment(0).unwrap(), ctx, Some(seed));
            (0..8).map(|_| philosopher.attempt()).collect::<Vec<_>>()
        };

        assert_eq!(draw(11), draw(11));
        assert_ne!(draw(11), draw(12));
    }

    struct NoMeal;

    impl Meal for NoMeal {
        fn consume(&self, _agent: usize, _duration: Duration) {}
    }
}
