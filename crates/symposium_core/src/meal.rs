//! How a philosopher spends its eating time.

use std::thread;
use std::time::Duration;

/// Work performed while both forks are held.
///
/// Implementations run on the agent's own thread with both forks locked. A
/// panic here unwinds through the fork guards, so the forks are released
/// and only this agent stops.
pub trait Meal: Send + Sync {
    /// Consumes a meal of `duration` for `agent`.
    fn consume(&self, agent: usize, duration: Duration);
}

/// Real timed suspension for the drawn duration.
#[derive(Clone, Copy, Debug, Default)]
pub struct SleepingMeal;

impl Meal for SleepingMeal {
    fn consume(&self, _agent: usize, duration: Duration) {
        thread::sleep(duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_sleeping_meal_takes_its_time() {
        let start = Instant::now();
        SleepingMeal.consume(0, Duration::from_millis(10));
        assert!(start.elapsed() >= Duration::from_millis(10));
    }
}
