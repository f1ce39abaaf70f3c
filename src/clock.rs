//! Time source used by the arbiter and the confirmation protocol.

use embassy_time::{Duration, Instant};

/// Monotonic clock with a blocking delay.
///
/// The confirmation protocol waits through this trait, so tests can swap in a
/// clock that advances instantly instead of sleeping.
pub trait Clock {
    /// Current time
    fn now(&self) -> Instant;

    /// Block the caller for `duration`
    fn delay(&mut self, duration: Duration);
}

/// Clock backed by the global `embassy-time` driver.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn delay(&mut self, duration: Duration) {
        embassy_time::block_for(duration);
    }
}
