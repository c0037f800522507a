use std::thread;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};

/// Monotonic clock abstraction for pacing and elapsed-time measurement.
///
/// - now(): returns a monotonic Instant
/// - sleep(): sleeps for the provided duration (implementations may simulate)
/// - secs_since(): helper to compute elapsed seconds from an epoch Instant
pub trait Clock {
    fn now(&self) -> Instant;
    fn sleep(&self, d: Duration);

    /// Seconds elapsed since `epoch`, saturating at 0 on underflow.
    fn secs_since(&self, epoch: Instant) -> f64 {
        self.now().saturating_duration_since(epoch).as_secs_f64()
    }
}

/// Default, real-time monotonic clock backed by std::time::Instant.
#[derive(Debug, Default, Clone, Copy)]
pub struct MonotonicClock;

impl MonotonicClock {
    #[inline]
    pub fn new() -> Self {
        Self
    }
}

impl Clock for MonotonicClock {
    #[inline]
    fn now(&self) -> Instant {
        Instant::now()
    }

    #[inline]
    fn sleep(&self, d: Duration) {
        if d.is_zero() {
            return;
        }
        thread::sleep(d);
    }
}

/// Wall-clock reading used to timestamp event notifications. Kept separate
/// from `Clock` so tests can pin timestamps while still pacing with the
/// monotonic clock.
pub trait WallClock {
    fn now_utc(&self) -> DateTime<Utc>;
}

/// System wall clock (UTC).
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemWallClock;

impl SystemWallClock {
    #[inline]
    pub fn new() -> Self {
        Self
    }
}

impl WallClock for SystemWallClock {
    #[inline]
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
