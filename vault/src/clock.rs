//! Time sources for the engine.
//!
//! The engine never reads the wall clock directly. It asks a [`Clock`], so
//! tests can park time at maturity and simulations can fast-forward a year
//! without sleeping.

use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Current time in nanoseconds since the Unix epoch.
///
/// The engine does not check that successive readings are monotonic.
pub trait Clock {
    fn now_nanos(&self) -> u64;
}

/// Wall-clock time via `chrono`.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_nanos(&self) -> u64 {
        // `timestamp_nanos_opt` is `None` after year 2262; saturate rather
        // than panic.
        Utc::now()
            .timestamp_nanos_opt()
            .map(|n| n.max(0) as u64)
            .unwrap_or(u64::MAX)
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn new(start_nanos: u64) -> Self {
        Self {
            now: AtomicU64::new(start_nanos),
        }
    }

    pub fn set(&self, nanos: u64) {
        self.now.store(nanos, Ordering::SeqCst);
    }

    /// Moves the clock forward, saturating at `u64::MAX`.
    pub fn advance(&self, nanos: u64) {
        let _ = self
            .now
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |t| {
                Some(t.saturating_add(nanos))
            });
    }
}

impl Clock for ManualClock {
    fn now_nanos(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_nanos(&self) -> u64 {
        (**self).now_nanos()
    }
}

impl<C: Clock + ?Sized> Clock for std::sync::Arc<C> {
    fn now_nanos(&self) -> u64 {
        (**self).now_nanos()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn system_clock_is_after_2020() {
        // 2020-01-01T00:00:00Z in nanoseconds.
        assert!(SystemClock.now_nanos() > 1_577_836_800_000_000_000);
    }

    #[test]
    fn manual_clock_set_and_advance() {
        let clock = ManualClock::new(10);
        assert_eq!(clock.now_nanos(), 10);
        clock.advance(5);
        assert_eq!(clock.now_nanos(), 15);
        clock.set(3);
        assert_eq!(clock.now_nanos(), 3);
        clock.advance(u64::MAX);
        assert_eq!(clock.now_nanos(), u64::MAX);
    }

    #[test]
    fn shared_clock_sees_updates() {
        let clock = Arc::new(ManualClock::new(0));
        let handle = Arc::clone(&clock);
        clock.advance(42);
        assert_eq!(handle.now_nanos(), 42);
    }
}
