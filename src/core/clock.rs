//! Time source
//!
//! Components that stamp records or verdicts take a `Clock` so tests can pin
//! the current instant.

use chrono::{DateTime, SubsecRound, Utc};
use std::sync::atomic::{AtomicI64, Ordering};

/// Source of the current instant
pub trait Clock: Send + Sync {
    /// Current instant, whole seconds in UTC
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock truncated to whole seconds
///
/// Every instant on the wire is second precision, so the clock never hands
/// out a value the encoders would refuse.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now().trunc_subsecs(0)
    }
}

/// Manually driven clock
#[derive(Debug)]
pub struct FixedClock {
    seconds: AtomicI64,
}

impl FixedClock {
    pub fn new(at: DateTime<Utc>) -> Self {
        Self {
            seconds: AtomicI64::new(at.timestamp()),
        }
    }

    /// Set the current instant
    pub fn set(&self, at: DateTime<Utc>) {
        self.seconds.store(at.timestamp(), Ordering::SeqCst);
    }

    /// Move the clock forward
    pub fn advance(&self, by: chrono::Duration) {
        self.seconds.fetch_add(by.num_seconds(), Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.seconds.load(Ordering::SeqCst), 0).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};

    #[test]
    fn test_system_clock_has_no_fraction() {
        assert_eq!(SystemClock.now().nanosecond(), 0);
    }

    #[test]
    fn test_fixed_clock_advances() {
        let start = Utc.with_ymd_and_hms(2025, 9, 15, 14, 0, 0).unwrap();
        let clock = FixedClock::new(start);
        clock.advance(chrono::Duration::minutes(31));
        assert_eq!(clock.now(), Utc.with_ymd_and_hms(2025, 9, 15, 14, 31, 0).unwrap());

        clock.set(start);
        assert_eq!(clock.now(), start);
    }
}
