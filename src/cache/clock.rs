//! Clock Module
//!
//! Time sources used by the cache to stamp and age entries.

use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};

// == Clock Trait ==
/// A source of the current time.
///
/// Injected at construction so expiry can be tested deterministically.
pub trait Clock: Send + Sync {
    /// Returns the current instant.
    fn now(&self) -> DateTime<Utc>;
}

// == System Clock ==
/// Wall clock backed by `Utc::now()`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

// == Mock Clock ==
/// Manually driven clock for tests.
///
/// Starts at the Unix epoch and only moves when [`MockClock::add`] or
/// [`MockClock::set`] is called.
#[derive(Debug)]
pub struct MockClock {
    now: Mutex<DateTime<Utc>>,
}

impl MockClock {
    /// Creates a mock clock frozen at the Unix epoch.
    pub fn new() -> Self {
        Self {
            now: Mutex::new(Utc.timestamp_nanos(0)),
        }
    }

    /// Moves the clock forward by `delta`.
    pub fn add(&self, delta: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        let nanos = i64::try_from(delta.as_nanos()).unwrap_or(i64::MAX);
        *now = Utc.timestamp_nanos(to_nanos(*now).saturating_add(nanos));
    }

    /// Sets the clock to an absolute instant.
    pub fn set(&self, instant: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = instant;
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MockClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

// == Utility Functions ==
/// Unix nanoseconds for `instant`, saturating outside the representable range.
pub(crate) fn to_nanos(instant: DateTime<Utc>) -> i64 {
    instant.timestamp_nanos_opt().unwrap_or(if instant.timestamp() < 0 {
        i64::MIN
    } else {
        i64::MAX
    })
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_clock_starts_at_epoch() {
        let clock = MockClock::new();
        assert_eq!(to_nanos(clock.now()), 0);
    }

    #[test]
    fn test_mock_clock_add() {
        let clock = MockClock::new();
        clock.add(Duration::from_secs(60));
        clock.add(Duration::from_nanos(1));
        assert_eq!(to_nanos(clock.now()), 60_000_000_001);
    }

    #[test]
    fn test_mock_clock_set() {
        let clock = MockClock::new();
        let instant = Utc.timestamp_nanos(1_700_000_000_000_000_000);
        clock.set(instant);
        assert_eq!(clock.now(), instant);
    }

    #[test]
    fn test_system_clock_moves_forward() {
        let clock = SystemClock;
        let first = clock.now();
        let second = clock.now();
        assert!(second >= first);
    }
}
