//! Injectable time source
//!
//! Cache expiry and quota rollovers are all driven by wall-clock time.
//! Components take an `Arc<dyn Clock>` instead of calling `SystemTime::now()`
//! directly so tests can advance time deterministically.

use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Source of the current time.
///
/// `now()` feeds cache-entry timestamps; `now_utc()` feeds the quota
/// tracker's calendar arithmetic. Both views must agree on the instant.
pub trait Clock: Send + Sync {
    /// Current instant as a `SystemTime`
    fn now(&self) -> SystemTime;

    /// Current instant in UTC calendar time
    fn now_utc(&self) -> DateTime<Utc> {
        let since_epoch = self
            .now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO);
        Utc.timestamp_opt(since_epoch.as_secs() as i64, since_epoch.subsec_nanos())
            .single()
            .unwrap_or_else(Utc::now)
    }
}

/// Real wall-clock time
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// Manually advanced clock for tests
///
/// Starts at an arbitrary fixed instant; `advance()` moves it forward.
pub struct ManualClock {
    current: Mutex<SystemTime>,
}

impl ManualClock {
    /// Create a manual clock starting at the given instant
    pub fn starting_at(start: SystemTime) -> Self {
        Self {
            current: Mutex::new(start),
        }
    }

    /// Create a manual clock starting at the current real time
    pub fn starting_now() -> Self {
        Self::starting_at(SystemTime::now())
    }

    /// Move the clock forward by `delta`
    pub fn advance(&self, delta: Duration) {
        let mut current = self.current.lock();
        *current += delta;
    }

    /// Set the clock to an absolute instant
    pub fn set(&self, instant: SystemTime) {
        *self.current.lock() = instant;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> SystemTime {
        *self.current.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_clock_tracks_real_time() {
        let clock = SystemClock;
        let before = SystemTime::now();
        let observed = clock.now();
        let after = SystemTime::now();
        assert!(observed >= before);
        assert!(observed <= after);
    }

    #[test]
    fn test_manual_clock_stays_put_until_advanced() {
        let clock = ManualClock::starting_now();
        let first = clock.now();
        let second = clock.now();
        assert_eq!(first, second);
    }

    #[test]
    fn test_manual_clock_advance_moves_forward() {
        let clock = ManualClock::starting_now();
        let start = clock.now();
        clock.advance(Duration::from_secs(3600));
        assert_eq!(clock.now(), start + Duration::from_secs(3600));
    }

    #[test]
    fn test_utc_view_agrees_with_system_time_view() {
        let epoch_plus_day = UNIX_EPOCH + Duration::from_secs(86_400);
        let clock = ManualClock::starting_at(epoch_plus_day);
        let utc = clock.now_utc();
        assert_eq!(utc.timestamp(), 86_400);
    }
}
