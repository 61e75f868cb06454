//! Upstream quota tracking
//!
//! The video-search upstream imposes a hard daily request budget (units,
//! not requests: one search costs 100 units). This module is the
//! accounting gate consulted before every chargeable call: it tracks
//! daily and per-hour consumption, rolls the counters at UTC midnight and
//! on each wall-clock hour, and answers whether a fresh call is permitted
//! or should be downgraded to a cached/fallback answer.
//!
//! It knows nothing about what is being fetched.

use chrono::{DateTime, Days, NaiveTime, TimeZone, Timelike, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;

use crate::clock::Clock;

/// Fraction of the daily budget above which status is `warning`
const WARNING_THRESHOLD: f64 = 0.80;
/// Fraction of the daily budget above which status is `critical` and
/// fresh calls are refused
const CRITICAL_THRESHOLD: f64 = 0.95;

/// Graduated budget status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QuotaLevel {
    Ok,
    Warning,
    Critical,
}

/// Snapshot of quota consumption for reporting
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaStatus {
    /// Units consumed since the last daily reset
    pub used: u64,
    /// Daily budget in units
    pub limit: u64,
    /// Units left before the daily budget is exhausted
    pub remaining: u64,
    /// `used / limit` as a percentage, rounded to two decimals
    pub percent_used: f64,
    /// Units consumed in the current wall-clock hour
    pub hourly_used: u64,
    /// Per-hour share of the daily budget
    pub hourly_limit: u64,
    /// Graduated status against the thresholds
    pub status: QuotaLevel,
}

struct QuotaState {
    daily_used: u64,
    daily_reset_at: DateTime<Utc>,
    hourly_used: [u64; 24],
    last_hour: u32,
}

/// Hour/day budget accounting for one upstream
pub struct QuotaTracker {
    daily_limit: u64,
    state: Mutex<QuotaState>,
    clock: Arc<dyn Clock>,
}

fn next_utc_midnight(now: DateTime<Utc>) -> DateTime<Utc> {
    let next_day = now.date_naive() + Days::new(1);
    Utc.from_utc_datetime(&next_day.and_time(NaiveTime::MIN))
}

impl QuotaTracker {
    /// Create a tracker with the given daily budget
    pub fn new(daily_limit: u64, clock: Arc<dyn Clock>) -> Self {
        let now = clock.now_utc();
        Self {
            daily_limit,
            state: Mutex::new(QuotaState {
                daily_used: 0,
                daily_reset_at: next_utc_midnight(now),
                hourly_used: [0; 24],
                last_hour: now.hour(),
            }),
            clock,
        }
    }

    /// Per-hour share of the daily budget
    pub fn hourly_limit(&self) -> u64 {
        self.daily_limit / 24
    }

    fn roll(&self, state: &mut QuotaState, now: DateTime<Utc>) {
        // Daily rollover: zero everything and advance the boundary by 24h
        // (stepped, so multi-day idle gaps land on the right boundary)
        while now >= state.daily_reset_at {
            state.daily_used = 0;
            state.hourly_used = [0; 24];
            state.daily_reset_at = state.daily_reset_at + Days::new(1);
        }

        // Hour advance: only the newly entered hour's bucket is zeroed;
        // earlier hours keep their history for reporting
        let hour = now.hour();
        if hour != state.last_hour {
            state.hourly_used[hour as usize] = 0;
            state.last_hour = hour;
        }
    }

    /// Charge `cost` units against the daily and current-hour budgets
    pub fn record_usage(&self, cost: u64) {
        let now = self.clock.now_utc();
        let mut state = self.state.lock();
        self.roll(&mut state, now);
        state.daily_used = state.daily_used.saturating_add(cost);
        let hour = state.last_hour as usize;
        state.hourly_used[hour] = state.hourly_used[hour].saturating_add(cost);
    }

    /// Whether spending `cost` units now is permitted
    ///
    /// Refused when the spend would cross the critical threshold, or when
    /// the current hour's bucket lacks headroom for it; the caller should
    /// then prefer a cached or fallback answer.
    pub fn can_spend(&self, cost: u64) -> bool {
        let now = self.clock.now_utc();
        let mut state = self.state.lock();
        self.roll(&mut state, now);

        let critical_units = (self.daily_limit as f64 * CRITICAL_THRESHOLD) as u64;
        if state.daily_used.saturating_add(cost) > critical_units {
            return false;
        }

        let hour_used = state.hourly_used[state.last_hour as usize];
        let headroom = self.hourly_limit().saturating_sub(hour_used);
        headroom >= cost.max(1)
    }

    /// Consumption snapshot
    pub fn status(&self) -> QuotaStatus {
        let now = self.clock.now_utc();
        let mut state = self.state.lock();
        self.roll(&mut state, now);

        let used = state.daily_used;
        let limit = self.daily_limit;
        let percent_used = if limit == 0 {
            0.0
        } else {
            ((used as f64 / limit as f64) * 10_000.0).round() / 100.0
        };

        let status = if percent_used > CRITICAL_THRESHOLD * 100.0 {
            QuotaLevel::Critical
        } else if percent_used > WARNING_THRESHOLD * 100.0 {
            QuotaLevel::Warning
        } else {
            QuotaLevel::Ok
        };

        QuotaStatus {
            used,
            limit,
            remaining: limit.saturating_sub(used),
            percent_used,
            hourly_used: state.hourly_used[state.last_hour as usize],
            hourly_limit: self.hourly_limit(),
            status,
        }
    }

    /// Next daily reset boundary (UTC midnight)
    pub fn daily_reset_at(&self) -> DateTime<Utc> {
        self.state.lock().daily_reset_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    // 2023-11-14 22:13:20 UTC
    const BASE_SECS: u64 = 1_700_000_000;

    fn tracker(limit: u64) -> (QuotaTracker, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::starting_at(
            UNIX_EPOCH + Duration::from_secs(BASE_SECS),
        ));
        (QuotaTracker::new(limit, clock.clone()), clock)
    }

    #[test]
    fn test_fresh_tracker_is_ok_and_unspent() {
        let (tracker, _clock) = tracker(10_000);
        let status = tracker.status();
        assert_eq!(status.used, 0);
        assert_eq!(status.limit, 10_000);
        assert_eq!(status.remaining, 10_000);
        assert_eq!(status.status, QuotaLevel::Ok);
    }

    #[test]
    fn test_record_usage_accumulates() {
        let (tracker, _clock) = tracker(10_000);
        tracker.record_usage(100);
        tracker.record_usage(100);
        let status = tracker.status();
        assert_eq!(status.used, 200);
        assert_eq!(status.hourly_used, 200);
        assert_eq!(status.percent_used, 2.0);
    }

    #[test]
    fn test_status_critical_above_95_percent() {
        let (tracker, _clock) = tracker(10_000);
        tracker.record_usage(9_600);
        assert_eq!(tracker.status().status, QuotaLevel::Critical);
    }

    #[test]
    fn test_status_warning_above_80_percent() {
        let (tracker, _clock) = tracker(10_000);
        tracker.record_usage(8_100);
        assert_eq!(tracker.status().status, QuotaLevel::Warning);
    }

    #[test]
    fn test_status_ok_at_80_percent_boundary() {
        let (tracker, _clock) = tracker(10_000);
        tracker.record_usage(8_000);
        assert_eq!(tracker.status().status, QuotaLevel::Ok);
    }

    #[test]
    fn test_can_spend_refuses_past_critical_threshold() {
        let (tracker, _clock) = tracker(10_000);
        tracker.record_usage(9_450);
        // 9450 + 100 > 9500: refused
        assert!(!tracker.can_spend(100));
        // A smaller spend still fits
        assert!(tracker.can_spend(50));
    }

    #[test]
    fn test_can_spend_refuses_when_hour_bucket_exhausted() {
        let (tracker, _clock) = tracker(10_000);
        // Hourly share is 416; burn through it within the hour
        tracker.record_usage(400);
        assert!(!tracker.can_spend(100));
        assert!(tracker.can_spend(10));
    }

    #[test]
    fn test_hour_advance_reopens_hourly_budget() {
        let (tracker, clock) = tracker(10_000);
        tracker.record_usage(416);
        assert!(!tracker.can_spend(100));

        clock.advance(Duration::from_secs(3_600));
        assert!(tracker.can_spend(100));
        // Daily consumption is unaffected by the hour advance
        assert_eq!(tracker.status().used, 416);
    }

    #[test]
    fn test_daily_rollover_resets_usage() {
        let (tracker, clock) = tracker(10_000);
        tracker.record_usage(9_600);
        let reset_at = tracker.daily_reset_at();

        // Step past UTC midnight
        let now = SystemTime::UNIX_EPOCH + Duration::from_secs(BASE_SECS);
        let until_reset = Duration::from_secs(
            (reset_at.timestamp() as u64) - BASE_SECS,
        );
        clock.set(now + until_reset + Duration::from_secs(1));

        let status = tracker.status();
        assert_eq!(status.used, 0);
        assert_eq!(status.status, QuotaLevel::Ok);
        // Boundary advanced by exactly 24h
        assert_eq!(
            tracker.daily_reset_at(),
            reset_at + chrono::Duration::days(1)
        );
    }

    #[test]
    fn test_multi_day_gap_lands_on_correct_boundary() {
        let (tracker, clock) = tracker(10_000);
        tracker.record_usage(500);
        clock.advance(Duration::from_secs(3 * 86_400));

        let status = tracker.status();
        assert_eq!(status.used, 0);
        let reset_at = tracker.daily_reset_at();
        assert!(reset_at > tracker.clock.now_utc());
        assert!(reset_at <= tracker.clock.now_utc() + chrono::Duration::days(1));
    }

    #[test]
    fn test_status_serializes_camel_case() {
        let (tracker, _clock) = tracker(10_000);
        tracker.record_usage(100);
        let json = serde_json::to_string(&tracker.status()).unwrap();
        assert!(json.contains("percentUsed"));
        assert!(json.contains("hourlyUsed"));
        assert!(json.contains("hourlyLimit"));
        assert!(json.contains("\"status\":\"ok\""));
    }
}
