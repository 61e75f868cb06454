//! Cache statistics types
//!
//! This module provides structures for reporting cache performance:
//! - `CacheStats`: aggregate hit/miss counters and sizing
//! - `HotKey`: per-key access counts for "hot key" introspection

use serde::Serialize;

/// Cache statistics for monitoring
///
/// Serialized in camelCase to match the admin API wire format.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    /// Number of cache hits since the last reset
    pub hits: u64,
    /// Number of cache misses since the last reset
    pub misses: u64,
    /// Hit rate as a percentage (0-100), rounded to two decimals
    pub hit_rate: f64,
    /// Current number of live entries
    pub entry_count: usize,
    /// Sum of per-entry serialized size estimates, in bytes
    pub total_size_estimate: usize,
    /// Average entry age in whole seconds
    pub average_age_seconds: u64,
}

impl CacheStats {
    /// Compute the percentage hit rate from raw counters
    pub fn rate(hits: u64, misses: u64) -> f64 {
        let total = hits + misses;
        if total == 0 {
            0.0
        } else {
            let rate = (hits as f64 / total as f64) * 100.0;
            (rate * 100.0).round() / 100.0
        }
    }
}

/// One row of hot-key output, most-accessed keys first
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HotKey {
    /// The cache key
    pub key: String,
    /// Reads served from this entry
    pub hits: u64,
    /// Entry age in seconds
    pub age_seconds: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_zero_when_no_requests() {
        assert_eq!(CacheStats::rate(0, 0), 0.0);
    }

    #[test]
    fn test_rate_is_a_percentage() {
        assert_eq!(CacheStats::rate(80, 20), 80.0);
        assert_eq!(CacheStats::rate(1, 1), 50.0);
        assert_eq!(CacheStats::rate(100, 0), 100.0);
    }

    #[test]
    fn test_rate_rounds_to_two_decimals() {
        // 1/3 = 33.333...% -> 33.33
        assert_eq!(CacheStats::rate(1, 2), 33.33);
        // 2/3 = 66.666...% -> 66.67
        assert_eq!(CacheStats::rate(2, 1), 66.67);
    }

    #[test]
    fn test_stats_serialize_camel_case() {
        let stats = CacheStats {
            hits: 10,
            misses: 5,
            hit_rate: 66.67,
            entry_count: 3,
            total_size_estimate: 2048,
            average_age_seconds: 12,
        };
        let json = serde_json::to_string(&stats).unwrap();
        assert!(json.contains("hitRate"));
        assert!(json.contains("entryCount"));
        assert!(json.contains("totalSizeEstimate"));
        assert!(json.contains("averageAgeSeconds"));
    }

    #[test]
    fn test_hot_key_serializes_camel_case() {
        let hot = HotKey {
            key: "recipes:all".to_string(),
            hits: 42,
            age_seconds: 7,
        };
        let json = serde_json::to_string(&hot).unwrap();
        assert!(json.contains("ageSeconds"));
        assert!(json.contains("recipes:all"));
    }
}
