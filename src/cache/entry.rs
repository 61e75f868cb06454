//! Cache entry types and key helpers
//!
//! This module defines the core cache entry structure:
//! - `CacheEntry<T>`: a cached payload with metadata for TTL expiry,
//!   hit accounting, and tag-based invalidation
//! - `cache_key` / `batch_cache_key`: helpers for building colon-joined keys

use serde::Serialize;
use std::time::{Duration, SystemTime};

/// A single cached payload with its bookkeeping metadata
///
/// The payload is owned exclusively by the entry once stored. An entry is
/// either absent from the store or satisfies `expires_at > created_at`;
/// lookups treat an expired entry as absent.
#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    /// The cached payload
    pub value: T,
    /// When this entry was created
    pub created_at: SystemTime,
    /// When this entry expires
    pub expires_at: SystemTime,
    /// Number of successful reads served from this entry
    pub hit_count: u64,
    /// Serialized size of the payload at insertion time, for reporting
    pub size_estimate: usize,
    /// Store-wide version at insertion time (informational)
    pub version: u64,
    /// Tags this entry was inserted under, kept for eager index pruning
    pub tags: Vec<String>,
}

impl<T: Serialize> CacheEntry<T> {
    /// Create a new entry expiring `ttl` after `now`
    ///
    /// The size estimate is the serialized JSON length of the payload;
    /// a payload that fails to serialize is counted as zero bytes.
    pub fn new(value: T, now: SystemTime, ttl: Duration, version: u64, tags: Vec<String>) -> Self {
        let size_estimate = serde_json::to_string(&value).map(|s| s.len()).unwrap_or(0);
        // Guarantee expires_at > created_at even for a zero TTL
        let ttl = ttl.max(Duration::from_millis(1));

        Self {
            value,
            created_at: now,
            expires_at: now + ttl,
            hit_count: 0,
            size_estimate,
            version,
            tags,
        }
    }
}

impl<T> CacheEntry<T> {
    /// Check whether this entry has expired as of `now`
    pub fn is_expired(&self, now: SystemTime) -> bool {
        now >= self.expires_at
    }

    /// Age of this entry as of `now`
    pub fn age(&self, now: SystemTime) -> Duration {
        now.duration_since(self.created_at).unwrap_or(Duration::ZERO)
    }
}

/// Join non-empty key parts with `:`
///
/// `cache_key(&["recipes", "all"])` -> `"recipes:all"`
pub fn cache_key(parts: &[&str]) -> String {
    parts
        .iter()
        .filter(|p| !p.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(":")
}

/// Build a batch key from a prefix and an unordered id set
///
/// Ids are sorted so the same set always produces the same key.
pub fn batch_cache_key(prefix: &str, ids: &[&str], suffix: Option<&str>) -> String {
    let mut sorted: Vec<&str> = ids.to_vec();
    sorted.sort_unstable();
    let joined = sorted.join(",");
    match suffix {
        Some(s) => format!("{}:batch:{}:{}", prefix, joined, s),
        None => format!("{}:batch:{}", prefix, joined),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000)
    }

    #[test]
    fn test_new_entry_expires_after_ttl() {
        let entry = CacheEntry::new("hello", now(), Duration::from_secs(3600), 1, vec![]);
        assert_eq!(entry.expires_at, now() + Duration::from_secs(3600));
        assert_eq!(entry.created_at, now());
    }

    #[test]
    fn test_entry_not_expired_before_ttl() {
        let entry = CacheEntry::new("hello", now(), Duration::from_secs(60), 1, vec![]);
        assert!(!entry.is_expired(now() + Duration::from_secs(59)));
    }

    #[test]
    fn test_entry_expired_at_and_after_ttl() {
        let entry = CacheEntry::new("hello", now(), Duration::from_secs(60), 1, vec![]);
        assert!(entry.is_expired(now() + Duration::from_secs(60)));
        assert!(entry.is_expired(now() + Duration::from_secs(61)));
    }

    #[test]
    fn test_zero_ttl_still_satisfies_expiry_invariant() {
        let entry = CacheEntry::new("hello", now(), Duration::ZERO, 1, vec![]);
        assert!(entry.expires_at > entry.created_at);
    }

    #[test]
    fn test_size_estimate_reflects_serialized_payload() {
        let entry = CacheEntry::new(vec!["a", "b"], now(), Duration::from_secs(60), 1, vec![]);
        // ["a","b"] is 9 bytes of JSON
        assert_eq!(entry.size_estimate, 9);
    }

    #[test]
    fn test_entry_age() {
        let entry = CacheEntry::new("x", now(), Duration::from_secs(3600), 1, vec![]);
        assert_eq!(
            entry.age(now() + Duration::from_secs(120)),
            Duration::from_secs(120)
        );
    }

    #[test]
    fn test_entry_records_tags_and_version() {
        let entry = CacheEntry::new(
            "x",
            now(),
            Duration::from_secs(60),
            7,
            vec!["recipes".to_string()],
        );
        assert_eq!(entry.version, 7);
        assert_eq!(entry.tags, vec!["recipes".to_string()]);
        assert_eq!(entry.hit_count, 0);
    }

    #[test]
    fn test_cache_key_joins_parts_with_colons() {
        assert_eq!(cache_key(&["recipes", "all"]), "recipes:all");
        assert_eq!(cache_key(&["videos", "search", "pasta"]), "videos:search:pasta");
    }

    #[test]
    fn test_cache_key_skips_empty_parts() {
        assert_eq!(cache_key(&["videos", "", "featured"]), "videos:featured");
    }

    #[test]
    fn test_batch_cache_key_sorts_ids() {
        let key = batch_cache_key("recipe", &["zucchini-bake", "apple-pie"], None);
        assert_eq!(key, "recipe:batch:apple-pie,zucchini-bake");
    }

    #[test]
    fn test_batch_cache_key_with_suffix() {
        let key = batch_cache_key("recipe", &["a", "b"], Some("v2"));
        assert_eq!(key, "recipe:batch:a,b:v2");
    }
}
