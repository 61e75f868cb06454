//! Generic cache store
//!
//! The central keyed store used for recipe lists, video lists, and generic
//! API responses:
//! - TTL-based expiry with lazy eviction and a periodic background sweep
//! - Tag-indexed bulk invalidation
//! - In-flight request deduplication: N concurrent callers for the same
//!   cold key produce exactly one loader invocation and all receive the
//!   same settled result
//! - Hit/miss statistics and hot-key introspection

use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

use super::entry::CacheEntry;
use super::stats::{CacheStats, HotKey};
use crate::clock::Clock;

/// Insertion options for a cache entry
#[derive(Debug, Clone, Default)]
pub struct CacheOptions {
    /// Time-to-live; the store default applies when `None`
    pub ttl: Option<Duration>,
    /// Tags for bulk invalidation
    pub tags: Vec<String>,
}

impl CacheOptions {
    /// Options with an explicit TTL in seconds and no tags
    pub fn ttl_seconds(seconds: u64) -> Self {
        Self {
            ttl: Some(Duration::from_secs(seconds)),
            tags: Vec::new(),
        }
    }

    /// Attach invalidation tags
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }
}

/// Why a cache load did not produce fresh data
///
/// Cloneable so a single settled failure can be handed to every caller
/// attached to the same in-flight load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    /// Quota policy chose to skip the fresh call; not a failure
    QuotaDeferred,
    /// The upstream call failed after its own retry budget was exhausted
    Upstream(String),
}

impl std::fmt::Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadError::QuotaDeferred => write!(f, "fresh call deferred by quota policy"),
            LoadError::Upstream(msg) => write!(f, "upstream failure: {}", msg),
        }
    }
}

impl std::error::Error for LoadError {}

/// How a `get_or_load` call was satisfied
#[derive(Debug, Clone)]
pub enum Fetched<T> {
    /// Served from a live cached entry
    Hit(T),
    /// Produced by this call's (or a deduplicated sibling's) loader
    Loaded(T),
}

impl<T> Fetched<T> {
    /// Unwrap the payload regardless of provenance
    pub fn into_value(self) -> T {
        match self {
            Fetched::Hit(v) | Fetched::Loaded(v) => v,
        }
    }

    /// True when served from cache without invoking a loader
    pub fn was_hit(&self) -> bool {
        matches!(self, Fetched::Hit(_))
    }
}

/// A value read past its TTL for fallback purposes
#[derive(Debug, Clone)]
pub struct StaleValue<T> {
    /// The stored payload, possibly expired
    pub value: T,
    /// Whether the entry's TTL has elapsed
    pub is_expired: bool,
    /// Entry age
    pub age: Duration,
}

type PendingResult<T> = Option<Result<T, LoadError>>;

struct StoreInner<T> {
    entries: HashMap<String, CacheEntry<T>>,
    tag_index: HashMap<String, HashSet<String>>,
    version: u64,
    hits: u64,
    misses: u64,
}

impl<T> StoreInner<T> {
    /// Remove an entry and prune its key from every tag set it was
    /// inserted under. Tag sets that become empty are dropped.
    fn remove_entry(&mut self, key: &str) -> bool {
        match self.entries.remove(key) {
            Some(entry) => {
                for tag in &entry.tags {
                    if let Some(keys) = self.tag_index.get_mut(tag) {
                        keys.remove(key);
                        if keys.is_empty() {
                            self.tag_index.remove(tag);
                        }
                    }
                }
                true
            }
            None => false,
        }
    }
}

/// Typed, TTL-expiring, tag-indexed cache store with request deduplication
pub struct CacheStore<T> {
    name: String,
    inner: RwLock<StoreInner<T>>,
    pending: Mutex<HashMap<String, watch::Receiver<PendingResult<T>>>>,
    default_ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl<T> CacheStore<T>
where
    T: Clone + Serialize + Send + Sync + 'static,
{
    /// Create a new store with the given default TTL
    pub fn new(name: impl Into<String>, default_ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            name: name.into(),
            inner: RwLock::new(StoreInner {
                entries: HashMap::new(),
                tag_index: HashMap::new(),
                version: 1,
                hits: 0,
                misses: 0,
            }),
            pending: Mutex::new(HashMap::new()),
            default_ttl,
            clock,
        }
    }

    /// Store name, used in log output
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the live value for `key`, recording a hit or a miss
    ///
    /// An expired entry counts as a miss and is evicted lazily.
    pub fn get(&self, key: &str) -> Option<T> {
        let now = self.clock.now();
        let mut guard = self.inner.write();
        let inner = &mut *guard;

        let mut found_expired = false;
        let mut value = None;
        if let Some(entry) = inner.entries.get_mut(key) {
            if entry.is_expired(now) {
                found_expired = true;
            } else {
                entry.hit_count += 1;
                value = Some(entry.value.clone());
            }
        }

        match value {
            Some(v) => {
                inner.hits += 1;
                Some(v)
            }
            None => {
                if found_expired {
                    inner.remove_entry(key);
                }
                inner.misses += 1;
                None
            }
        }
    }

    /// Non-counting read used for the post-lock double check in
    /// `get_or_load`; does not touch statistics or evict.
    fn peek(&self, key: &str) -> Option<T> {
        let now = self.clock.now();
        let inner = self.inner.read();
        inner
            .entries
            .get(key)
            .filter(|entry| !entry.is_expired(now))
            .map(|entry| entry.value.clone())
    }

    /// Get the cached value, or populate it through `loader` with
    /// in-flight deduplication
    ///
    /// If another call is already loading `key`, this call attaches to it
    /// and receives the same settled result (value or error) without
    /// invoking `loader`. On loader success the value is stored with the
    /// given options; on failure the key is left absent so the next call
    /// retries.
    pub async fn get_or_load<F, Fut>(
        &self,
        key: &str,
        options: CacheOptions,
        loader: F,
    ) -> Result<Fetched<T>, LoadError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, LoadError>>,
    {
        if let Some(value) = self.get(key) {
            return Ok(Fetched::Hit(value));
        }

        enum Role<T> {
            Leader(watch::Sender<PendingResult<T>>),
            Follower(watch::Receiver<PendingResult<T>>),
        }

        let role = {
            let mut pending = self.pending.lock();
            if let Some(rx) = pending.get(key) {
                Role::Follower(rx.clone())
            } else {
                // A previous leader may have settled between our miss and
                // acquiring the pending lock; serve its result if so.
                if let Some(value) = self.peek(key) {
                    return Ok(Fetched::Hit(value));
                }
                let (tx, rx) = watch::channel(None);
                pending.insert(key.to_string(), rx);
                Role::Leader(tx)
            }
        };

        match role {
            Role::Follower(mut rx) => {
                let settled = rx.wait_for(|result| result.is_some()).await;
                match settled {
                    Ok(guard) => match (*guard).clone() {
                        Some(Ok(value)) => Ok(Fetched::Loaded(value)),
                        Some(Err(err)) => Err(err),
                        // wait_for only returns when the value is Some
                        None => Err(LoadError::Upstream("load interrupted".to_string())),
                    },
                    // Leader dropped without settling (task aborted)
                    Err(_) => Err(LoadError::Upstream("load interrupted".to_string())),
                }
            }
            Role::Leader(tx) => {
                let result = loader().await;
                if let Ok(value) = &result {
                    self.set_with(key, value.clone(), &options);
                }
                {
                    let mut pending = self.pending.lock();
                    pending.remove(key);
                }
                // Followers hold their own receiver clones; ignore the
                // send error when none are attached.
                let _ = tx.send(Some(result.clone()));
                result.map(Fetched::Loaded)
            }
        }
    }

    /// Unconditionally insert or overwrite an entry
    pub fn set(&self, key: &str, value: T, options: CacheOptions) {
        self.set_with(key, value, &options);
    }

    fn set_with(&self, key: &str, value: T, options: &CacheOptions) {
        let now = self.clock.now();
        let ttl = options.ttl.unwrap_or(self.default_ttl);
        let mut inner = self.inner.write();

        // Replacing an entry must not leave the old tag memberships behind
        inner.remove_entry(key);

        let version = inner.version;
        let entry = CacheEntry::new(value, now, ttl, version, options.tags.clone());
        for tag in &options.tags {
            inner
                .tag_index
                .entry(tag.clone())
                .or_default()
                .insert(key.to_string());
        }
        inner.entries.insert(key.to_string(), entry);
    }

    /// True if `key` is present and unexpired; lazily evicts when expired
    pub fn has(&self, key: &str) -> bool {
        let now = self.clock.now();
        let mut inner = self.inner.write();
        let live = inner.entries.get(key).map(|entry| !entry.is_expired(now));
        match live {
            Some(true) => true,
            Some(false) => {
                inner.remove_entry(key);
                false
            }
            None => false,
        }
    }

    /// Delete one entry; returns whether it existed
    pub fn delete(&self, key: &str) -> bool {
        self.inner.write().remove_entry(key)
    }

    /// Wipe every entry and the whole tag index
    pub fn clear(&self) {
        let mut inner = self.inner.write();
        inner.entries.clear();
        inner.tag_index.clear();
    }

    /// Delete every key indexed under `tag`; returns the number of live
    /// entries removed
    ///
    /// Index membership is verified against the store, so a residual key
    /// in the tag set can never produce a false delete count.
    pub fn clear_tag(&self, tag: &str) -> usize {
        let mut inner = self.inner.write();
        let keys: Vec<String> = match inner.tag_index.remove(tag) {
            Some(keys) => keys.into_iter().collect(),
            None => return 0,
        };

        let mut removed = 0;
        for key in keys {
            if inner.remove_entry(&key) {
                removed += 1;
            }
        }
        removed
    }

    /// Bump the store version, then clear (everything, or one tag)
    ///
    /// The version has no enforcement effect; it is reported so operators
    /// can tell entries written under a superseded generation.
    pub fn invalidate(&self, tag: Option<&str>) {
        {
            let mut inner = self.inner.write();
            inner.version += 1;
        }
        match tag {
            Some(tag) => {
                self.clear_tag(tag);
            }
            None => self.clear(),
        }
    }

    /// Current store version
    pub fn version(&self) -> u64 {
        self.inner.read().version
    }

    /// Statistics snapshot
    pub fn stats(&self) -> CacheStats {
        let now = self.clock.now();
        let inner = self.inner.read();

        let entry_count = inner.entries.len();
        let mut total_size = 0usize;
        let mut total_age = Duration::ZERO;
        for entry in inner.entries.values() {
            total_size += entry.size_estimate;
            total_age += entry.age(now);
        }
        let average_age_seconds = if entry_count > 0 {
            (total_age.as_secs_f64() / entry_count as f64).round() as u64
        } else {
            0
        };

        CacheStats {
            hits: inner.hits,
            misses: inner.misses,
            hit_rate: CacheStats::rate(inner.hits, inner.misses),
            entry_count,
            total_size_estimate: total_size,
            average_age_seconds,
        }
    }

    /// Zero the hit/miss counters, leaving entries untouched
    pub fn reset_stats(&self) {
        let mut inner = self.inner.write();
        inner.hits = 0;
        inner.misses = 0;
    }

    /// Most-accessed live entries, descending by hit count
    pub fn hot_keys(&self, limit: usize) -> Vec<HotKey> {
        let now = self.clock.now();
        let inner = self.inner.read();
        let mut rows: Vec<HotKey> = inner
            .entries
            .iter()
            .map(|(key, entry)| HotKey {
                key: key.clone(),
                hits: entry.hit_count,
                age_seconds: entry.age(now).as_secs(),
            })
            .collect();
        rows.sort_by(|a, b| b.hits.cmp(&a.hits));
        rows.truncate(limit);
        rows
    }

    /// Read a value ignoring its TTL
    ///
    /// The one sanctioned stale read, used by the fallback resolver when a
    /// refresh was skipped or failed. Does not touch statistics.
    pub fn get_stale(&self, key: &str) -> Option<StaleValue<T>> {
        let now = self.clock.now();
        let inner = self.inner.read();
        inner.entries.get(key).map(|entry| StaleValue {
            value: entry.value.clone(),
            is_expired: entry.is_expired(now),
            age: entry.age(now),
        })
    }

    /// Evict every expired entry now; returns the number removed
    ///
    /// The backstop for keys that are never read again after expiry.
    pub fn sweep(&self) -> usize {
        let now = self.clock.now();
        let mut inner = self.inner.write();
        let expired: Vec<String> = inner
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect();

        let mut removed = 0;
        for key in &expired {
            if inner.remove_entry(key) {
                removed += 1;
            }
        }
        drop(inner);

        if removed > 0 {
            tracing::info!(cache = %self.name, removed, "sweep removed expired entries");
        }
        removed
    }

    /// Start the periodic background sweep for this store
    ///
    /// Runs until the returned handle is stopped or dropped. The task only
    /// performs deletions and never blocks lookups beyond the store lock.
    pub fn spawn_sweeper(self: &Arc<Self>, interval: Duration) -> SweeperHandle {
        let store = Arc::clone(self);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // interval fires immediately on the first tick
            ticker.tick().await;
            loop {
                ticker.tick().await;
                store.sweep();
            }
        });
        SweeperHandle { handle }
    }
}

/// Owner handle for a store's background sweep task
///
/// Stopping (or dropping) the handle tears the timer down so tests and
/// shutdown paths don't leak a recurring task.
pub struct SweeperHandle {
    handle: tokio::task::JoinHandle<()>,
}

impl SweeperHandle {
    /// Stop the background sweep
    pub fn stop(&self) {
        self.handle.abort();
    }
}

impl Drop for SweeperHandle {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
