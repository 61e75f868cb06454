//! Conditional-fetch cache
//!
//! Pairs cached payloads with the upstream's opaque cache validator (an
//! ETag in both reference upstreams) so a refresh can ask "has this
//! changed?" instead of re-downloading. An unchanged answer costs nothing
//! against the quota; only a fresh payload is chargeable.
//!
//! Slots are keyed: the repository keeps one validator per file path, the
//! video feed uses a single fixed key.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::SystemTime;

use crate::clock::Clock;

/// What the upstream answered to a conditional request
#[derive(Debug, Clone)]
pub enum ConditionalResponse<T> {
    /// Data unchanged since the presented validator; no payload returned
    NotModified,
    /// New data, with the validator to present next time
    Fresh {
        payload: T,
        validator: Option<String>,
    },
}

/// Outcome of a conditional refresh, from the caller's perspective
///
/// `NotModified` carries the previously stored payload (if any) so callers
/// can keep serving it; the caller must not charge quota for this branch.
#[derive(Debug, Clone)]
pub enum Refreshed<T> {
    NotModified { payload: Option<T> },
    Fresh { payload: T },
}

struct Slot<T> {
    payload: Option<T>,
    validator: Option<String>,
    last_fetched_at: Option<SystemTime>,
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Self {
            payload: None,
            validator: None,
            last_fetched_at: None,
        }
    }
}

/// Keyed validator-token cache
///
/// Exactly one validator is retained per key. A `NotModified` answer leaves
/// the stored payload untouched and refreshes only `last_fetched_at`, so
/// fallback logic can distinguish "confirmed fresh two minutes ago" from
/// "never reconfirmed, three hours old".
pub struct ConditionalCache<T> {
    slots: Mutex<HashMap<String, Slot<T>>>,
    clock: Arc<dyn Clock>,
}

impl<T: Clone> ConditionalCache<T> {
    /// Create an empty conditional cache
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
            clock,
        }
    }

    /// The validator currently stored for `key`
    pub fn validator(&self, key: &str) -> Option<String> {
        self.slots
            .lock()
            .get(key)
            .and_then(|slot| slot.validator.clone())
    }

    /// The payload currently stored for `key`
    pub fn payload(&self, key: &str) -> Option<T> {
        self.slots
            .lock()
            .get(key)
            .and_then(|slot| slot.payload.clone())
    }

    /// When `key` was last fetched or reconfirmed against the upstream
    pub fn last_fetched_at(&self, key: &str) -> Option<SystemTime> {
        self.slots.lock().get(key).and_then(|slot| slot.last_fetched_at)
    }

    /// Drive one conditional upstream call for `key`
    ///
    /// The stored validator (or `None` on first call) is handed to `op`.
    /// Callers reach this through the store's deduplicated loader, so at
    /// most one refresh per key runs at a time.
    pub async fn refresh<F, Fut, E>(&self, key: &str, op: F) -> Result<Refreshed<T>, E>
    where
        F: FnOnce(Option<String>) -> Fut,
        Fut: Future<Output = Result<ConditionalResponse<T>, E>>,
    {
        let validator = self.validator(key);

        match op(validator).await? {
            ConditionalResponse::NotModified => {
                let now = self.clock.now();
                let mut slots = self.slots.lock();
                let slot = slots.entry(key.to_string()).or_default();
                slot.last_fetched_at = Some(now);
                Ok(Refreshed::NotModified {
                    payload: slot.payload.clone(),
                })
            }
            ConditionalResponse::Fresh { payload, validator } => {
                let now = self.clock.now();
                let mut slots = self.slots.lock();
                slots.insert(
                    key.to_string(),
                    Slot {
                        payload: Some(payload.clone()),
                        validator,
                        last_fetched_at: Some(now),
                    },
                );
                Ok(Refreshed::Fresh { payload })
            }
        }
    }

    /// Forget a single key's slot
    pub fn forget(&self, key: &str) {
        self.slots.lock().remove(key);
    }

    /// Drop every slot
    pub fn clear(&self) {
        self.slots.lock().clear();
    }
}
