//! Fallback resolution
//!
//! Decides what a caller ultimately receives after a refresh attempt, in
//! strict priority order: fresh data, then a stale cached copy (the one
//! place a read past TTL is sanctioned), then a built-in substitute.
//! Availability failures are absorbed here and never reach the end user;
//! every result carries a provenance label so callers and operators can
//! tell degraded service from normal service.
//!
//! The resolver never retries; retry-with-backoff belongs to the upstream
//! clients (`upstream::retry`).

use serde::Serialize;
use std::fmt;

use crate::cache::{LoadError, StaleValue};

/// Where a returned dataset came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Provenance {
    /// Fetched from the upstream during this request
    #[serde(rename = "fresh")]
    Fresh,
    /// Served from a live cache entry
    #[serde(rename = "cache")]
    Cache,
    /// Served from an expired cache entry because a refresh was skipped
    /// or failed
    #[serde(rename = "stale-cache")]
    StaleCache,
    /// Built-in substitute data; no upstream data was available at all
    #[serde(rename = "mock")]
    Substitute,
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Provenance::Fresh => "fresh",
            Provenance::Cache => "cache",
            Provenance::StaleCache => "stale-cache",
            Provenance::Substitute => "mock",
        };
        f.write_str(label)
    }
}

/// A dataset plus its provenance label
#[derive(Debug, Clone)]
pub struct Resolved<T> {
    pub value: T,
    pub source: Provenance,
}

/// How the refresh attempt for a key concluded
#[derive(Debug, Clone)]
pub enum RefreshOutcome<T> {
    /// Refresh ran and produced fresh (or confirmed-fresh) data
    Fetched(T),
    /// Quota policy skipped the fresh call
    Deferred,
    /// The upstream call failed after its own retry budget
    Failed(String),
}

impl<T> From<LoadError> for RefreshOutcome<T> {
    fn from(err: LoadError) -> Self {
        match err {
            LoadError::QuotaDeferred => RefreshOutcome::Deferred,
            LoadError::Upstream(msg) => RefreshOutcome::Failed(msg),
        }
    }
}

/// Pick the dataset to serve, in strict priority order
///
/// Returns `None` only when the refresh did not produce data, nothing
/// stale exists, and no substitute is configured.
pub fn resolve<T>(
    outcome: RefreshOutcome<T>,
    stale: Option<StaleValue<T>>,
    substitute: Option<T>,
) -> Option<Resolved<T>> {
    match outcome {
        RefreshOutcome::Fetched(value) => Some(Resolved {
            value,
            source: Provenance::Fresh,
        }),
        RefreshOutcome::Deferred | RefreshOutcome::Failed(_) => {
            if let RefreshOutcome::Failed(ref msg) = outcome {
                tracing::warn!(error = %msg, "refresh failed, falling back");
            }
            if let Some(stale) = stale {
                let source = if stale.is_expired {
                    Provenance::StaleCache
                } else {
                    Provenance::Cache
                };
                return Some(Resolved {
                    value: stale.value,
                    source,
                });
            }
            substitute.map(|value| Resolved {
                value,
                source: Provenance::Substitute,
            })
        }
    }
}
