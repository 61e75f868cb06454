//! Retry with exponential backoff
//!
//! Transient upstream failures (rate limiting, 5xx, network errors) are
//! retried a bounded number of times with exponentially growing delays.
//! This lives with the clients, never in the cache layer, so cache tests
//! can substitute collaborator stubs with instant retries.

use std::future::Future;
use std::time::Duration;

use super::UpstreamError;
use crate::config::RetryConfig;

/// Retry policy parameters
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the initial attempt)
    pub max_attempts: u32,
    /// Delay before the first retry, in milliseconds
    pub initial_backoff_ms: u64,
    /// Growth factor between consecutive delays
    pub backoff_multiplier: u32,
    /// Cap on any single delay, in milliseconds
    pub max_backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 1000,
            backoff_multiplier: 2,
            max_backoff_ms: 8000,
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            initial_backoff_ms: config.initial_backoff_ms,
            backoff_multiplier: config.backoff_multiplier,
            max_backoff_ms: config.max_backoff_ms,
        }
    }
}

impl RetryPolicy {
    /// A policy that never sleeps and never retries, for tests
    pub fn no_retries() -> Self {
        Self {
            max_attempts: 1,
            initial_backoff_ms: 0,
            backoff_multiplier: 1,
            max_backoff_ms: 0,
        }
    }

    /// Delay to wait before the given attempt (0 = first attempt, no delay)
    pub fn backoff_duration(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::from_millis(0);
        }

        // initial_backoff * multiplier^(attempt-1), capped
        let backoff_ms = self
            .initial_backoff_ms
            .saturating_mul((self.backoff_multiplier as u64).saturating_pow(attempt - 1))
            .min(self.max_backoff_ms);

        Duration::from_millis(backoff_ms)
    }

    /// Whether the given failure on the given attempt warrants a retry
    pub fn should_retry(&self, attempt: u32, err: &UpstreamError) -> bool {
        if attempt + 1 >= self.max_attempts {
            return false;
        }
        err.is_transient()
    }
}

/// Run `op`, retrying transient failures per the policy
pub async fn retry_with_backoff<T, F, Fut>(policy: &RetryPolicy, mut op: F) -> Result<T, UpstreamError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, UpstreamError>>,
{
    let mut attempt: u32 = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if policy.should_retry(attempt, &err) => {
                let delay = policy.backoff_duration(attempt + 1);
                tracing::debug!(
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "transient upstream error, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}
