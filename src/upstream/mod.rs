//! Upstream collaborators
//!
//! Abstract interfaces to the two external dependencies, plus the shared
//! error taxonomy and the bounded retry helper. The cache layer only ever
//! talks to these traits; concrete clients (`github`, `youtube`) own the
//! wire details, their own timeouts, and their own retry budget.

use async_trait::async_trait;
use thiserror::Error;

use crate::videos::{CookingVideo, VideoSet};

pub mod github;
pub mod retry;
pub mod youtube;

pub use retry::{retry_with_backoff, RetryPolicy};

/// Upstream failure taxonomy
///
/// Transient failures (rate limiting, 5xx, network) are retried by the
/// clients and, if retries exhaust, absorbed by the fallback resolver.
/// The rest propagate.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UpstreamError {
    /// Rate-limited by the upstream; retryable
    #[error("rate limited by upstream")]
    RateLimited,

    /// Upstream unavailable (5xx, connect failure, timeout); retryable
    #[error("upstream unavailable: {0}")]
    Unavailable(String),

    /// The requested resource does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// Credentials missing or rejected
    #[error("not configured: {0}")]
    NotConfigured(String),

    /// Response did not have the expected shape
    #[error("malformed upstream response: {0}")]
    Malformed(String),
}

impl UpstreamError {
    /// Whether a retry could plausibly succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            UpstreamError::RateLimited | UpstreamError::Unavailable(_)
        )
    }
}

/// A file listed in the repository's recipes directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoFile {
    pub name: String,
    pub path: String,
    pub sha: String,
}

/// Result of a validator-conditional file fetch
#[derive(Debug, Clone)]
pub enum FileFetch {
    /// Unchanged since the presented validator
    NotModified,
    /// New content, with the validator to present next time
    Fetched {
        content: String,
        sha: String,
        validator: Option<String>,
    },
}

/// A commit recorded by a repository mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitInfo {
    pub sha: String,
    pub message: String,
}

/// Result of a validator-conditional featured-feed fetch
#[derive(Debug, Clone)]
pub enum SearchFetch {
    /// Unchanged since the presented validator; no quota was spent
    NotModified,
    /// Fresh results, with the validator to present next time
    Fetched {
        videos: Vec<CookingVideo>,
        validator: Option<String>,
    },
}

/// Content repository holding recipes as markdown files
#[async_trait]
pub trait RecipeRepository: Send + Sync {
    /// List markdown files in the recipes directory
    async fn list_recipe_files(&self) -> Result<Vec<RepoFile>, UpstreamError>;

    /// Fetch one file, conditionally on the given validator
    async fn fetch_file(
        &self,
        path: &str,
        validator: Option<&str>,
    ) -> Result<FileFetch, UpstreamError>;

    /// Create or update a file; `sha` is required when updating
    async fn put_file(
        &self,
        path: &str,
        content: &str,
        message: &str,
        sha: Option<&str>,
    ) -> Result<CommitInfo, UpstreamError>;

    /// Delete a file at its current `sha`
    async fn delete_file(
        &self,
        path: &str,
        message: &str,
        sha: &str,
    ) -> Result<CommitInfo, UpstreamError>;
}

/// Quota-limited video-search API
#[async_trait]
pub trait VideoSearch: Send + Sync {
    /// Fetch the curated featured feed, conditionally on the validator
    async fn featured(&self, validator: Option<&str>) -> Result<SearchFetch, UpstreamError>;

    /// Free-form search with optional pagination
    async fn search(
        &self,
        query: &str,
        page_token: Option<&str>,
    ) -> Result<VideoSet, UpstreamError>;
}
