//! Video accessor
//!
//! Fronts the video-search upstream with the video cache store. Every
//! chargeable call is gated by the quota tracker first; the featured feed
//! additionally uses a conditional request so an unchanged curated list
//! costs nothing. When the quota gate defers or the upstream fails, the
//! fallback tiers take over: stale cache, then the substitute catalog.
//! The video path therefore never surfaces a hard failure.
//!
//! Stale and substitute results are not re-stored, so the next call
//! retries properly instead of perpetuating degraded data.

use std::sync::Arc;
use std::time::Duration;

use crate::cache::{
    cache_key, CacheOptions, CacheStore, ConditionalCache, ConditionalResponse, Fetched,
    LoadError, Refreshed,
};
use crate::clock::Clock;
use crate::fallback::{self, Provenance, Resolved};
use crate::quota::QuotaTracker;
use crate::upstream::{SearchFetch, VideoSearch};
use crate::videos::substitute::{substitute_videos, FEATURED_QUERY};
use crate::videos::{CookingVideo, VideoSet};

use super::to_load_error;

/// Cache key for the curated featured feed
pub const FEATURED_CACHE_KEY: &str = "videos:featured";
/// Invalidation tag covering every video entry
pub const VIDEOS_TAG: &str = "videos";
/// Conditional-cache slot for the featured feed's validator
const FEATURED_SLOT: &str = "featured";

/// Cache-fronted access to featured and searched videos
pub struct VideoService {
    search: Arc<dyn VideoSearch>,
    store: Arc<CacheStore<VideoSet>>,
    featured_cache: ConditionalCache<Vec<CookingVideo>>,
    quota: Arc<QuotaTracker>,
    clock: Arc<dyn Clock>,
    featured_ttl: Duration,
    search_ttl: Duration,
    search_cost: u64,
}

impl VideoService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        search: Arc<dyn VideoSearch>,
        store: Arc<CacheStore<VideoSet>>,
        quota: Arc<QuotaTracker>,
        featured_ttl: Duration,
        search_ttl: Duration,
        search_cost: u64,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            search,
            store,
            featured_cache: ConditionalCache::new(clock.clone()),
            quota,
            clock,
            featured_ttl,
            search_ttl,
            search_cost,
        }
    }

    /// The backing store, for the admin stats/clear surface
    pub fn store(&self) -> &Arc<CacheStore<VideoSet>> {
        &self.store
    }

    /// The quota tracker consulted before chargeable calls
    pub fn quota(&self) -> &Arc<QuotaTracker> {
        &self.quota
    }

    /// Get the curated featured feed; never fails
    pub async fn featured(&self) -> Resolved<VideoSet> {
        let options = CacheOptions {
            ttl: Some(self.featured_ttl),
            tags: vec![VIDEOS_TAG.to_string()],
        };

        let fetched = self
            .store
            .get_or_load(FEATURED_CACHE_KEY, options, || self.refresh_featured())
            .await;

        self.settle(FEATURED_CACHE_KEY, fetched, || {
            VideoSet::single_page(substitute_videos(
                FEATURED_QUERY,
                12,
                self.clock.now_utc(),
            ))
        })
    }

    /// Search videos by query with optional pagination; never fails
    pub async fn search(&self, query: &str, page_token: Option<&str>) -> Resolved<VideoSet> {
        let query = query.trim();
        let normalized = query.to_lowercase();
        let key = match page_token {
            Some(token) => cache_key(&["videos", "search", &normalized, token]),
            None => cache_key(&["videos", "search", &normalized]),
        };
        let options = CacheOptions {
            ttl: Some(self.search_ttl),
            tags: vec![VIDEOS_TAG.to_string()],
        };

        let fetched = self
            .store
            .get_or_load(&key, options, || self.perform_search(query, page_token))
            .await;

        self.settle(&key, fetched, || {
            VideoSet::single_page(substitute_videos(query, 20, self.clock.now_utc()))
        })
    }

    /// Map a store outcome into a labeled result, falling back to the
    /// stale entry and then to the substitute catalog
    fn settle(
        &self,
        key: &str,
        fetched: Result<Fetched<VideoSet>, LoadError>,
        substitute: impl FnOnce() -> VideoSet,
    ) -> Resolved<VideoSet> {
        match fetched {
            Ok(Fetched::Hit(set)) => Resolved {
                value: set,
                source: Provenance::Cache,
            },
            Ok(Fetched::Loaded(set)) => Resolved {
                value: set,
                source: Provenance::Fresh,
            },
            Err(err) => {
                let stale = self.store.get_stale(key);
                fallback::resolve(err.into(), stale, Some(substitute())).unwrap_or_else(|| {
                    // Unreachable: a substitute is always supplied
                    Resolved {
                        value: VideoSet::single_page(Vec::new()),
                        source: Provenance::Substitute,
                    }
                })
            }
        }
    }

    /// Refresh the featured feed: quota gate, then conditional request.
    /// A not-modified answer returns the retained payload and charges
    /// nothing; only fresh data costs quota.
    async fn refresh_featured(&self) -> Result<VideoSet, LoadError> {
        if !self.quota.can_spend(self.search_cost) {
            tracing::info!("quota gate deferred featured refresh");
            return Err(LoadError::QuotaDeferred);
        }

        let refreshed = self
            .featured_cache
            .refresh(FEATURED_SLOT, |validator| async move {
                match self.search.featured(validator.as_deref()).await? {
                    SearchFetch::NotModified => Ok(ConditionalResponse::NotModified),
                    SearchFetch::Fetched { videos, validator } => {
                        Ok(ConditionalResponse::Fresh {
                            payload: videos,
                            validator,
                        })
                    }
                }
            })
            .await
            .map_err(to_load_error)?;

        match refreshed {
            Refreshed::Fresh { payload } => {
                self.quota.record_usage(self.search_cost);
                Ok(VideoSet::single_page(payload))
            }
            Refreshed::NotModified { payload: Some(payload) } => {
                Ok(VideoSet::single_page(payload))
            }
            Refreshed::NotModified { payload: None } => Err(LoadError::Upstream(
                "not-modified with no retained payload".to_string(),
            )),
        }
    }

    async fn perform_search(
        &self,
        query: &str,
        page_token: Option<&str>,
    ) -> Result<VideoSet, LoadError> {
        if !self.quota.can_spend(self.search_cost) {
            tracing::info!(query, "quota gate deferred search");
            return Err(LoadError::QuotaDeferred);
        }

        let set = self
            .search
            .search(query, page_token)
            .await
            .map_err(to_load_error)?;
        self.quota.record_usage(self.search_cost);
        Ok(set)
    }
}
