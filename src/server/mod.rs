//! HTTP surface
//!
//! Thin axum handlers over the cache-fronted services: the data-fetch
//! endpoints consumed by the UI and the administrative cache-stats
//! surface. All caching/quota decisions live below in `service`; handlers
//! only translate to and from the wire.

use axum::http::HeaderMap;
use axum::routing::{get, put};
use axum::Router;
use parking_lot::Mutex;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::cache::{CacheStore, SweeperHandle};
use crate::clock::Clock;
use crate::config::{AdminConfig, Config};
use crate::error::AppError;
use crate::quota::QuotaTracker;
use crate::service::{RecipeService, VideoService};
use crate::upstream::{
    github::GithubContentClient, youtube::YoutubeSearchClient, RecipeRepository, RetryPolicy,
    VideoSearch,
};

pub mod cache_stats;
pub mod recipes;
pub mod videos;

/// Shared application state handed to every handler
pub struct AppState {
    pub config: Config,
    pub recipes: RecipeService,
    pub videos: VideoService,
    /// Generic store for miscellaneous API responses
    pub api_store: Arc<CacheStore<serde_json::Value>>,
    pub quota: Arc<QuotaTracker>,
    pub clock: Arc<dyn Clock>,
    sweepers: Mutex<Vec<SweeperHandle>>,
}

impl AppState {
    /// Build state with the real upstream clients
    pub fn new(config: Config, clock: Arc<dyn Clock>) -> Result<Arc<Self>, AppError> {
        let retry = RetryPolicy::from(&config.retry);
        let repository = Arc::new(
            GithubContentClient::new(config.repository.clone(), retry.clone())
                .map_err(|e| AppError::Config(e.to_string()))?,
        );
        let search = Arc::new(
            YoutubeSearchClient::new(config.video_search.clone(), retry)
                .map_err(|e| AppError::Config(e.to_string()))?,
        );
        Ok(Self::with_collaborators(config, clock, repository, search))
    }

    /// Build state over arbitrary collaborators (tests inject stubs here)
    pub fn with_collaborators(
        config: Config,
        clock: Arc<dyn Clock>,
        repository: Arc<dyn RecipeRepository>,
        search: Arc<dyn VideoSearch>,
    ) -> Arc<Self> {
        let recipe_store = Arc::new(CacheStore::new(
            "recipes",
            config.cache.recipe_ttl(),
            clock.clone(),
        ));
        let video_store = Arc::new(CacheStore::new(
            "videos",
            config.cache.featured_ttl(),
            clock.clone(),
        ));
        let api_store = Arc::new(CacheStore::new("api", config.cache.api_ttl(), clock.clone()));
        let quota = Arc::new(QuotaTracker::new(config.quota.daily_limit, clock.clone()));

        let recipes = RecipeService::new(
            repository,
            recipe_store,
            config.repository.recipes_dir.clone(),
            config.cache.recipe_ttl(),
            clock.clone(),
        );
        let videos = VideoService::new(
            search,
            video_store,
            quota.clone(),
            config.cache.featured_ttl(),
            config.cache.search_ttl(),
            config.quota.search_cost,
            clock.clone(),
        );

        Arc::new(Self {
            config,
            recipes,
            videos,
            api_store,
            quota,
            clock,
            sweepers: Mutex::new(Vec::new()),
        })
    }

    /// Start the periodic background sweep for each store
    pub fn start_sweepers(&self) {
        let interval = self.config.cache.sweep_interval();
        let mut sweepers = self.sweepers.lock();
        sweepers.push(self.recipes.store().spawn_sweeper(interval));
        sweepers.push(self.videos.store().spawn_sweeper(interval));
        sweepers.push(self.api_store.spawn_sweeper(interval));
        tracing::info!(
            interval_seconds = interval.as_secs(),
            "cache sweepers started"
        );
    }

    /// Stop every background sweeper
    pub fn shutdown(&self) {
        let mut sweepers = self.sweepers.lock();
        for sweeper in sweepers.iter() {
            sweeper.stop();
        }
        sweepers.clear();
        tracing::info!("cache sweepers stopped");
    }
}

/// Whether the request carries the admin shared secret
///
/// Admin operations are disabled entirely when no token is configured.
pub(crate) fn is_admin(headers: &HeaderMap, config: &AdminConfig) -> bool {
    if !config.enabled() {
        return false;
    }
    headers
        .get("x-admin-token")
        .and_then(|v| v.to_str().ok())
        .map(|token| token == config.token)
        .unwrap_or(false)
}

/// Build the application router
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/recipes", get(recipes::list).post(recipes::create))
        .route(
            "/recipes/{slug}",
            put(recipes::update).delete(recipes::remove),
        )
        .route("/cooking-videos", get(videos::cooking_videos))
        .route("/search-videos", get(videos::search_videos))
        .route(
            "/cache-stats",
            get(cache_stats::stats).post(cache_stats::admin_action),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn admin_config(token: &str) -> AdminConfig {
        AdminConfig {
            token: token.to_string(),
        }
    }

    #[test]
    fn test_is_admin_accepts_matching_token() {
        let mut headers = HeaderMap::new();
        headers.insert("x-admin-token", HeaderValue::from_static("secret"));
        assert!(is_admin(&headers, &admin_config("secret")));
    }

    #[test]
    fn test_is_admin_rejects_wrong_or_missing_token() {
        let mut headers = HeaderMap::new();
        headers.insert("x-admin-token", HeaderValue::from_static("wrong"));
        assert!(!is_admin(&headers, &admin_config("secret")));
        assert!(!is_admin(&HeaderMap::new(), &admin_config("secret")));
    }

    #[test]
    fn test_is_admin_disabled_without_configured_token() {
        let mut headers = HeaderMap::new();
        headers.insert("x-admin-token", HeaderValue::from_static(""));
        assert!(!is_admin(&headers, &admin_config("")));
    }
}
