//! Cache statistics and control endpoint
//!
//! GET /cache-stats - cache performance metrics across all stores
//! POST /cache-stats?action=clear[&target=...] - clear caches (admin only)
//! POST /cache-stats?action=reset-stats - zero hit/miss counters (admin only)

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use super::{is_admin, AppState};
use crate::cache::CacheStats;

/// GET /cache-stats
pub async fn stats(State(state): State<Arc<AppState>>) -> Response {
    let recipe_stats = state.recipes.store().stats();
    let video_stats = state.videos.store().stats();
    let api_stats = state.api_store.stats();
    let hot_key_limit = state.config.cache.hot_key_limit;

    let total_entries =
        recipe_stats.entry_count + video_stats.entry_count + api_stats.entry_count;
    let total_size =
        recipe_stats.total_size_estimate + video_stats.total_size_estimate + api_stats.total_size_estimate;
    let total_hits = recipe_stats.hits + video_stats.hits + api_stats.hits;
    let total_misses = recipe_stats.misses + video_stats.misses + api_stats.misses;

    let timestamp: DateTime<Utc> = state.clock.now_utc();

    Json(json!({
        "timestamp": timestamp.to_rfc3339(),
        "recipes": recipe_stats,
        "videos": video_stats,
        "api": api_stats,
        "quotaStatus": state.quota.status(),
        "hotKeys": {
            "recipes": state.recipes.store().hot_keys(hot_key_limit),
            "videos": state.videos.store().hot_keys(hot_key_limit),
        },
        "summary": {
            "totalEntries": total_entries,
            "totalMemory": format!("{:.2} KB", total_size as f64 / 1024.0),
            "overallHitRate": CacheStats::rate(total_hits, total_misses),
        },
    }))
    .into_response()
}

#[derive(Debug, Deserialize)]
pub struct ActionParams {
    action: Option<String>,
    target: Option<String>,
}

/// POST /cache-stats?action=...
pub async fn admin_action(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ActionParams>,
    headers: HeaderMap,
) -> Response {
    if !is_admin(&headers, &state.config.admin) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "Unauthorized" })),
        )
            .into_response();
    }

    match params.action.as_deref() {
        Some("clear") => {
            let target = params.target.as_deref();
            match target {
                Some("recipes") => state.recipes.store().clear(),
                Some("videos") => state.videos.store().clear(),
                Some("api") => state.api_store.clear(),
                None => {
                    state.recipes.store().clear();
                    state.videos.store().clear();
                    state.api_store.clear();
                }
                Some(other) => {
                    return (
                        StatusCode::BAD_REQUEST,
                        Json(json!({ "error": format!("Unknown target '{}'", other) })),
                    )
                        .into_response();
                }
            }
            let suffix = target.map(|t| format!(" ({})", t)).unwrap_or_default();
            tracing::info!(target = target.unwrap_or("all"), "cache cleared by admin");
            Json(json!({ "message": format!("Cache cleared{}", suffix) })).into_response()
        }
        Some("reset-stats") => {
            state.recipes.store().reset_stats();
            state.videos.store().reset_stats();
            state.api_store.reset_stats();
            Json(json!({ "message": "Statistics reset" })).into_response()
        }
        _ => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Invalid action" })),
        )
            .into_response(),
    }
}
