//! Video endpoints
//!
//! Both endpoints are infallible by design: the service's fallback tiers
//! guarantee a dataset, and the `source` field tells the UI which tier
//! answered. The featured endpoint also reports quota status so the
//! dashboard can show budget pressure.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use super::AppState;
use crate::fallback::Provenance;

/// GET /cooking-videos
pub async fn cooking_videos(State(state): State<Arc<AppState>>) -> Response {
    let resolved = state.videos.featured().await;

    Json(json!({
        "status": "success",
        "source": resolved.source,
        "videos": resolved.value.videos,
        "quotaStatus": state.quota.status(),
    }))
    .into_response()
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    q: Option<String>,
    #[serde(rename = "pageToken")]
    page_token: Option<String>,
}

/// GET /search-videos?q=&pageToken=
pub async fn search_videos(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Response {
    let query = params.q.as_deref().unwrap_or("").trim();
    if query.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "status": "error",
                "message": "Search query required",
            })),
        )
            .into_response();
    }

    let resolved = state.videos.search(query, params.page_token.as_deref()).await;

    // Search results are labeled by origin API rather than cache tier
    let source = match resolved.source {
        Provenance::Substitute => "mock",
        _ => "youtube",
    };

    Json(json!({
        "status": "success",
        "videos": resolved.value.videos,
        "nextPageToken": resolved.value.next_page_token,
        "source": source,
    }))
    .into_response()
}
