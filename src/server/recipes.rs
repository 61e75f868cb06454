//! Recipe endpoints
//!
//! `GET /recipes` serves the cached catalog with CDN-friendly headers.
//! The mutating endpoints are the admin panel's commit surface: they
//! write markdown files through the repository and invalidate the cache.

use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::sync::Arc;

use super::{is_admin, AppState};
use crate::recipes::Recipe;
use crate::upstream::UpstreamError;

/// CDN cache policy for the recipe list
const CACHE_CONTROL: &str = "public, s-maxage=300, stale-while-revalidate=600";

/// GET /recipes
pub async fn list(State(state): State<Arc<AppState>>) -> Response {
    if !state.config.repository.is_configured() {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Repository credentials not configured" })),
        )
            .into_response();
    }

    match state.recipes.get_all().await {
        Ok(resolved) => {
            tracing::debug!(source = %resolved.source, count = resolved.value.len(), "serving recipes");
            let mut response = (StatusCode::OK, Json(resolved.value)).into_response();
            response.headers_mut().insert(
                header::CACHE_CONTROL,
                HeaderValue::from_static(CACHE_CONTROL),
            );
            response
        }
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "error": "Failed to fetch recipes",
                "message": err.to_string(),
            })),
        )
            .into_response(),
    }
}

/// POST /recipes (admin)
pub async fn create(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(recipe): Json<Recipe>,
) -> Response {
    if !is_admin(&headers, &state.config.admin) {
        return unauthorized();
    }

    match state.recipes.create(&recipe).await {
        Ok(commit) => commit_response(&commit.sha, &commit.message),
        Err(err) => upstream_error_response(err),
    }
}

/// PUT /recipes/{slug} (admin)
pub async fn update(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
    headers: HeaderMap,
    Json(mut recipe): Json<Recipe>,
) -> Response {
    if !is_admin(&headers, &state.config.admin) {
        return unauthorized();
    }

    // The path names the recipe; the body's slug is ignored
    recipe.slug = slug;
    match state.recipes.update(&recipe).await {
        Ok(commit) => commit_response(&commit.sha, &commit.message),
        Err(err) => upstream_error_response(err),
    }
}

/// DELETE /recipes/{slug} (admin)
pub async fn remove(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
    headers: HeaderMap,
) -> Response {
    if !is_admin(&headers, &state.config.admin) {
        return unauthorized();
    }

    match state.recipes.delete(&slug).await {
        Ok(commit) => commit_response(&commit.sha, &commit.message),
        Err(err) => upstream_error_response(err),
    }
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "error": "Unauthorized" })),
    )
        .into_response()
}

fn commit_response(sha: &str, message: &str) -> Response {
    (
        StatusCode::OK,
        Json(json!({
            "status": "success",
            "commit": { "sha": sha, "message": message },
        })),
    )
        .into_response()
}

fn upstream_error_response(err: UpstreamError) -> Response {
    let status = match &err {
        UpstreamError::NotFound(_) => StatusCode::NOT_FOUND,
        UpstreamError::RateLimited | UpstreamError::Unavailable(_) => StatusCode::BAD_GATEWAY,
        UpstreamError::NotConfigured(_) | UpstreamError::Malformed(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (
        status,
        Json(json!({ "status": "error", "message": err.to_string() })),
    )
        .into_response()
}
