//! Video-search client (YouTube search API)
//!
//! The featured feed uses a conditional request with the stored ETag so an
//! unchanged curated list costs no quota; free-form searches always cost
//! their full unit price (the caller gates them through the quota
//! tracker). Transient failures are retried with backoff.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;

use super::{retry_with_backoff, RetryPolicy, SearchFetch, UpstreamError, VideoSearch};
use crate::config::VideoSearchConfig;
use crate::videos::{CookingVideo, VideoSet};

/// Howto & Style category, where cooking content lives
const COOKING_CATEGORY_ID: &str = "26";

/// YouTube search API client
pub struct YoutubeSearchClient {
    http: reqwest::Client,
    config: VideoSearchConfig,
    retry: RetryPolicy,
}

fn request_error(err: reqwest::Error) -> UpstreamError {
    UpstreamError::Unavailable(err.to_string())
}

fn classify(status: StatusCode) -> UpstreamError {
    match status.as_u16() {
        // Quota exhaustion and key problems both arrive as 403; treat as
        // rate limiting so the fallback tiers absorb them
        403 | 429 => UpstreamError::RateLimited,
        400 => UpstreamError::Malformed("search request rejected (400)".to_string()),
        s if s >= 500 => UpstreamError::Unavailable(format!("search API returned {}", s)),
        s => UpstreamError::Malformed(format!("search API returned unexpected status {}", s)),
    }
}

/// Map one search result item; items without a video id are skipped
fn map_video(item: &Value) -> Option<CookingVideo> {
    let video_id = item.get("id")?.get("videoId")?.as_str()?;
    let snippet = item.get("snippet")?;

    let thumbnail = snippet
        .get("thumbnails")
        .and_then(|t| {
            t.get("medium")
                .or_else(|| t.get("default"))
                .and_then(|v| v.get("url"))
        })
        .and_then(|v| v.as_str())
        .unwrap_or("");

    let text = |field: &str| {
        snippet
            .get(field)
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string()
    };

    Some(CookingVideo {
        video_id: video_id.to_string(),
        title: text("title"),
        thumbnail_url: thumbnail.to_string(),
        description: text("description"),
        channel_title: text("channelTitle"),
        published_at: text("publishedAt"),
    })
}

fn map_videos(body: &Value) -> Vec<CookingVideo> {
    body.get("items")
        .and_then(|v| v.as_array())
        .map(|items| items.iter().filter_map(map_video).collect())
        .unwrap_or_default()
}

fn etag_of(response: &reqwest::Response) -> Option<String> {
    response
        .headers()
        .get(reqwest::header::ETAG)
        .and_then(|v| v.to_str().ok())
        .map(String::from)
}

impl YoutubeSearchClient {
    /// Build a client from configuration
    pub fn new(config: VideoSearchConfig, retry: RetryPolicy) -> Result<Self, UpstreamError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| UpstreamError::Unavailable(e.to_string()))?;
        Ok(Self {
            http,
            config,
            retry,
        })
    }

    fn ensure_configured(&self) -> Result<(), UpstreamError> {
        if self.config.is_configured() {
            Ok(())
        } else {
            Err(UpstreamError::NotConfigured(
                "video search API key is required".to_string(),
            ))
        }
    }

    fn search_url(&self) -> String {
        format!("{}/search", self.config.api_base)
    }
}

#[async_trait]
impl VideoSearch for YoutubeSearchClient {
    async fn featured(&self, validator: Option<&str>) -> Result<SearchFetch, UpstreamError> {
        self.ensure_configured()?;
        let url = self.search_url();
        let max_results = self.config.featured_max_results.to_string();
        let query = [
            ("part", "snippet"),
            ("q", self.config.featured_query.as_str()),
            ("videoCategoryId", COOKING_CATEGORY_ID),
            ("type", "video"),
            ("maxResults", max_results.as_str()),
            ("order", "relevance"),
            ("key", self.config.api_key.as_str()),
        ];

        retry_with_backoff(&self.retry, || {
            let url = url.clone();
            async move {
                let mut request = self.http.get(&url).query(&query);
                if let Some(etag) = validator {
                    request = request.header(reqwest::header::IF_NONE_MATCH, etag);
                }

                let response = request.send().await.map_err(request_error)?;
                let status = response.status();

                // Content unchanged: zero quota cost
                if status == StatusCode::NOT_MODIFIED {
                    tracing::debug!("featured feed not modified (304)");
                    return Ok(SearchFetch::NotModified);
                }
                if !status.is_success() {
                    return Err(classify(status));
                }

                let new_validator = etag_of(&response);
                let body: Value = response
                    .json()
                    .await
                    .map_err(|e| UpstreamError::Malformed(e.to_string()))?;
                let videos = map_videos(&body);

                tracing::info!(count = videos.len(), "fetched featured videos");
                Ok(SearchFetch::Fetched {
                    videos,
                    validator: new_validator,
                })
            }
        })
        .await
    }

    async fn search(
        &self,
        query: &str,
        page_token: Option<&str>,
    ) -> Result<VideoSet, UpstreamError> {
        self.ensure_configured()?;
        let url = self.search_url();
        let max_results = self.config.search_max_results.to_string();
        let mut params = vec![
            ("part", "snippet"),
            ("q", query),
            ("type", "video"),
            ("maxResults", max_results.as_str()),
            ("order", "relevance"),
            ("key", self.config.api_key.as_str()),
        ];
        if let Some(token) = page_token {
            params.push(("pageToken", token));
        }

        retry_with_backoff(&self.retry, || {
            let url = url.clone();
            let params = params.clone();
            async move {
                let response = self
                    .http
                    .get(&url)
                    .query(&params)
                    .send()
                    .await
                    .map_err(request_error)?;
                let status = response.status();
                if !status.is_success() {
                    return Err(classify(status));
                }

                let body: Value = response
                    .json()
                    .await
                    .map_err(|e| UpstreamError::Malformed(e.to_string()))?;
                let videos = map_videos(&body);
                let next_page_token = body
                    .get("nextPageToken")
                    .and_then(|v| v.as_str())
                    .map(String::from);

                tracing::info!(query, count = videos.len(), "search returned videos");
                Ok(VideoSet {
                    videos,
                    next_page_token,
                })
            }
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_classify_treats_403_as_rate_limited() {
        assert_eq!(classify(StatusCode::FORBIDDEN), UpstreamError::RateLimited);
        assert_eq!(
            classify(StatusCode::TOO_MANY_REQUESTS),
            UpstreamError::RateLimited
        );
    }

    #[test]
    fn test_classify_5xx_as_unavailable() {
        assert!(matches!(
            classify(StatusCode::SERVICE_UNAVAILABLE),
            UpstreamError::Unavailable(_)
        ));
    }

    #[test]
    fn test_map_video_extracts_fields() {
        let item = json!({
            "id": {"videoId": "abc123"},
            "snippet": {
                "title": "Perfect Omelette",
                "description": "Eggs done right",
                "channelTitle": "Food Lab",
                "publishedAt": "2024-05-01T00:00:00Z",
                "thumbnails": {
                    "medium": {"url": "https://i.ytimg.com/vi/abc123/medium.jpg"},
                    "default": {"url": "https://i.ytimg.com/vi/abc123/default.jpg"}
                }
            }
        });
        let video = map_video(&item).unwrap();
        assert_eq!(video.video_id, "abc123");
        assert_eq!(video.title, "Perfect Omelette");
        assert_eq!(
            video.thumbnail_url,
            "https://i.ytimg.com/vi/abc123/medium.jpg"
        );
    }

    #[test]
    fn test_map_video_falls_back_to_default_thumbnail() {
        let item = json!({
            "id": {"videoId": "abc123"},
            "snippet": {
                "title": "t",
                "thumbnails": {
                    "default": {"url": "https://i.ytimg.com/vi/abc123/default.jpg"}
                }
            }
        });
        let video = map_video(&item).unwrap();
        assert_eq!(
            video.thumbnail_url,
            "https://i.ytimg.com/vi/abc123/default.jpg"
        );
    }

    #[test]
    fn test_map_video_skips_non_video_items() {
        // Channel results carry no videoId
        let item = json!({
            "id": {"channelId": "chan1"},
            "snippet": {"title": "A channel"}
        });
        assert!(map_video(&item).is_none());
    }

    #[test]
    fn test_map_videos_filters_and_collects() {
        let body = json!({
            "items": [
                {"id": {"videoId": "a"}, "snippet": {"title": "A"}},
                {"id": {"channelId": "c"}, "snippet": {"title": "skip me"}},
                {"id": {"videoId": "b"}, "snippet": {"title": "B"}}
            ]
        });
        let videos = map_videos(&body);
        assert_eq!(videos.len(), 2);
        assert_eq!(videos[0].video_id, "a");
        assert_eq!(videos[1].video_id, "b");
    }

    #[test]
    fn test_unconfigured_client_refuses_requests() {
        let client =
            YoutubeSearchClient::new(VideoSearchConfig::default(), RetryPolicy::no_retries())
                .unwrap();
        assert!(matches!(
            client.ensure_configured(),
            Err(UpstreamError::NotConfigured(_))
        ));
    }
}
