//! Video domain types

use serde::{Deserialize, Serialize};

pub mod substitute;

/// One cooking video as returned by the search upstream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CookingVideo {
    pub video_id: String,
    pub title: String,
    pub thumbnail_url: String,
    pub description: String,
    pub channel_title: String,
    pub published_at: String,
}

/// A page of videos plus the continuation token, when the upstream has
/// more results
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoSet {
    pub videos: Vec<CookingVideo>,
    pub next_page_token: Option<String>,
}

impl VideoSet {
    /// A set with no continuation token
    pub fn single_page(videos: Vec<CookingVideo>) -> Self {
        Self {
            videos,
            next_page_token: None,
        }
    }
}
