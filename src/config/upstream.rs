//! Upstream collaborator configuration
//!
//! Credentials and endpoints for the two quota-limited upstreams: the
//! content repository holding recipes as markdown, and the video-search
//! API. Both are typically filled from `${ENV}` references in the YAML.

use serde::{Deserialize, Serialize};

/// Content-repository (GitHub contents API) settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryConfig {
    #[serde(default = "default_repository_api_base")]
    pub api_base: String,
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub repo: String,
    #[serde(default)]
    pub token: String,
    #[serde(default = "default_recipes_dir")]
    pub recipes_dir: String,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            api_base: default_repository_api_base(),
            owner: String::new(),
            repo: String::new(),
            token: String::new(),
            recipes_dir: default_recipes_dir(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

impl RepositoryConfig {
    /// Whether credentials are present at all
    pub fn is_configured(&self) -> bool {
        !self.owner.is_empty() && !self.repo.is_empty() && !self.token.is_empty()
    }
}

/// Video-search API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoSearchConfig {
    #[serde(default = "default_search_api_base")]
    pub api_base: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_featured_query")]
    pub featured_query: String,
    #[serde(default = "default_featured_max_results")]
    pub featured_max_results: u32,
    #[serde(default = "default_search_max_results")]
    pub search_max_results: u32,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl Default for VideoSearchConfig {
    fn default() -> Self {
        Self {
            api_base: default_search_api_base(),
            api_key: String::new(),
            featured_query: default_featured_query(),
            featured_max_results: default_featured_max_results(),
            search_max_results: default_search_max_results(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

impl VideoSearchConfig {
    /// Whether an API key is present
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }
}

fn default_repository_api_base() -> String {
    "https://api.github.com".to_string()
}

fn default_recipes_dir() -> String {
    "app/recipes".to_string()
}

fn default_search_api_base() -> String {
    "https://www.googleapis.com/youtube/v3".to_string()
}

fn default_featured_query() -> String {
    "cooking tutorial recipe".to_string()
}

fn default_featured_max_results() -> u32 {
    12
}

fn default_search_max_results() -> u32 {
    20
}

fn default_timeout_seconds() -> u64 {
    10
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_defaults() {
        let config = RepositoryConfig::default();
        assert_eq!(config.api_base, "https://api.github.com");
        assert_eq!(config.recipes_dir, "app/recipes");
        assert!(!config.is_configured());
    }

    #[test]
    fn test_repository_configured_needs_all_three() {
        let mut config = RepositoryConfig {
            owner: "kitchen".to_string(),
            repo: "recipes".to_string(),
            token: "ghp_x".to_string(),
            ..Default::default()
        };
        assert!(config.is_configured());
        config.token.clear();
        assert!(!config.is_configured());
    }

    #[test]
    fn test_video_search_defaults() {
        let config = VideoSearchConfig::default();
        assert_eq!(config.featured_query, "cooking tutorial recipe");
        assert_eq!(config.featured_max_results, 12);
        assert_eq!(config.search_max_results, 20);
        assert!(!config.is_configured());
    }
}
