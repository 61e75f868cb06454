//! Cache tier configuration
//!
//! TTL strategy mirrors content volatility:
//! - recipes: stable, long-lived content
//! - featured videos: semi-stable, curator-selected
//! - video searches: dynamic, user-driven
//! - generic API responses: near-real-time

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSettings {
    #[serde(default = "default_recipe_ttl_seconds")]
    pub recipe_ttl_seconds: u64,
    #[serde(default = "default_featured_ttl_seconds")]
    pub featured_ttl_seconds: u64,
    #[serde(default = "default_search_ttl_seconds")]
    pub search_ttl_seconds: u64,
    #[serde(default = "default_api_ttl_seconds")]
    pub api_ttl_seconds: u64,
    /// Interval between background expired-entry sweeps
    #[serde(default = "default_sweep_interval_seconds")]
    pub sweep_interval_seconds: u64,
    /// How many hot keys the stats surface reports per store
    #[serde(default = "default_hot_key_limit")]
    pub hot_key_limit: usize,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            recipe_ttl_seconds: default_recipe_ttl_seconds(),
            featured_ttl_seconds: default_featured_ttl_seconds(),
            search_ttl_seconds: default_search_ttl_seconds(),
            api_ttl_seconds: default_api_ttl_seconds(),
            sweep_interval_seconds: default_sweep_interval_seconds(),
            hot_key_limit: default_hot_key_limit(),
        }
    }
}

fn default_recipe_ttl_seconds() -> u64 {
    3600 // 1 hour
}

fn default_featured_ttl_seconds() -> u64 {
    7200 // 2 hours
}

fn default_search_ttl_seconds() -> u64 {
    1800 // 30 minutes
}

fn default_api_ttl_seconds() -> u64 {
    300 // 5 minutes
}

fn default_sweep_interval_seconds() -> u64 {
    300 // 5 minutes
}

fn default_hot_key_limit() -> usize {
    5
}

impl CacheSettings {
    pub fn recipe_ttl(&self) -> Duration {
        Duration::from_secs(self.recipe_ttl_seconds)
    }

    pub fn featured_ttl(&self) -> Duration {
        Duration::from_secs(self.featured_ttl_seconds)
    }

    pub fn search_ttl(&self) -> Duration {
        Duration::from_secs(self.search_ttl_seconds)
    }

    pub fn api_ttl(&self) -> Duration {
        Duration::from_secs(self.api_ttl_seconds)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_seconds)
    }

    /// Validate cache configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.recipe_ttl_seconds == 0
            || self.featured_ttl_seconds == 0
            || self.search_ttl_seconds == 0
            || self.api_ttl_seconds == 0
        {
            return Err("Cache TTLs must be greater than 0".to_string());
        }
        if self.sweep_interval_seconds == 0 {
            return Err("sweep_interval_seconds must be greater than 0".to_string());
        }
        Ok(())
    }
}
