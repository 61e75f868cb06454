//! Video-search quota budget configuration

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotaConfig {
    /// Daily budget in quota units
    #[serde(default = "default_daily_limit")]
    pub daily_limit: u64,
    /// Units one search call costs
    #[serde(default = "default_search_cost")]
    pub search_cost: u64,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            daily_limit: default_daily_limit(),
            search_cost: default_search_cost(),
        }
    }
}

fn default_daily_limit() -> u64 {
    10_000
}

fn default_search_cost() -> u64 {
    100
}

impl QuotaConfig {
    /// Validate quota configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.daily_limit == 0 {
            return Err("quota daily_limit must be greater than 0".to_string());
        }
        if self.search_cost == 0 {
            return Err("quota search_cost must be greater than 0".to_string());
        }
        if self.search_cost > self.daily_limit {
            return Err(format!(
                "quota search_cost ({}) cannot exceed daily_limit ({})",
                self.search_cost, self.daily_limit
            ));
        }
        Ok(())
    }
}
