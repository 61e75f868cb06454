// Configuration module

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub mod cache;
pub mod quota;
pub mod retry;
pub mod server;
pub mod upstream;

pub use cache::CacheSettings;
pub use quota::QuotaConfig;
pub use retry::RetryConfig;
pub use server::{AdminConfig, ServerConfig};
pub use upstream::{RepositoryConfig, VideoSearchConfig};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub repository: RepositoryConfig,
    #[serde(default)]
    pub video_search: VideoSearchConfig,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub quota: QuotaConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub admin: AdminConfig,
}

impl Config {
    /// Parse YAML after substituting `${VAR_NAME}` references from the
    /// environment. Every referenced variable must be set.
    pub fn from_yaml_with_env(yaml: &str) -> Result<Self, String> {
        let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").map_err(|e| e.to_string())?;

        // First, check that all referenced environment variables exist
        for caps in re.captures_iter(yaml) {
            let var_name = &caps[1];
            std::env::var(var_name).map_err(|_| {
                format!(
                    "Environment variable '{}' is referenced but not set",
                    var_name
                )
            })?;
        }

        let substituted = re.replace_all(yaml, |caps: &regex::Captures| {
            let var_name = &caps[1];
            // Safe because we checked above
            std::env::var(var_name).unwrap_or_default()
        });

        let config: Config = serde_yaml::from_str(&substituted).map_err(|e| e.to_string())?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {}", e))?;
        Self::from_yaml_with_env(&yaml)
    }

    /// Validate every section
    ///
    /// Missing upstream credentials are not an error here; the affected
    /// endpoints degrade at request time with a clear message instead.
    pub fn validate(&self) -> Result<(), String> {
        self.server.validate()?;
        self.cache.validate()?;
        self.quota.validate()?;
        self.retry.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_yaml_yields_defaults() {
        let config = Config::from_yaml_with_env("{}").unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.quota.daily_limit, 10_000);
        assert_eq!(config.cache.recipe_ttl_seconds, 3600);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_yaml_overrides_defaults() {
        let yaml = "
server:
  address: 127.0.0.1
  port: 8080
quota:
  daily_limit: 5000
  search_cost: 50
cache:
  search_ttl_seconds: 600
";
        let config = Config::from_yaml_with_env(yaml).unwrap();
        assert_eq!(config.server.listen_addr(), "127.0.0.1:8080");
        assert_eq!(config.quota.daily_limit, 5000);
        assert_eq!(config.cache.search_ttl_seconds, 600);
        // Untouched sections keep their defaults
        assert_eq!(config.cache.recipe_ttl_seconds, 3600);
    }

    #[test]
    fn test_env_substitution() {
        std::env::set_var("FORKFUL_TEST_TOKEN", "ghp_from_env");
        let yaml = "
repository:
  owner: kitchen
  repo: recipes
  token: ${FORKFUL_TEST_TOKEN}
";
        let config = Config::from_yaml_with_env(yaml).unwrap();
        assert_eq!(config.repository.token, "ghp_from_env");
        assert!(config.repository.is_configured());
        std::env::remove_var("FORKFUL_TEST_TOKEN");
    }

    #[test]
    fn test_missing_env_var_is_an_error() {
        let yaml = "
repository:
  token: ${FORKFUL_DEFINITELY_NOT_SET}
";
        let err = Config::from_yaml_with_env(yaml).unwrap_err();
        assert!(err.contains("FORKFUL_DEFINITELY_NOT_SET"));
    }

    #[test]
    fn test_invalid_yaml_is_an_error() {
        assert!(Config::from_yaml_with_env("server: [not: a map").is_err());
    }

    #[test]
    fn test_config_loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "server:\n  port: 9090").unwrap();
        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.server.port, 9090);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let err = Config::from_file("/nonexistent/forkful.yaml").unwrap_err();
        assert!(err.contains("Failed to read config file"));
    }

    #[test]
    fn test_validate_surfaces_section_errors() {
        let yaml = "
quota:
  daily_limit: 50
  search_cost: 100
";
        let config = Config::from_yaml_with_env(yaml).unwrap();
        assert!(config.validate().is_err());
    }
}
