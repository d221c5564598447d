//! Configuration management for the CLI

use analyzer_lib::collector::CollectorConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// CLI configuration file, holding endpoint defaults
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Metrics gateway URL
    pub metrics_url: Option<String>,
    /// Pricing gateway URL, standard partition
    pub pricing_url: Option<String>,
    /// Pricing gateway URL, China partition
    pub pricing_cn_url: Option<String>,
    /// Default output format
    pub default_format: Option<String>,
}

impl Config {
    /// Load configuration from file
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content =
            std::fs::read_to_string(&config_path).context("Failed to read config file")?;

        serde_json::from_str(&content).context("Failed to parse config file")
    }

    /// Save configuration to file
    #[allow(dead_code)]
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(&config_path, content).context("Failed to write config file")?;

        Ok(())
    }

    /// Get the configuration file path
    fn config_path() -> Result<PathBuf> {
        let home = dirs_next::home_dir().context("Could not determine home directory")?;
        Ok(home.join(".config").join("ria").join("config.json"))
    }
}

/// Collector tuning, loadable from RIA_* environment variables
#[derive(Debug, Clone, Deserialize)]
pub struct CollectorSettings {
    /// Throttle-retry attempt ceiling per sub-window
    #[serde(default = "default_window_attempts")]
    pub max_window_attempts: u32,

    /// Transient-retry attempt ceiling per metric fetch
    #[serde(default = "default_fetch_attempts")]
    pub max_fetch_attempts: u32,

    /// Base throttle backoff in seconds
    #[serde(default = "default_window_backoff_secs")]
    pub window_backoff_secs: u64,
}

fn default_window_attempts() -> u32 {
    5
}

fn default_fetch_attempts() -> u32 {
    3
}

fn default_window_backoff_secs() -> u64 {
    2
}

impl Default for CollectorSettings {
    fn default() -> Self {
        Self {
            max_window_attempts: default_window_attempts(),
            max_fetch_attempts: default_fetch_attempts(),
            window_backoff_secs: default_window_backoff_secs(),
        }
    }
}

impl CollectorSettings {
    /// Load settings from the environment (RIA_MAX_WINDOW_ATTEMPTS, ...)
    pub fn load() -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::Environment::with_prefix("RIA").try_parsing(true))
            .build()?;

        Ok(settings
            .try_deserialize()
            .unwrap_or_else(|_| Self::default()))
    }

    pub fn to_collector_config(&self) -> CollectorConfig {
        CollectorConfig {
            max_window_attempts: self.max_window_attempts,
            max_fetch_attempts: self.max_fetch_attempts,
            window_backoff: std::time::Duration::from_secs(self.window_backoff_secs),
            ..CollectorConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_defaults() {
        let settings = CollectorSettings::default();
        assert_eq!(settings.max_window_attempts, 5);
        assert_eq!(settings.max_fetch_attempts, 3);
        assert_eq!(settings.window_backoff_secs, 2);
    }

    #[test]
    fn test_settings_map_onto_collector_config() {
        let settings = CollectorSettings {
            max_window_attempts: 2,
            max_fetch_attempts: 1,
            window_backoff_secs: 7,
        };
        let config = settings.to_collector_config();
        assert_eq!(config.max_window_attempts, 2);
        assert_eq!(config.max_fetch_attempts, 1);
        assert_eq!(config.window_backoff, std::time::Duration::from_secs(7));
        // Untouched fields keep their defaults
        assert_eq!(config.period_secs, 60);
    }

    #[test]
    fn test_config_round_trip() {
        let config = Config {
            metrics_url: Some("http://metrics.internal:8080".to_string()),
            pricing_url: None,
            pricing_cn_url: None,
            default_format: Some("json".to_string()),
        };
        let serialized = serde_json::to_string(&config).unwrap();
        let parsed: Config = serde_json::from_str(&serialized).unwrap();
        assert_eq!(parsed.metrics_url, config.metrics_url);
        assert_eq!(parsed.default_format, config.default_format);
    }
}
