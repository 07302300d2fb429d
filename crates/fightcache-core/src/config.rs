//! Application configuration management.
//!
//! This module handles loading the application configuration:
//! the data service base URL, an optional cache directory override, request
//! timeouts and the refresh freshness window.
//!
//! Configuration is stored at `~/.config/fightcache/config.json`.
//! `FIGHTCACHE_BASE_URL` and `FIGHTCACHE_CACHE_DIR` override the file.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::debug;

use crate::api::DEFAULT_BASE_URL;

/// Application name used for config/cache directory paths
const APP_NAME: &str = "fightcache";

/// Config file name
const CONFIG_FILE: &str = "config.json";

pub const ENV_BASE_URL: &str = "FIGHTCACHE_BASE_URL";
pub const ENV_CACHE_DIR: &str = "FIGHTCACHE_CACHE_DIR";

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 10;
const DEFAULT_FRESHNESS_WINDOW_HOURS: u64 = 4;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub base_url: String,
    pub cache_dir: Option<PathBuf>,
    pub request_timeout_secs: u64,
    pub probe_timeout_secs: u64,
    pub freshness_window_hours: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            cache_dir: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            probe_timeout_secs: DEFAULT_PROBE_TIMEOUT_SECS,
            freshness_window_hours: DEFAULT_FRESHNESS_WINDOW_HOURS,
        }
    }
}

impl Config {
    /// Load the config file (defaults when absent), then apply environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_file()?;
        config.apply_overrides(
            std::env::var(ENV_BASE_URL).ok(),
            std::env::var(ENV_CACHE_DIR).ok(),
        );
        Ok(config)
    }

    fn load_file() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))
        } else {
            debug!(path = %path.display(), "No config file, using defaults");
            Ok(Self::default())
        }
    }

    fn apply_overrides(&mut self, base_url: Option<String>, cache_dir: Option<String>) {
        if let Some(url) = base_url.filter(|u| !u.trim().is_empty()) {
            self.base_url = url;
        }
        if let Some(dir) = cache_dir.filter(|d| !d.trim().is_empty()) {
            self.cache_dir = Some(PathBuf::from(dir));
        }
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        if let Some(ref dir) = self.cache_dir {
            return Ok(dir.clone());
        }
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    pub fn freshness_window(&self) -> chrono::Duration {
        chrono::Duration::hours(self.freshness_window_hours as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: Config = serde_json::from_str(r#"{"freshness_window_hours": 1}"#)
            .expect("partial config should parse");
        assert_eq!(config.freshness_window_hours, 1);
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.request_timeout_secs, 30);
        assert_eq!(config.probe_timeout_secs, 10);
        assert_eq!(config.freshness_window(), chrono::Duration::hours(1));
    }

    #[test]
    fn test_overrides() {
        let mut config = Config::default();
        config.apply_overrides(Some("http://localhost:8000/api".into()), Some("/tmp/fc".into()));
        assert_eq!(config.base_url(), "http://localhost:8000/api");
        assert_eq!(config.cache_dir().expect("cache dir"), PathBuf::from("/tmp/fc"));

        // Blank values leave the file settings alone
        let mut config = Config::default();
        config.apply_overrides(Some("  ".into()), None);
        assert_eq!(config.base_url(), DEFAULT_BASE_URL);
        assert!(config.cache_dir.is_none());
    }
}
