//! Configuration management for castreceiver
//!
//! Handles config file loading/saving and environment overrides.
//! Config is stored at ~/.config/castreceiver/config.toml

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::playback::PlayerType;

/// Catalog bundled with the receiver
pub const DEFAULT_CATALOG_URL: &str = "file:///android_asset/channel.json";
pub const DEFAULT_ASSET_DIR: &str = "assets";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

pub const ENV_CATALOG_URL: &str = "CASTRECEIVER_CATALOG_URL";
pub const ENV_ASSET_DIR: &str = "CASTRECEIVER_ASSET_DIR";

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Catalog location (http(s) URL, asset URL or file path)
    pub catalog_url: Option<String>,
    /// Directory that asset URLs resolve against
    pub asset_dir: Option<PathBuf>,
    /// Local player used for playback
    pub player: Option<PlayerType>,
    /// Timeout for catalog requests, in seconds
    pub request_timeout_secs: Option<u64>,
}

impl Config {
    /// Get config file path (~/.config/castreceiver/config.toml)
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("castreceiver").join("config.toml"))
    }

    /// Load config from the default path, or return default if not found
    pub fn load() -> Self {
        Self::path()
            .and_then(|p| std::fs::read_to_string(p).ok())
            .and_then(|s| toml::from_str(&s).ok())
            .unwrap_or_default()
    }

    /// Load config from an explicit path; a missing or malformed file is an error
    pub fn load_from(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("Invalid config {}", path.display()))
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create parent directory if needed
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let toml = toml::to_string_pretty(self)?;
        std::fs::write(path, toml)?;
        Ok(())
    }

    /// Catalog location with fallback chain:
    /// 1. Environment variable CASTRECEIVER_CATALOG_URL
    /// 2. Config file
    /// 3. Bundled catalog asset
    pub fn catalog_url(&self) -> String {
        std::env::var(ENV_CATALOG_URL)
            .ok()
            .filter(|v| !v.is_empty())
            .or_else(|| self.catalog_url.clone())
            .unwrap_or_else(|| DEFAULT_CATALOG_URL.to_string())
    }

    /// Asset directory, same fallback chain as the catalog URL
    pub fn asset_dir(&self) -> PathBuf {
        std::env::var_os(ENV_ASSET_DIR)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .or_else(|| self.asset_dir.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_ASSET_DIR))
    }

    pub fn player(&self) -> PlayerType {
        self.player.unwrap_or_default()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(
            self.request_timeout_secs
                .filter(|secs| *secs > 0)
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert!(config.catalog_url.is_none());
        assert_eq!(config.player(), PlayerType::Mpv);
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_zero_timeout_falls_back() {
        let config = Config {
            request_timeout_secs: Some(0),
            ..Default::default()
        };
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_round_trip_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = Config {
            catalog_url: Some("https://example.com/channels.json".into()),
            asset_dir: Some(PathBuf::from("/srv/assets")),
            player: Some(PlayerType::Vlc),
            request_timeout_secs: Some(5),
        };
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.catalog_url, config.catalog_url);
        assert_eq!(loaded.player(), PlayerType::Vlc);
        assert_eq!(loaded.request_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_load_from_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load_from(&dir.path().join("absent.toml")).is_err());
    }
}
