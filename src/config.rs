//! Host configuration loaded from TOML.

use std::path::{Path, PathBuf};

use gscraper::ScraperConfig;
use serde::{Deserialize, Serialize};

use crate::error::{HostError, Result};

/// Default `tracing` filter when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "gscraper=info,webpage=info";

/// Top-level configuration for the `webpage-host` process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// `tracing` filter directive, overridden by `RUST_LOG`.
    pub log_filter: String,
    /// Harvesting engine settings.
    pub scraper: ScraperConfig,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            log_filter: DEFAULT_LOG_FILTER.to_owned(),
            scraper: ScraperConfig::default(),
        }
    }
}

impl HostConfig {
    /// Load configuration from a TOML file and validate the scraper section.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid TOML, or
    /// holds an invalid `[scraper]` table.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content).map_err(|e| HostError::Config(e.to_string()))?;
        config
            .scraper
            .validate()
            .map_err(|e| HostError::Config(format!("{}: {e}", path.display())))?;
        Ok(config)
    }

    /// Load `path` if it exists, otherwise fall back to defaults.
    ///
    /// # Errors
    ///
    /// Returns an error only when an existing file fails to load.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::from_file(path)
        } else {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Returns the default config file path: `~/.config/webpage/config.toml`.
    pub fn default_config_path() -> PathBuf {
        if let Some(config) = std::env::var_os("XDG_CONFIG_HOME") {
            PathBuf::from(config).join("webpage").join("config.toml")
        } else if let Some(home) = std::env::var_os("HOME") {
            PathBuf::from(home)
                .join(".config")
                .join("webpage")
                .join("config.toml")
        } else {
            PathBuf::from("/tmp/webpage-config/config.toml")
        }
    }
}
