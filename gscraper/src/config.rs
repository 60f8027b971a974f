//! Scraper configuration with sensible defaults.
//!
//! [`ScraperConfig`] controls where requests go, how long they may take,
//! how many run at once, and when pagination gives up. Every field has a
//! default so partial TOML/JSON documents deserialize cleanly.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ScrapeError;

/// Configuration shared by every harvest run through one [`crate::Harvester`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    /// Listing endpoint.
    pub search_url: String,
    /// Reverse-image upload endpoint.
    pub image_upload_url: String,
    /// Custom User-Agent string. If `None`, one is picked from a built-in
    /// list of realistic browser User-Agents.
    pub user_agent: Option<String>,
    /// Per-request timeout in seconds.
    pub timeout_seconds: u64,
    /// Maximum number of availability probes or page fetches in flight.
    pub concurrency: usize,
    /// Hard ceiling on listing pages fetched by one harvest.
    pub max_pages: usize,
    /// Consecutive pages yielding no valid record before the harvest gives up.
    pub max_empty_pages: usize,
    /// Fall back to a plain keyword search when the image token exchange fails.
    pub degrade_image_errors: bool,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            search_url: "https://www.google.com/search".into(),
            image_upload_url: "https://www.google.com/searchbyimage/upload".into(),
            user_agent: None,
            timeout_seconds: 10,
            concurrency: 4,
            max_pages: 10,
            max_empty_pages: 3,
            degrade_image_errors: false,
        }
    }
}

impl ScraperConfig {
    /// Validates this configuration, returning an error if any field is invalid.
    ///
    /// Checks:
    /// - `timeout_seconds`, `concurrency`, `max_pages` and `max_empty_pages` must be > 0
    /// - `search_url` and `image_upload_url` must be absolute URLs
    pub fn validate(&self) -> Result<(), ScrapeError> {
        if self.timeout_seconds == 0 {
            return Err(ScrapeError::Config(
                "timeout_seconds must be greater than 0".into(),
            ));
        }
        if self.concurrency == 0 {
            return Err(ScrapeError::Config(
                "concurrency must be greater than 0".into(),
            ));
        }
        if self.max_pages == 0 {
            return Err(ScrapeError::Config(
                "max_pages must be greater than 0".into(),
            ));
        }
        if self.max_empty_pages == 0 {
            return Err(ScrapeError::Config(
                "max_empty_pages must be greater than 0".into(),
            ));
        }
        for (name, value) in [
            ("search_url", &self.search_url),
            ("image_upload_url", &self.image_upload_url),
        ] {
            Url::parse(value)
                .map_err(|e| ScrapeError::Config(format!("{name} is not a valid URL: {e}")))?;
        }
        Ok(())
    }
}
