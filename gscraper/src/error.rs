//! Error types for the gscraper crate.
//!
//! Every variant carries a plain string message so errors stay `Send + Sync`
//! and can be shown to API callers as-is.

/// Errors that can occur while harvesting search results.
#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    /// A fetch failed to connect or returned a non-200 status.
    #[error("transport error: {0}")]
    Transport(String),

    /// The reverse-image token exchange failed or its response was unusable.
    #[error("image encoding error: {0}")]
    ImageEncoding(String),

    /// The search specification is malformed.
    #[error("validation error: {0}")]
    Validation(String),

    /// Markup could not be parsed (invalid selector, unusable URL).
    #[error("parse error: {0}")]
    Parse(String),

    /// Invalid scraper configuration.
    #[error("config error: {0}")]
    Config(String),

    /// The harvest was cancelled by its caller.
    #[error("harvest cancelled")]
    Cancelled,
}

/// Convenience type alias for gscraper results.
pub type Result<T> = std::result::Result<T, ScrapeError>;
