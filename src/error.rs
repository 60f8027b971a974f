//! Error types for the webpage host.

use gscraper::ScrapeError;

/// Top-level error type for the host process.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    /// Configuration file could not be parsed or is invalid.
    #[error("config error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Response envelope could not be encoded.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Harvesting engine error.
    #[error(transparent)]
    Search(#[from] ScrapeError),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, HostError>;
