//! Host process for the `gscraper` harvesting engine.
//!
//! Loads a [`HostConfig`], builds one [`gscraper::Harvester`], and serves
//! newline-delimited JSON search requests through [`host::serve`].

pub mod config;
pub mod error;
pub mod host;

pub use config::HostConfig;
pub use error::{HostError, Result};
pub use host::{Response, serve};
