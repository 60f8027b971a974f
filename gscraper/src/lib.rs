//! # gscraper
//!
//! Search result harvesting with page content extraction.
//!
//! Issues a query against a web search backend, walks its listing pages,
//! and turns each usable result into a [`ResultRecord`] carrying the page's
//! title, listing description, author (news), images and body text.
//!
//! ## Pipeline
//!
//! For each listing page, in order:
//!
//! 1. [`query`] encodes the listing request (filters, page offset, and the
//!    reverse-image token from [`image`] when searching by image)
//! 2. [`listing`] parses result blocks into candidates
//! 3. [`availability`] drops candidates whose page does not answer `200 OK`
//! 4. [`extract`] fetches each page, strips hidden and excluded markup, and
//!    applies the word-count content boundary
//! 5. [`harvester`] keeps going to the next page until `fetch_n` records are
//!    collected or the page caps in [`ScraperConfig`] are reached
//!
//! Network failures never abort a harvest; they shrink it. Only a malformed
//! [`SearchSpec`] or a failed image token exchange is an error.

pub mod availability;
pub mod config;
pub mod error;
pub mod extract;
pub mod harvester;
pub mod http;
pub mod image;
pub mod listing;
pub mod query;
pub mod types;
pub mod url_normalize;

pub use config::ScraperConfig;
pub use error::{Result, ScrapeError};
pub use harvester::{HarvestOutcome, HarvestStatus, Harvester};
pub use types::{
    Candidate, ImageRef, Language, Query, Recency, ResultRecord, SearchKind, SearchSpec, TagSet,
};

/// Harvest results for `spec` with a one-off [`Harvester`].
///
/// # Errors
///
/// Returns [`ScrapeError::Config`] for an invalid `config`, otherwise the
/// same errors as [`Harvester::harvest`].
///
/// # Examples
///
/// ```no_run
/// # async fn example() -> gscraper::Result<()> {
/// let spec = gscraper::SearchSpec {
///     fetch_n: 3,
///     ..gscraper::SearchSpec::new("rust ownership")
/// };
/// let outcome = gscraper::search(&spec, &gscraper::ScraperConfig::default()).await?;
/// for record in &outcome.records {
///     println!("{}: {}", record.title, record.url);
/// }
/// # Ok(())
/// # }
/// ```
pub async fn search(spec: &SearchSpec, config: &ScraperConfig) -> Result<HarvestOutcome> {
    Harvester::new(config.clone())?.harvest(spec).await
}
