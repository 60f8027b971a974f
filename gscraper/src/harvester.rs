//! Paginated harvesting: listing → availability → extraction, page by page,
//! until enough valid records are collected.
//!
//! Pages are processed strictly one after another because the decision to
//! fetch the next page depends on how many records the previous one kept.
//! Within a page, probes and extractions run concurrently but records keep
//! their listing order.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::availability;
use crate::config::ScraperConfig;
use crate::error::ScrapeError;
use crate::extract::{self, ExtractionRules};
use crate::http;
use crate::image::ImageFingerprinter;
use crate::listing::{self, ListingMode};
use crate::query;
use crate::types::{ResultRecord, SearchSpec};
use crate::url_normalize::normalize_url;

/// Why a harvest stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HarvestStatus {
    /// `fetch_n` valid records were collected.
    Complete,
    /// Pages ran out of results, or the page caps were hit, first.
    PaginationExhausted { pages_fetched: usize },
    /// The listing fetch for `page` failed; records from earlier pages are kept.
    ListingUnavailable { page: usize },
}

/// Records collected by one harvest, in page-then-listing order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarvestOutcome {
    pub records: Vec<ResultRecord>,
    pub status: HarvestStatus,
}

/// Runs harvests against one search backend with a shared HTTP client.
#[derive(Debug, Clone)]
pub struct Harvester {
    client: reqwest::Client,
    fingerprinter: ImageFingerprinter,
    config: ScraperConfig,
}

impl Harvester {
    /// # Errors
    ///
    /// Returns [`ScrapeError::Config`] if `config` is invalid, or
    /// [`ScrapeError::Transport`] if the HTTP clients cannot be built.
    pub fn new(config: ScraperConfig) -> Result<Self, ScrapeError> {
        config.validate()?;
        Ok(Self {
            client: http::build_client(&config)?,
            fingerprinter: ImageFingerprinter::new(&config)?,
            config,
        })
    }

    /// Harvest up to `spec.fetch_n` records.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::Validation`] for a malformed spec (before any
    /// request is made) and [`ScrapeError::ImageEncoding`] when the image
    /// token cannot be obtained and degrading is not configured. Network
    /// failures on listing or result pages shrink the outcome instead.
    pub async fn harvest(&self, spec: &SearchSpec) -> Result<HarvestOutcome, ScrapeError> {
        spec.validate()?;
        let token = self.image_token(spec).await?;
        self.paginate(spec, token.as_deref()).await
    }

    /// [`Harvester::harvest`], abandoning every in-flight request as soon as
    /// `cancel` fires.
    ///
    /// # Errors
    ///
    /// As [`Harvester::harvest`], plus [`ScrapeError::Cancelled`].
    pub async fn harvest_with_cancel(
        &self,
        spec: &SearchSpec,
        cancel: &CancellationToken,
    ) -> Result<HarvestOutcome, ScrapeError> {
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                tracing::info!("harvest cancelled");
                Err(ScrapeError::Cancelled)
            }
            outcome = self.harvest(spec) => outcome,
        }
    }

    async fn image_token(&self, spec: &SearchSpec) -> Result<Option<String>, ScrapeError> {
        match self.fingerprinter.encode(spec.image.as_deref()).await {
            Ok(token) => Ok(token),
            Err(err) if self.config.degrade_image_errors => {
                tracing::warn!(error = %err, "image token unavailable, searching without image");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    async fn paginate(
        &self,
        spec: &SearchSpec,
        image_token: Option<&str>,
    ) -> Result<HarvestOutcome, ScrapeError> {
        let mode = ListingMode::new(spec.kind, image_token.is_some());
        let rules = ExtractionRules::from(spec);
        let mut records: Vec<ResultRecord> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut empty_streak = 0;

        for page in 0..self.config.max_pages {
            let remaining = spec.fetch_n - records.len();
            let request =
                query::encode_listing_request(spec, image_token, page, &self.config.search_url)?;
            let url = request.url();
            tracing::trace!(page, remaining, "fetching listing page");

            let html = match http::get_text(&self.client, url.as_str()).await {
                Ok(html) => html,
                Err(err) => {
                    tracing::warn!(url = %url, page, error = %err, "listing fetch failed");
                    return Ok(HarvestOutcome {
                        records,
                        status: HarvestStatus::ListingUnavailable { page },
                    });
                }
            };

            // Unreachable blocks must not use up the page's share of `remaining`.
            let limit = if spec.drop_unavailable {
                usize::MAX
            } else {
                remaining
            };
            let parsed = listing::parse_listing(&html, mode, limit, &self.config.search_url)?;
            if parsed.is_empty() {
                tracing::debug!(page, "listing page has no results");
                return Ok(exhausted(records, page + 1));
            }
            let candidates: Vec<_> = parsed
                .into_iter()
                .filter(|candidate| seen.insert(normalize_url(&candidate.url)))
                .collect();

            let candidates = if spec.drop_unavailable {
                let mut available = availability::filter_available(
                    &self.client,
                    candidates,
                    self.config.concurrency,
                )
                .await;
                available.truncate(remaining);
                available
            } else {
                candidates
            };

            let harvested = extract::extract_records(
                &self.client,
                candidates,
                &rules,
                self.config.concurrency,
            )
            .await;
            tracing::debug!(page, kept = harvested.len(), "listing page harvested");

            if harvested.is_empty() {
                empty_streak += 1;
                if empty_streak >= self.config.max_empty_pages {
                    tracing::debug!(page, empty_streak, "too many pages without results");
                    return Ok(exhausted(records, page + 1));
                }
            } else {
                empty_streak = 0;
            }

            records.extend(harvested);
            if records.len() >= spec.fetch_n {
                records.truncate(spec.fetch_n);
                return Ok(HarvestOutcome {
                    records,
                    status: HarvestStatus::Complete,
                });
            }
        }

        Ok(exhausted(records, self.config.max_pages))
    }
}

fn exhausted(records: Vec<ResultRecord>, pages_fetched: usize) -> HarvestOutcome {
    tracing::info!(count = records.len(), pages_fetched, "pagination exhausted");
    HarvestOutcome {
        records,
        status: HarvestStatus::PaginationExhausted { pages_fetched },
    }
}
