//! Shared HTTP client for listing, probe, page and upload requests.
//!
//! Search backends reject default library agents, so every request goes out
//! with a browser User-Agent: the configured one, or a random pick from a
//! built-in list.

use crate::config::ScraperConfig;
use crate::error::ScrapeError;
use rand::seq::SliceRandom;
use std::time::Duration;

/// Realistic browser User-Agent strings.
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:133.0) Gecko/20100101 Firefox/133.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:133.0) Gecko/20100101 Firefox/133.0",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
];

/// Build the [`reqwest::Client`] used for one harvester.
///
/// The client has a cookie store (consent pages), the configured timeout
/// on every request, a browser User-Agent, and a bounded redirect policy.
///
/// # Errors
///
/// Returns [`ScrapeError::Transport`] if the client cannot be constructed.
pub fn build_client(config: &ScraperConfig) -> Result<reqwest::Client, ScrapeError> {
    let ua = match config.user_agent {
        Some(ref custom) => custom.clone(),
        None => random_user_agent().to_owned(),
    };

    reqwest::Client::builder()
        .cookie_store(true)
        .timeout(Duration::from_secs(config.timeout_seconds))
        .user_agent(ua)
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
        .map_err(|e| ScrapeError::Transport(format!("failed to build HTTP client: {e}")))
}

/// Build a client that does not follow redirects.
///
/// The image upload endpoint answers with a redirect whose target carries
/// the token, so the first response must be inspected as-is.
///
/// # Errors
///
/// Returns [`ScrapeError::Transport`] if the client cannot be constructed.
pub fn build_upload_client(config: &ScraperConfig) -> Result<reqwest::Client, ScrapeError> {
    let ua = match config.user_agent {
        Some(ref custom) => custom.clone(),
        None => random_user_agent().to_owned(),
    };

    reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_seconds))
        .user_agent(ua)
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .map_err(|e| ScrapeError::Transport(format!("failed to build upload client: {e}")))
}

/// Select a random User-Agent string from the built-in list.
pub fn random_user_agent() -> &'static str {
    let mut rng = rand::thread_rng();
    USER_AGENTS
        .choose(&mut rng)
        .copied()
        .unwrap_or(USER_AGENTS[0])
}

/// GET `url` and return its body, treating anything but `200 OK` as a failure.
pub(crate) async fn get_text(client: &reqwest::Client, url: &str) -> Result<String, ScrapeError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| ScrapeError::Transport(format!("request to {url} failed: {e}")))?;

    let status = response.status();
    if status != reqwest::StatusCode::OK {
        return Err(ScrapeError::Transport(format!("{url} answered {status}")));
    }

    response
        .text()
        .await
        .map_err(|e| ScrapeError::Transport(format!("reading {url} failed: {e}")))
}
