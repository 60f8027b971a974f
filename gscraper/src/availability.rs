//! Availability probing: keep only candidates whose page answers `200 OK`.

use futures::stream::{self, StreamExt};

use crate::types::Candidate;

/// Returns `true` if a GET to `url` answers exactly `200 OK`.
///
/// Connection failures, timeouts and every other status count as unavailable.
pub async fn is_available(client: &reqwest::Client, url: &str) -> bool {
    match client.get(url).send().await {
        Ok(response) if response.status() == reqwest::StatusCode::OK => true,
        Ok(response) => {
            tracing::warn!(url, status = %response.status(), "candidate unavailable");
            false
        }
        Err(err) => {
            tracing::warn!(url, error = %err, "candidate unreachable");
            false
        }
    }
}

/// Probe every candidate with at most `concurrency` requests in flight and
/// drop the unavailable ones. Surviving candidates keep their listing order.
pub async fn filter_available(
    client: &reqwest::Client,
    candidates: Vec<Candidate>,
    concurrency: usize,
) -> Vec<Candidate> {
    let total = candidates.len();
    let available: Vec<Candidate> = stream::iter(candidates)
        .map(|candidate| async move {
            is_available(client, &candidate.url)
                .await
                .then_some(candidate)
        })
        .buffered(concurrency.max(1))
        .filter_map(|kept| async move { kept })
        .collect()
        .await;

    tracing::debug!(total, available = available.len(), "availability filter applied");
    available
}
