//! Newline-delimited JSON bridge for running harvests.
//!
//! Each input line is one [`SearchSpec`] as JSON. Each produces exactly one
//! output line, a [`Response`] holding the harvested records, why the
//! harvest stopped, or an error message. Requests are served one at a time
//! in input order.
//!
//! The output stream is reserved for the protocol; diagnostics go through
//! `tracing`.

use gscraper::{HarvestOutcome, HarvestStatus, Harvester, ResultRecord, ScrapeError, SearchSpec};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;

use crate::error::{HostError, Result};

/// One output line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub results: Vec<ResultRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<HarvestStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Response {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            results: Vec::new(),
            status: None,
            error: Some(message.into()),
        }
    }
}

impl From<HarvestOutcome> for Response {
    fn from(outcome: HarvestOutcome) -> Self {
        Self {
            results: outcome.records,
            status: Some(outcome.status),
            error: None,
        }
    }
}

/// Serve requests from `reader` until EOF or cancellation.
///
/// A malformed line or a failed harvest is answered with an error response
/// and the bridge keeps going. Cancellation answers the in-flight request
/// with an error and stops.
///
/// # Errors
///
/// Returns an error only if reading input or writing output fails.
pub async fn serve<R, W>(
    harvester: &Harvester,
    reader: R,
    mut writer: W,
    cancel: &CancellationToken,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();

    loop {
        let next = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            line = lines.next_line() => line?,
        };
        let Some(line) = next else {
            tracing::info!("input closed; shutting down bridge");
            break;
        };
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<SearchSpec>(trimmed) {
            Ok(spec) => handle(harvester, &spec, cancel).await,
            Err(e) => {
                tracing::warn!(error = %e, raw_line = %trimmed, "failed to parse search request");
                Response::error(format!("failed to parse search request: {e}"))
            }
        };
        write_line(&mut writer, &response).await?;

        if cancel.is_cancelled() {
            tracing::info!("cancelled; shutting down bridge");
            break;
        }
    }

    Ok(())
}

async fn handle(harvester: &Harvester, spec: &SearchSpec, cancel: &CancellationToken) -> Response {
    tracing::info!(query = %spec.query.text(), fetch_n = spec.fetch_n, "search request");
    match harvester.harvest_with_cancel(spec, cancel).await {
        Ok(outcome) => {
            tracing::info!(count = outcome.records.len(), status = ?outcome.status, "search finished");
            outcome.into()
        }
        Err(ScrapeError::Cancelled) => Response::error(ScrapeError::Cancelled.to_string()),
        Err(e) => {
            tracing::warn!(error = %e, "search failed");
            Response::error(e.to_string())
        }
    }
}

async fn write_line<W: AsyncWrite + Unpin>(writer: &mut W, response: &Response) -> Result<()> {
    let mut json = serde_json::to_string(response)
        .map_err(|e| HostError::Protocol(format!("failed to serialize response: {e}")))?;
    json.push('\n');
    writer.write_all(json.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}
