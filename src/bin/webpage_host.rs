//! Headless search bridge over stdin/stdout.
//!
//! Reads one JSON search request per stdin line and writes one JSON
//! response per stdout line. All tracing output goes to stderr so that
//! stdout remains a clean protocol channel.
//!
//! The config file is taken from `WEBPAGE_CONFIG` when set, otherwise from
//! [`HostConfig::default_config_path`].

use std::path::PathBuf;

use gscraper::Harvester;
use tokio::io::BufReader;
use tokio_util::sync::CancellationToken;
use webpage::HostConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::var_os("WEBPAGE_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(HostConfig::default_config_path);
    let config = HostConfig::load_or_default(&config_path)?;

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_filter)),
        )
        .init();

    tracing::info!(config = %config_path.display(), "webpage-host starting");

    let harvester = Harvester::new(config.scraper)?;
    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received; cancelling");
            ctrl_c.cancel();
        }
    });

    let stdin = BufReader::new(tokio::io::stdin());
    webpage::serve(&harvester, stdin, tokio::io::stdout(), &cancel)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "webpage-host exited with error");
            anyhow::anyhow!("webpage-host failed: {e}")
        })?;

    tracing::info!("webpage-host shut down cleanly");
    Ok(())
}
