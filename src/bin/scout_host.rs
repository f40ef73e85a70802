//! Headless host bridge binary for stdin/stdout JSON communication.
//!
//! Reads `CommandEnvelope` messages as newline-delimited JSON from stdin
//! and writes `ResponseEnvelope` and `EventEnvelope` lines to stdout.
//! Tracing goes to stderr so stdout stays a clean protocol channel.

use std::sync::Arc;

use asset_scout::host::handler::ScoutHostHandler;
use asset_scout::host::stdio::run_stdio_bridge;
use asset_scout::{AppConfig, HistoryStore, OnboardingStore};
use scout_search::{GeminiOracle, SearchSession};
use tokio::sync::broadcast;

/// Event broadcast capacity for the bridge.
const EVENT_CAPACITY: usize = 128;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "scout-host starting");

    let config_path = AppConfig::default_config_path();
    let config = AppConfig::load_or_default(&config_path)?;
    let scout_config = config.to_scout_config()?;
    let oracle = GeminiOracle::new(&scout_config)
        .map_err(|e| anyhow::anyhow!("cannot create oracle client: {e}"))?;
    let session = Arc::new(SearchSession::new(oracle, scout_config)?);

    let history = HistoryStore::open_default()?;
    let onboarding = OnboardingStore::at_default_path();

    let (event_tx, _) = broadcast::channel(EVENT_CAPACITY);
    let handler = ScoutHostHandler::new(
        session,
        history,
        onboarding,
        &config,
        tokio::runtime::Handle::current(),
        event_tx.clone(),
    );

    run_stdio_bridge(handler, event_tx).await.map_err(|e| {
        tracing::error!(error = %e, "scout-host exited with error");
        anyhow::anyhow!("scout-host failed: {e}")
    })?;

    tracing::info!("scout-host shut down cleanly");
    Ok(())
}
