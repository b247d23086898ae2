//! # Suppression Gate Runtime
//!
//! Process bootstrap for the suppression gate.
//!
//! ## Startup Sequence
//!
//! 1. Load configuration from the environment
//! 2. Initialize logging
//! 3. Load banners and suppression lists, build the index
//! 4. Start the periodic index verification task
//! 5. Answer line-delimited JSON requests on stdin until EOF or Ctrl+C

mod config;
mod logging;
mod server;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::watch;
use tracing::{error, info};

use suppression_gate::{
    ApiGatewayHandler, JsonFileBannerSource, JsonFileListSource, SuppressionGateService,
};

use crate::config::RuntimeConfig;

/// Build the gate from the configured seed files.
fn build_gate(config: &RuntimeConfig) -> Result<SuppressionGateService> {
    let lists = JsonFileListSource::new(&config.lists_path);
    let banners = JsonFileBannerSource::new(&config.banners_path);

    let (gate, report) = SuppressionGateService::from_sources(config.gate.clone(), &lists, &banners)
        .context("Failed to load seed data")?;

    info!(
        lists = report.loaded,
        skipped = report.skipped,
        identifiers = report.identifiers,
        banners = gate.health().total_banners,
        elapsed_ms = report.elapsed.as_millis() as u64,
        "Suppression gate ready"
    );
    Ok(gate)
}

/// Compare the index with a rebuild every `interval` until shutdown.
fn spawn_verifier(
    gate: Arc<SuppressionGateService>,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // The first tick completes immediately; the index was just built.
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = gate.verify_consistency() {
                        error!(error = %e, "Periodic verification repaired the index");
                    }
                }
                _ = shutdown.changed() => {
                    info!("Verifier shutdown signal received");
                    break;
                }
            }
        }
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = RuntimeConfig::from_env()?;
    logging::init_logging(&config.log_level, config.json_logs)?;

    info!("===========================================");
    info!("  Suppression Gate Runtime v{}", env!("CARGO_PKG_VERSION"));
    info!("===========================================");

    let gate = Arc::new(build_gate(&config)?);
    let handler = Arc::new(ApiGatewayHandler::new(gate.clone()));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let verifier = config
        .verify_interval
        .map(|interval| spawn_verifier(gate.clone(), interval, shutdown_rx.clone()));

    let lines = server::spawn_line_reader(std::io::BufReader::new(std::io::stdin()))
        .context("Failed to start stdin reader")?;
    let mut requests = tokio::spawn(server::serve(
        handler,
        lines,
        tokio::io::stdout(),
        shutdown_rx,
    ));
    info!("Accepting requests on stdin. Press Ctrl+C to stop.");

    let finished = tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result.context("Failed to listen for Ctrl+C")?;
            info!("Ctrl+C received");
            None
        }
        outcome = &mut requests => Some(outcome),
    };

    info!("Initiating graceful shutdown...");
    if let Err(e) = shutdown_tx.send(true) {
        error!("Failed to send shutdown signal: {}", e);
    }

    let outcome = match finished {
        Some(outcome) => outcome,
        None => requests.await,
    };
    match outcome {
        Ok(Ok(served)) => info!(served, "Request loop stopped"),
        Ok(Err(e)) => error!(error = %e, "Request loop failed"),
        Err(e) => error!(error = %e, "Request loop panicked"),
    }
    if let Some(verifier) = verifier {
        verifier.await.context("Verifier task panicked")?;
    }

    let metrics = gate.metrics_snapshot();
    info!(
        checks = metrics.checks_performed,
        suppressed = metrics.checks_suppressed,
        ads_served = metrics.ads_served,
        inconsistencies = metrics.inconsistencies,
        "Shutdown complete"
    );
    Ok(())
}
