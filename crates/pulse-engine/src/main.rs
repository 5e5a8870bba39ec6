//! Pulse of Korea engine binary.
//!
//! Wires the population service, the broadcast loop and the HTTP server
//! together and runs them until `Ctrl-C`.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `pulse-config.yaml` (defaults if absent)
//! 2. Initialize structured logging (tracing)
//! 3. Build the population service from the configured statistics
//! 4. Log the consistency of the base statistics
//! 5. Spawn the broadcast loop
//! 6. Spawn the API server
//! 7. Wait for `Ctrl-C`, then stop both tasks

mod error;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use pulse_core::config::{LoggingConfig, PulseConfig};
use pulse_core::{Broadcaster, PopulationService, ViewerRegistry};
use pulse_observer::AppState;
use pulse_types::Country;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;

/// Path of the configuration file, relative to the working directory.
const CONFIG_PATH: &str = "pulse-config.yaml";

/// How long to wait for in-flight HTTP requests after shutdown.
const SERVER_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration cannot be loaded, the server address
/// is invalid, or a background task fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration.
    let config = load_config()?;

    // 2. Initialize structured logging.
    init_tracing(&config.logging);
    info!(
        host = config.server.host,
        port = config.server.port,
        interval_ms = config.broadcast.interval_ms,
        resync_interval_secs = config.broadcast.resync_interval_secs,
        "pulse-engine starting"
    );

    // 3. Build the population service.
    let viewers = ViewerRegistry::new(config.broadcast.viewer_queue_capacity);
    let [south_korea, north_korea] = Country::ALL.map(|c| config.statistics.resolve(c));
    let service = Arc::new(PopulationService::new(south_korea, north_korea, viewers));

    // 4. Log base statistics.
    service.log_verification().await;

    // 5. Spawn the broadcast loop.
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let broadcaster = Broadcaster::new(Arc::clone(&service), &config.broadcast);
    let broadcast_handle = tokio::spawn(broadcaster.run(shutdown_rx.clone()));
    info!("Broadcast loop started");

    // 6. Spawn the API server.
    let state = Arc::new(AppState::new(
        Arc::clone(&service),
        config.admin.update_key.clone(),
    ));
    let server_handle = pulse_observer::spawn_observer(config.server.clone(), state, shutdown_rx)
        .map_err(EngineError::from)?;

    // 7. Run until interrupted.
    tokio::signal::ctrl_c().await.map_err(EngineError::from)?;
    info!("Shutdown requested");
    // Send only fails when every receiver is gone, in which case both
    // tasks have already stopped.
    let _ = shutdown_tx.send(true);

    let result = broadcast_handle.await.map_err(|e| EngineError::Task {
        message: format!("broadcast loop: {e}"),
    })?;
    info!(
        total_ticks = result.total_ticks,
        resync_ticks = result.resync_ticks,
        evicted = result.evicted,
        "Broadcast loop stopped"
    );

    match tokio::time::timeout(SERVER_DRAIN_TIMEOUT, server_handle).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            return Err(EngineError::Task {
                message: format!("api server: {e}"),
            }
            .into());
        }
        Err(_) => warn!(
            timeout_secs = SERVER_DRAIN_TIMEOUT.as_secs(),
            "API server did not drain in time"
        ),
    }

    info!("pulse-engine stopped");
    Ok(())
}

/// Load configuration from `pulse-config.yaml`.
///
/// If the file does not exist, defaults are used with environment
/// overrides applied.
fn load_config() -> Result<PulseConfig, EngineError> {
    let config_path = Path::new(CONFIG_PATH);
    if config_path.exists() {
        Ok(PulseConfig::from_file(config_path)?)
    } else {
        let mut config = PulseConfig::default();
        config.apply_env_overrides();
        Ok(config)
    }
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over the configured level when set.
fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    if logging.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }
}
