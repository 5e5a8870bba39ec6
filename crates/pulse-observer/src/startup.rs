//! Server startup helper for embedding in the engine binary.
//!
//! Provides [`spawn_observer`] which launches the HTTP + `WebSocket`
//! server on a background Tokio task so it runs alongside the broadcast
//! loop.

use std::sync::Arc;

use pulse_core::config::ServerConfig;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::server::{self, ServerError};
use crate::state::AppState;

/// Spawn the population API server on a background Tokio task.
///
/// The address is checked before spawning so obvious misconfiguration is
/// reported to the caller. The task runs until `shutdown` flips to
/// `true`; await the returned handle to wait for in-flight requests.
///
/// # Errors
///
/// Returns [`ServerError::Bind`] if the configured address is invalid.
pub fn spawn_observer(
    config: ServerConfig,
    state: Arc<AppState>,
    shutdown: watch::Receiver<bool>,
) -> Result<JoinHandle<()>, ServerError> {
    let addr = server::socket_addr(&config)?;

    let handle = tokio::spawn(async move {
        if let Err(e) = server::start_server(&config, state, shutdown).await {
            tracing::error!(error = %e, "Population API exited with error");
        }
    });

    tracing::info!(%addr, "Population API spawned on background task");

    Ok(handle)
}
