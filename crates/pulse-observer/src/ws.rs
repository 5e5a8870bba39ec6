//! `WebSocket` handler for live population updates.
//!
//! Clients connect to `GET /ws/population`. The handler registers the
//! connection as a viewer, sends an `initial_state` message straight away,
//! then forwards every frame the broadcast loop queues for it.
//!
//! Client frames are ignored apart from Close and Ping. The viewer is
//! removed from the registry when the socket closes, a send fails, or the
//! broadcast loop evicts it.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use tracing::{debug, info, warn};

use crate::state::AppState;

/// Upgrade an HTTP request to a `WebSocket` connection and begin
/// streaming population updates.
///
/// # Route
///
/// `GET /ws/population`
pub async fn ws_population(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_ws(socket, state))
}

/// Handle the `WebSocket` lifecycle for one viewer.
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
    let viewers = state.service.viewers();
    let mut viewer = viewers.add_viewer().await;
    let count = viewers.len().await;
    info!(viewer = %viewer.id, viewers = count, "Viewer connected");

    let initial = state.service.initial_state().await;
    match serde_json::to_string(&initial) {
        Ok(json) => {
            if socket.send(Message::Text(json.into())).await.is_err() {
                debug!(viewer = %viewer.id, "Viewer disconnected before initial state");
                viewers.remove_viewer(viewer.id).await;
                return;
            }
        }
        Err(e) => warn!("Failed to serialize initial state: {e}"),
    }

    loop {
        tokio::select! {
            // Frame queued by the broadcast loop.
            frame = viewer.receiver.recv() => {
                let Some(frame) = frame else {
                    debug!(viewer = %viewer.id, "Viewer evicted by broadcaster");
                    break;
                };
                let msg = Message::Text(String::from(&*frame).into());
                if socket.send(msg).await.is_err() {
                    debug!(viewer = %viewer.id, "Viewer disconnected (send failed)");
                    break;
                }
            }
            // Client close, ping, or disconnect.
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => {
                        debug!(viewer = %viewer.id, "Viewer closed connection");
                        break;
                    }
                    Some(Ok(Message::Ping(data)))
                        if socket.send(Message::Pong(data.clone())).await.is_err() =>
                    {
                        debug!(viewer = %viewer.id, "Viewer disconnected (pong failed)");
                        break;
                    }
                    Some(Err(e)) => {
                        debug!(viewer = %viewer.id, "WebSocket error: {e}");
                        break;
                    }
                    _ => {
                        // Answered pings and other client frames carry nothing we use.
                    }
                }
            }
        }
    }

    viewers.remove_viewer(viewer.id).await;
    let count = viewers.len().await;
    info!(viewer = %viewer.id, viewers = count, "Viewer disconnected");
}
