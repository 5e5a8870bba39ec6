//! Axum router construction for the population API.
//!
//! Assembles all routes (REST + `WebSocket`) into a single [`Router`]
//! with CORS enabled so any browser front end can connect.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::admin;
use crate::handlers;
use crate::state::AppState;
use crate::ws;

/// Build the complete Axum router.
///
/// The router includes:
/// - `GET /ws/population` -- live population stream
/// - `GET /api/realtime/current` -- current figures
/// - `GET /api/realtime/precise` -- current figures with per-second rates
/// - `GET /api/data` -- base statistics with current figures
/// - `GET /api/data/south-korea-only` -- South Korea only
/// - `GET /api/data/north-korea-only` -- North Korea only
/// - `GET /api/validation` -- growth rate cross-check
/// - `POST /api/admin/update-base-data` -- replace base statistics
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // WebSocket
        .route("/ws/population", get(ws::ws_population))
        // Read API
        .route("/api/realtime/current", get(handlers::realtime_current))
        .route("/api/realtime/precise", get(handlers::realtime_precise))
        .route("/api/data", get(handlers::all_data))
        .route("/api/data/south-korea-only", get(handlers::south_korea_only))
        .route("/api/data/north-korea-only", get(handlers::north_korea_only))
        .route("/api/validation", get(handlers::validation))
        // Admin
        .route("/api/admin/update-base-data", post(admin::update_base_data))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
