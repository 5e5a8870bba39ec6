//! Integration tests for the population API endpoints.
//!
//! REST tests use Axum's `Router` directly via `tower::ServiceExt` without
//! starting a TCP server. The `WebSocket` test binds a loopback port and
//! connects a real client, since an upgrade needs a live connection.

#![allow(clippy::unwrap_used, clippy::float_cmp)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use futures::StreamExt;
use pulse_core::config::BroadcastConfig;
use pulse_core::{Broadcaster, PopulationService};
use pulse_observer::router::build_router;
use pulse_observer::state::AppState;
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tower::ServiceExt;

const ADMIN_KEY: &str = "test-admin-key";

fn make_test_state() -> Arc<AppState> {
    Arc::new(AppState::new(
        Arc::new(PopulationService::with_defaults()),
        ADMIN_KEY,
    ))
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn get(state: Arc<AppState>, uri: &str) -> (StatusCode, Value) {
    let response = build_router(state)
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    (status, body_to_json(response.into_body()).await)
}

async fn post_update(state: Arc<AppState>, body: &Value) -> (StatusCode, Value) {
    let response = build_router(state)
        .oneshot(
            Request::post("/api/admin/update-base-data")
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    (status, body_to_json(response.into_body()).await)
}

// =========================================================================
// Read endpoints
// =========================================================================

#[tokio::test]
async fn test_realtime_current() {
    let (status, json) = get(make_test_state(), "/api/realtime/current").await;
    assert_eq!(status, StatusCode::OK);

    let sk = json["south_korea_population"].as_i64().unwrap();
    let nk = json["north_korea_population"].as_i64().unwrap();
    assert_eq!(json["total_population"].as_i64().unwrap(), sk + nk);
    assert!(json["births_deaths_today"]["south_korea"]["births"].is_u64());
    assert!(json["births_deaths_today"]["north_korea"]["deaths"].is_u64());
    assert!(json["korea_time"].as_str().unwrap().ends_with("+09:00"));
    assert!(json["timestamp"].is_f64());
}

#[tokio::test]
async fn test_realtime_precise() {
    let (status, json) = get(make_test_state(), "/api/realtime/precise").await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(json["recent_events"], Value::Array(Vec::new()));
    let rates = &json["realtime_rates_per_second"];
    assert_eq!(rates["south_korea"]["births_per_sec"].as_f64().unwrap(), 0.006_851_44);
    assert!(rates["south_korea"]["net_change_per_sec"].as_f64().unwrap() < 0.0);
    assert!(rates["north_korea"]["net_change_per_sec"].as_f64().unwrap() > 0.0);
    assert_eq!(
        json["expected_integer_changes"]["births_every_n_seconds"]["south_korea"]
            .as_f64()
            .unwrap(),
        146.0
    );
}

#[tokio::test]
async fn test_all_data() {
    let (status, json) = get(make_test_state(), "/api/data").await;
    assert_eq!(status, StatusCode::OK);

    let sk = &json["countries"]["south_korea"];
    assert_eq!(sk["name"], "South Korea");
    assert_eq!(sk["base_population"], 51_628_117);
    assert_eq!(sk["birth_rate"], 4.2);
    assert!(sk["current_population"].is_i64());

    let nk = &json["countries"]["north_korea"];
    assert_eq!(nk["annual_births"], 342_829);
    assert_eq!(nk["annual_deaths"], 238_941);

    let total = sk["current_population"].as_i64().unwrap()
        + nk["current_population"].as_i64().unwrap();
    assert_eq!(json["total_current_population"].as_i64().unwrap(), total);
    assert_eq!(json["realtime_enabled"], true);
}

#[tokio::test]
async fn test_single_country_endpoints() {
    let state = make_test_state();

    let (status, json) = get(Arc::clone(&state), "/api/data/south-korea-only").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["country"]["name"], "South Korea");
    assert!(json["data_source"].as_str().unwrap().starts_with("KOSIS"));

    let (status, json) = get(state, "/api/data/north-korea-only").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["country"]["name"], "North Korea");
    assert_eq!(json["data_source"], "CIA World Factbook 2024");
    assert!(json["note"].is_string());
}

#[tokio::test]
async fn test_validation() {
    let (status, json) = get(make_test_state(), "/api/validation").await;
    assert_eq!(status, StatusCode::OK);

    let sk = &json["validation"]["south_korea"];
    assert_eq!(sk["calculated_growth_rate_percent"], -0.21);
    assert_eq!(sk["validates"], true);
    assert_eq!(json["validation"]["north_korea"]["difference"], 0.0);
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let response = build_router(make_test_state())
        .oneshot(Request::get("/api/nope").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// =========================================================================
// Admin endpoint
// =========================================================================

#[tokio::test]
async fn test_update_base_data() {
    let state = make_test_state();
    let body = serde_json::json!({
        "country": "south_korea",
        "population": 51_700_000,
        "year": 2025,
        "growth_rate": -0.3,
        "admin_key": ADMIN_KEY,
    });

    let (status, json) = post_update(Arc::clone(&state), &body).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "success");
    assert_eq!(json["updated_data"]["base_population"], 51_700_000);
    assert_eq!(json["updated_data"]["annual_births"], 216_215);

    let (_, data) = get(state, "/api/data/south-korea-only").await;
    assert_eq!(data["country"]["base_year"], 2025);
    assert_eq!(data["country"]["annual_growth_rate"], -0.3);
}

#[tokio::test]
async fn test_update_rejects_bad_key() {
    let state = make_test_state();
    let body = serde_json::json!({
        "country": "north_korea",
        "population": 1,
        "year": 2025,
        "admin_key": "wrong",
    });

    let (status, json) = post_update(Arc::clone(&state), &body).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["status"], 401);

    let (_, data) = get(state, "/api/data/north-korea-only").await;
    assert_eq!(data["country"]["base_population"], 25_971_909);
}

#[tokio::test]
async fn test_update_rejects_missing_key() {
    let body = serde_json::json!({
        "country": "north_korea",
        "population": 1,
        "year": 2025,
    });
    let (status, _) = post_update(make_test_state(), &body).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_update_rejects_unknown_country() {
    let body = serde_json::json!({
        "country": "japan",
        "population": 125_000_000,
        "year": 2025,
        "admin_key": ADMIN_KEY,
    });
    let (status, json) = post_update(make_test_state(), &body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("japan"));
}

#[tokio::test]
async fn test_update_rejects_invalid_values() {
    let state = make_test_state();
    for body in [
        serde_json::json!({
            "country": "south_korea", "population": 0, "year": 2025, "admin_key": ADMIN_KEY,
        }),
        serde_json::json!({
            "country": "south_korea", "population": 5, "year": 2025, "deaths": -3,
            "admin_key": ADMIN_KEY,
        }),
        serde_json::json!({
            "country": "south_korea", "population": 5, "year": 2025, "growth_rate": 250.0,
            "admin_key": ADMIN_KEY,
        }),
        serde_json::json!({ "country": "south_korea" }),
    ] {
        let (status, json) = post_update(Arc::clone(&state), &body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body: {body}");
        assert_eq!(json["status"], 400);
    }

    let (_, data) = get(state, "/api/data/south-korea-only").await;
    assert_eq!(data["country"]["base_population"], 51_628_117);
}

// =========================================================================
// WebSocket
// =========================================================================

type ClientSocket =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

/// Read the next text frame as JSON, skipping control frames.
async fn next_text_json(socket: &mut ClientSocket) -> Value {
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(5), socket.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        if let WsMessage::Text(text) = frame {
            return serde_json::from_str(&text).unwrap();
        }
    }
}

#[tokio::test]
async fn test_ws_initial_state_then_ticks() {
    let service = Arc::new(PopulationService::with_defaults());
    let state = Arc::new(AppState::new(Arc::clone(&service), ADMIN_KEY));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let config = BroadcastConfig {
        interval_ms: 100,
        ..BroadcastConfig::default()
    };
    let broadcast = tokio::spawn(Broadcaster::new(Arc::clone(&service), &config).run(shutdown_rx));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = tokio::spawn(async move {
        axum::serve(listener, build_router(state)).await.unwrap();
    });

    let (mut socket, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/ws/population"))
        .await
        .unwrap();

    // Sent on connect, before any tick.
    let first = next_text_json(&mut socket).await;
    assert_eq!(first["type"], "initial_state");
    assert!(first["data"]["total_population"].as_i64().unwrap() > 70_000_000);
    assert_eq!(first["data"]["recent_events"], Value::Array(Vec::new()));
    assert_eq!(service.viewers().len().await, 1);

    // Then flat tick messages from the broadcast loop.
    let tick = next_text_json(&mut socket).await;
    assert!(tick.get("type").is_none());
    assert_eq!(tick["is_resync"], false);
    let sk = tick["south_korea_population"].as_i64().unwrap();
    let nk = tick["north_korea_population"].as_i64().unwrap();
    assert_eq!(tick["total_population"].as_i64().unwrap(), sk + nk);
    assert!(tick["simulation_rates"]["sk_births_per_sec"].is_f64());

    // Closing deregisters the viewer.
    socket.close(None).await.unwrap();
    for _ in 0..100 {
        if service.viewers().is_empty().await {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(service.viewers().is_empty().await);

    shutdown_tx.send(true).unwrap();
    let result = broadcast.await.unwrap();
    assert!(result.total_ticks >= 1);
    server.abort();
}
