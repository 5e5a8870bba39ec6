//! REST API endpoint handlers for population reads.
//!
//! Every handler computes a fresh snapshot from the shared
//! [`PopulationService`](pulse_core::PopulationService); nothing is cached.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/api/realtime/current` | Current populations and today's counts |
//! | `GET` | `/api/realtime/precise` | Current state plus per-second rates |
//! | `GET` | `/api/data` | Base statistics merged with current figures |
//! | `GET` | `/api/data/south-korea-only` | South Korea only |
//! | `GET` | `/api/data/north-korea-only` | North Korea only |
//! | `GET` | `/api/validation` | Growth rate cross-check per country |

use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use pulse_core::estimator;
use pulse_types::{Country, CountryFigures, CountryStatistics, PopulationSnapshot};

use crate::error::ObserverError;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// GET /api/realtime/current
// ---------------------------------------------------------------------------

/// Return the current populations with today's births and deaths.
pub async fn realtime_current(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ObserverError> {
    let snapshot = state.service.get_snapshot().await;

    Ok(Json(serde_json::json!({
        "timestamp": snapshot.timestamp_secs(),
        "south_korea_population": snapshot.south_korea.population,
        "north_korea_population": snapshot.north_korea.population,
        "total_population": snapshot.total_population,
        "births_deaths_today": births_deaths_today(&snapshot),
        "korea_time": snapshot.local_time.to_rfc3339(),
    })))
}

// ---------------------------------------------------------------------------
// GET /api/realtime/precise
// ---------------------------------------------------------------------------

/// Return the current state with per-second rates and the expected number
/// of seconds between whole births and deaths.
pub async fn realtime_precise(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ObserverError> {
    let (snapshot, rates) = state.service.snapshot_with_rates(chrono::Utc::now()).await;

    let sk_net = rates.sk_births_per_sec - rates.sk_deaths_per_sec;
    let nk_net = rates.nk_births_per_sec - rates.nk_deaths_per_sec;
    let total_births = rates.sk_births_per_sec + rates.nk_births_per_sec;
    let total_deaths = rates.sk_deaths_per_sec + rates.nk_deaths_per_sec;

    Ok(Json(serde_json::json!({
        "timestamp": snapshot.timestamp_secs(),
        "south_korea_population": snapshot.south_korea.population,
        "north_korea_population": snapshot.north_korea.population,
        "total_population": snapshot.total_population,
        "births_deaths_today": births_deaths_today(&snapshot),
        "recent_events": [],
        "realtime_rates_per_second": {
            "south_korea": {
                "births_per_sec": round_to(rates.sk_births_per_sec, 8),
                "deaths_per_sec": round_to(rates.sk_deaths_per_sec, 8),
                "net_change_per_sec": round_to(sk_net, 8),
            },
            "north_korea": {
                "births_per_sec": round_to(rates.nk_births_per_sec, 8),
                "deaths_per_sec": round_to(rates.nk_deaths_per_sec, 8),
                "net_change_per_sec": round_to(nk_net, 8),
            },
            "combined": {
                "total_births_per_sec": round_to(total_births, 8),
                "total_deaths_per_sec": round_to(total_deaths, 8),
                "total_net_change_per_sec": round_to(total_births - total_deaths, 8),
            },
        },
        "expected_integer_changes": {
            "births_every_n_seconds": {
                "south_korea": seconds_between(rates.sk_births_per_sec),
                "north_korea": seconds_between(rates.nk_births_per_sec),
            },
            "deaths_every_n_seconds": {
                "south_korea": seconds_between(rates.sk_deaths_per_sec),
                "north_korea": seconds_between(rates.nk_deaths_per_sec),
            },
        },
        "korea_time": snapshot.local_time.to_rfc3339(),
    })))
}

// ---------------------------------------------------------------------------
// GET /api/data
// ---------------------------------------------------------------------------

/// Return base statistics for both countries merged with their current
/// figures.
pub async fn all_data(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ObserverError> {
    let static_data = state.service.get_static_data().await;
    let snapshot = state.service.get_snapshot().await;

    Ok(Json(serde_json::json!({
        "countries": {
            "south_korea": country_entry(&static_data.south_korea, &snapshot.south_korea)?,
            "north_korea": country_entry(&static_data.north_korea, &snapshot.north_korea)?,
        },
        "total_current_population": snapshot.total_population,
        "last_updated": estimator::korea_time(static_data.last_updated).to_rfc3339(),
        "realtime_enabled": true,
    })))
}

// ---------------------------------------------------------------------------
// GET /api/data/{south,north}-korea-only
// ---------------------------------------------------------------------------

/// Return South Korea's base statistics and current figures.
pub async fn south_korea_only(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ObserverError> {
    single_country(&state, Country::SouthKorea, "Official government statistics from South Korea")
        .await
        .map(Json)
}

/// Return North Korea's base statistics and current figures.
pub async fn north_korea_only(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ObserverError> {
    single_country(
        &state,
        Country::NorthKorea,
        "This data may have limitations due to restricted access to North Korea",
    )
    .await
    .map(Json)
}

async fn single_country(
    state: &AppState,
    country: Country,
    note: &str,
) -> Result<serde_json::Value, ObserverError> {
    let static_data = state.service.get_static_data().await;
    let snapshot = state.service.get_snapshot().await;
    let base = static_data.statistics(country);

    Ok(serde_json::json!({
        "country": country_entry(base, snapshot.figures(country))?,
        "data_source": base.source,
        "note": note,
        "last_updated": estimator::korea_time(static_data.last_updated).to_rfc3339(),
    }))
}

// ---------------------------------------------------------------------------
// GET /api/validation
// ---------------------------------------------------------------------------

/// Cross-check each country's growth rate against its crude birth and
/// death rates.
pub async fn validation(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ObserverError> {
    let static_data = state.service.get_static_data().await;

    Ok(Json(serde_json::json!({
        "validation": {
            "south_korea": static_data.south_korea.validate(),
            "north_korea": static_data.north_korea.validate(),
        },
    })))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn births_deaths_today(snapshot: &PopulationSnapshot) -> serde_json::Value {
    serde_json::json!({
        "south_korea": {
            "births": snapshot.south_korea.births_today,
            "deaths": snapshot.south_korea.deaths_today,
        },
        "north_korea": {
            "births": snapshot.north_korea.births_today,
            "deaths": snapshot.north_korea.deaths_today,
        },
    })
}

/// Serialize base statistics and add the live figures alongside them.
fn country_entry(
    stats: &CountryStatistics,
    figures: &CountryFigures,
) -> Result<serde_json::Value, ObserverError> {
    let mut entry = serde_json::to_value(stats)?;
    let object = entry
        .as_object_mut()
        .ok_or_else(|| ObserverError::Internal("statistics did not serialize to an object".to_owned()))?;
    object.insert("current_population".to_owned(), figures.population.into());
    object.insert("births_today".to_owned(), figures.births_today.into());
    object.insert("deaths_today".to_owned(), figures.deaths_today.into());
    Ok(entry)
}

/// Round `value` to `places` decimal places.
fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10_f64.powi(places);
    (value * factor).round() / factor
}

/// Seconds between whole events at `rate` per second, to one decimal.
/// `None` (JSON `null`) when the rate is zero.
fn seconds_between(rate: f64) -> Option<f64> {
    (rate > 0.0).then(|| round_to(1.0 / rate, 1))
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn rounding() {
        assert_eq!(round_to(0.006_851_439_906_7, 8), 0.006_851_44);
        assert_eq!(seconds_between(0.006_851_439_906_710_269), Some(146.0));
        assert_eq!(seconds_between(0.0), None);
    }
}
