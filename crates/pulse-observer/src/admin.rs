//! Administrative endpoint for replacing a country's base statistics.
//!
//! This is the only external mutator of the population model. The
//! service trusts its caller, so every check happens here:
//!
//! 1. The body must be valid JSON for [`UpdateBaseDataRequest`].
//! 2. `admin_key` must match the configured key (`401` otherwise).
//! 3. `country` must be `south_korea` or `north_korea`.
//! 4. Population must be positive, births and deaths non-negative, and
//!    the growth rate within +/-100 %.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/api/admin/update-base-data` | Replace one country's figures |

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use chrono::{DateTime, Utc};
use pulse_types::{BaseDataUpdate, Country};
use tracing::warn;
use validator::Validate;

use crate::error::ObserverError;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /api/admin/update-base-data`.
#[derive(Debug, serde::Deserialize, Validate)]
pub struct UpdateBaseDataRequest {
    /// `south_korea` or `north_korea` (case-insensitive).
    pub country: String,
    /// New base population.
    #[validate(range(min = 1))]
    pub population: i64,
    /// Year the figures refer to.
    pub year: i32,
    /// New base date; unchanged when absent.
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
    /// New annual births; unchanged when absent.
    #[serde(default)]
    #[validate(range(min = 0))]
    pub births: Option<i64>,
    /// New annual deaths; unchanged when absent.
    #[serde(default)]
    #[validate(range(min = 0))]
    pub deaths: Option<i64>,
    /// New annual growth rate in percent; unchanged when absent.
    #[serde(default)]
    pub growth_rate: Option<f64>,
    /// Shared secret authorizing the update.
    #[serde(default)]
    pub admin_key: Option<String>,
}

impl UpdateBaseDataRequest {
    /// Convert the validated request into a core update.
    fn to_update(&self) -> Result<BaseDataUpdate, ObserverError> {
        let non_negative = |field: &str, value: i64| {
            u64::try_from(value)
                .map_err(|e| ObserverError::InvalidRequest(format!("{field} must not be negative: {e}")))
        };
        if self
            .growth_rate
            .is_some_and(|g| !(-100.0..=100.0).contains(&g))
        {
            return Err(ObserverError::InvalidRequest(String::from(
                "growth_rate must be between -100 and 100",
            )));
        }

        Ok(BaseDataUpdate {
            population: non_negative("population", self.population)?,
            year: self.year,
            date: self.date,
            births: self.births.map(|b| non_negative("births", b)).transpose()?,
            deaths: self.deaths.map(|d| non_negative("deaths", d)).transpose()?,
            growth_rate: self.growth_rate,
        })
    }
}

// ---------------------------------------------------------------------------
// POST /api/admin/update-base-data
// ---------------------------------------------------------------------------

/// Replace one country's base statistics.
///
/// The body is parsed by hand so that malformed JSON is reported as
/// `400` in the same `{error, status}` shape as every other failure.
pub async fn update_base_data(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<impl IntoResponse, ObserverError> {
    let request: UpdateBaseDataRequest = serde_json::from_slice(&body)
        .map_err(|e| ObserverError::InvalidRequest(format!("malformed request body: {e}")))?;

    if !state.admin_key_matches(request.admin_key.as_deref()) {
        warn!(country = %request.country, "Rejected base data update with bad admin key");
        return Err(ObserverError::Unauthorized(String::from("invalid admin key")));
    }

    let country: Country = request.country.parse()?;
    request.validate()?;
    let update = request.to_update()?;

    let updated = state.service.update_base_data(country, &update).await;

    Ok(Json(serde_json::json!({
        "status": "success",
        "message": format!("{} base data updated", updated.name),
        "updated_data": &*updated,
        "timestamp": Utc::now().to_rfc3339(),
    })))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    fn request(json: serde_json::Value) -> UpdateBaseDataRequest {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn rejects_non_positive_population() {
        let req = request(serde_json::json!({
            "country": "south_korea", "population": 0, "year": 2025,
        }));
        assert!(req.validate().is_err());
    }

    #[test]
    fn rejects_negative_births() {
        let req = request(serde_json::json!({
            "country": "north_korea", "population": 10, "year": 2025, "births": -1,
        }));
        assert!(req.validate().is_err());
    }

    #[test]
    fn rejects_out_of_range_growth() {
        let req = request(serde_json::json!({
            "country": "south_korea", "population": 10, "year": 2025, "growth_rate": 150.0,
        }));
        assert!(req.validate().is_ok());
        assert!(req.to_update().is_err());
    }

    #[test]
    fn negative_count_error_keeps_its_cause() {
        let req = request(serde_json::json!({
            "country": "south_korea", "population": -5, "year": 2025,
        }));
        let Err(ObserverError::InvalidRequest(message)) = req.to_update() else {
            panic!("negative population must be rejected");
        };
        assert!(message.starts_with("population must not be negative: "));
        assert!(message.len() > "population must not be negative: ".len());
    }

    #[test]
    fn omitted_fields_stay_unset() {
        let req = request(serde_json::json!({
            "country": "north_korea", "population": 26_000_000, "year": 2025,
            "growth_rate": 0.35,
        }));
        assert!(req.validate().is_ok());
        let update = req.to_update().unwrap();
        assert_eq!(update.population, 26_000_000);
        assert_eq!(update.births, None);
        assert_eq!(update.deaths, None);
        assert_eq!(update.date, None);
        assert_eq!(update.growth_rate, Some(0.35));
    }
}
