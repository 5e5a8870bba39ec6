//! Deterministic population estimator.
//!
//! Every figure is a pure function of the base statistics and the wall
//! clock. Nothing is simulated or accumulated between calls.
//!
//! # Formulas
//!
//! - Population grows linearly from the fixed reference epoch
//!   (2024-01-01T00:00:00Z) at `annual_growth_rate` percent per 365.25-day
//!   year. The country's own `base_date` is not consulted.
//! - Births and deaths "today" count from midnight in Korea Standard Time
//!   (UTC+9): `annual * (seconds_since_midnight / 86400) / 365.25`.
//!
//! All integer outputs truncate toward zero.

use chrono::{DateTime, FixedOffset, Offset, Timelike, Utc};
use pulse_types::{
    CountryFigures, CountryStatistics, DAYS_PER_YEAR, PopulationSnapshot, SECONDS_PER_DAY,
    reference_epoch,
};

/// Offset of Korea Standard Time from UTC, in seconds.
pub const KST_OFFSET_SECS: i32 = 9 * 3600;

/// The fixed UTC+9 zone that defines "today".
pub fn korea_offset() -> FixedOffset {
    FixedOffset::east_opt(KST_OFFSET_SECS).unwrap_or_else(|| Utc.fix())
}

/// Convert an instant to Korea Standard Time.
pub fn korea_time(now: DateTime<Utc>) -> DateTime<FixedOffset> {
    now.with_timezone(&korea_offset())
}

/// Fractional days elapsed since the reference epoch. Negative before it.
#[allow(clippy::cast_precision_loss)]
pub fn elapsed_days(now: DateTime<Utc>) -> f64 {
    let delta = now.signed_duration_since(reference_epoch());
    let seconds = delta.num_seconds() as f64 + f64::from(delta.subsec_nanos()) / 1e9;
    seconds / SECONDS_PER_DAY
}

/// Whole seconds since the most recent midnight in Korea Standard Time.
pub fn seconds_since_local_midnight(now: DateTime<Utc>) -> u32 {
    korea_time(now).num_seconds_from_midnight()
}

/// Population estimate for `now`.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
pub fn current_population(stats: &CountryStatistics, now: DateTime<Utc>) -> i64 {
    let base = stats.base_population as f64;
    let increment = (stats.annual_growth_rate / 100.0) * base * (elapsed_days(now) / DAYS_PER_YEAR);
    (base + increment) as i64
}

/// Share of an annual count attributed to the part of today that has
/// elapsed.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn count_today(annual_count: u64, seconds_since_midnight: u32) -> u64 {
    let day_fraction = f64::from(seconds_since_midnight) / SECONDS_PER_DAY;
    (annual_count as f64 * day_fraction / DAYS_PER_YEAR) as u64
}

/// Estimate one country's population, births and deaths at `now`.
pub fn estimate(stats: &CountryStatistics, now: DateTime<Utc>) -> CountryFigures {
    let seconds = seconds_since_local_midnight(now);
    CountryFigures {
        population: current_population(stats, now),
        births_today: count_today(stats.annual_births, seconds),
        deaths_today: count_today(stats.annual_deaths, seconds),
    }
}

/// Estimate both countries at `now` and assemble a snapshot.
pub fn snapshot(
    south_korea: &CountryStatistics,
    north_korea: &CountryStatistics,
    now: DateTime<Utc>,
) -> PopulationSnapshot {
    let sk = estimate(south_korea, now);
    let nk = estimate(north_korea, now);
    PopulationSnapshot {
        timestamp: now,
        local_time: korea_time(now),
        south_korea: sk,
        north_korea: nk,
        total_population: sk.population.saturating_add(nk.population),
        seconds_since_local_midnight: seconds_since_local_midnight(now),
    }
}
