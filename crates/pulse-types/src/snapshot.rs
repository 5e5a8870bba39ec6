//! Derived population state handed to viewers and REST callers.
//!
//! Snapshots are recomputed on every tick or request and never stored.

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::country::{Country, CountryStatistics};

/// Estimated figures for one country at a single instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct CountryFigures {
    /// Current population estimate.
    pub population: i64,
    /// Births since local midnight.
    pub births_today: u64,
    /// Deaths since local midnight.
    pub deaths_today: u64,
}

/// Population state of both countries at one instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopulationSnapshot {
    /// Instant the snapshot was computed for.
    pub timestamp: DateTime<Utc>,
    /// The same instant in Korea Standard Time (UTC+9).
    pub local_time: DateTime<FixedOffset>,
    /// Figures for South Korea.
    pub south_korea: CountryFigures,
    /// Figures for North Korea.
    pub north_korea: CountryFigures,
    /// Sum of both populations.
    pub total_population: i64,
    /// Whole seconds elapsed since local midnight.
    pub seconds_since_local_midnight: u32,
}

impl PopulationSnapshot {
    /// Figures for a single country.
    pub const fn figures(&self, country: Country) -> &CountryFigures {
        match country {
            Country::SouthKorea => &self.south_korea,
            Country::NorthKorea => &self.north_korea,
        }
    }

    /// Unix timestamp in fractional seconds.
    #[allow(clippy::cast_precision_loss)]
    pub fn timestamp_secs(&self) -> f64 {
        self.timestamp.timestamp_micros() as f64 / 1_000_000.0
    }

    /// Local wall-clock time formatted as `HH:MM:SS`.
    pub fn korea_time(&self) -> String {
        self.local_time.format("%H:%M:%S").to_string()
    }
}

/// Current base statistics for both countries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct StaticData {
    /// South Korea base statistics.
    pub south_korea: CountryStatistics,
    /// North Korea base statistics.
    pub north_korea: CountryStatistics,
    /// When the statistics were loaded or last replaced.
    pub last_updated: DateTime<Utc>,
}

impl StaticData {
    /// Statistics for a single country.
    pub const fn statistics(&self, country: Country) -> &CountryStatistics {
        match country {
            Country::SouthKorea => &self.south_korea,
            Country::NorthKorea => &self.north_korea,
        }
    }
}
