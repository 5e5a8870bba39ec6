//! Countries and the official base statistics each estimate is computed from.
//!
//! A [`CountryStatistics`] record is never mutated in place. Administrative
//! updates build a new record with [`CountryStatistics::with_update`] so
//! readers always see one consistent generation of figures.

use core::fmt;
use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Length of the smoothed year in days (accounts for leap years).
pub const DAYS_PER_YEAR: f64 = 365.25;

/// Seconds in one calendar day.
pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// Unix timestamp of 2024-01-01T00:00:00Z, the instant all growth is
/// measured from.
pub const REFERENCE_EPOCH_UNIX_SECS: i64 = 1_704_067_200;

/// Return the reference epoch (2024-01-01T00:00:00Z) as a UTC timestamp.
pub fn reference_epoch() -> DateTime<Utc> {
    DateTime::from_timestamp(REFERENCE_EPOCH_UNIX_SECS, 0).unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

// ---------------------------------------------------------------------------
// Country
// ---------------------------------------------------------------------------

/// The two countries the service tracks.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum Country {
    /// Republic of Korea.
    SouthKorea,
    /// Democratic People's Republic of Korea.
    NorthKorea,
}

impl Country {
    /// Every tracked country, in display order.
    pub const ALL: [Self; 2] = [Self::SouthKorea, Self::NorthKorea];

    /// Wire name of the country (`south_korea` / `north_korea`).
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SouthKorea => "south_korea",
            Self::NorthKorea => "north_korea",
        }
    }
}

impl fmt::Display for Country {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a country name is not one of the tracked countries.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("country must be 'south_korea' or 'north_korea', got '{0}'")]
pub struct UnknownCountry(pub String);

impl FromStr for Country {
    type Err = UnknownCountry;

    /// Parse a country name case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "south_korea" => Ok(Self::SouthKorea),
            "north_korea" => Ok(Self::NorthKorea),
            _ => Err(UnknownCountry(s.to_owned())),
        }
    }
}

// ---------------------------------------------------------------------------
// CountryStatistics
// ---------------------------------------------------------------------------

/// Official demographic figures for one country.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct CountryStatistics {
    /// Display name.
    pub name: String,
    /// Population at the reference epoch.
    pub base_population: u64,
    /// Year the figures were published for.
    pub base_year: i32,
    /// Date the figures were last updated. Informational only: growth is
    /// always measured from the fixed reference epoch.
    pub base_date: DateTime<Utc>,
    /// Births per year.
    pub annual_births: u64,
    /// Deaths per year.
    pub annual_deaths: u64,
    /// Annual growth rate in percent (may be negative).
    pub annual_growth_rate: f64,
    /// Total fertility rate.
    pub fertility_rate: f64,
    /// Life expectancy at birth in years.
    pub life_expectancy: f64,
    /// Crude birth rate per 1000 inhabitants.
    #[serde(rename = "birth_rate")]
    pub birth_rate_per_1000: f64,
    /// Crude death rate per 1000 inhabitants.
    #[serde(rename = "death_rate")]
    pub death_rate_per_1000: f64,
    /// Publisher of the figures.
    #[serde(rename = "data_source")]
    pub source: String,
}

impl CountryStatistics {
    /// 2024 KOSIS figures for South Korea.
    pub fn south_korea() -> Self {
        Self {
            name: String::from("South Korea"),
            base_population: 51_628_117,
            base_year: 2024,
            base_date: reference_epoch(),
            annual_births: 216_215,
            annual_deaths: 325_162,
            annual_growth_rate: -0.21,
            fertility_rate: 0.748,
            life_expectancy: 75.5,
            birth_rate_per_1000: 4.2,
            death_rate_per_1000: 6.3,
            source: String::from("KOSIS (Korean Statistical Information Service)"),
        }
    }

    /// 2024 CIA World Factbook figures for North Korea.
    ///
    /// Births and deaths are the crude rates (13.2 and 9.2 per 1000)
    /// applied to the base population, truncated.
    pub fn north_korea() -> Self {
        Self {
            name: String::from("North Korea"),
            base_population: 25_971_909,
            base_year: 2024,
            base_date: reference_epoch(),
            annual_births: 342_829,
            annual_deaths: 238_941,
            annual_growth_rate: 0.4,
            fertility_rate: 1.9,
            life_expectancy: 72.3,
            birth_rate_per_1000: 13.2,
            death_rate_per_1000: 9.2,
            source: String::from("CIA World Factbook 2024"),
        }
    }

    /// Default figures for the given country.
    pub fn defaults_for(country: Country) -> Self {
        match country {
            Country::SouthKorea => Self::south_korea(),
            Country::NorthKorea => Self::north_korea(),
        }
    }

    /// Population change per day implied by the growth rate.
    #[allow(clippy::cast_precision_loss)]
    pub fn daily_increment(&self) -> f64 {
        let annual_increment = self.base_population as f64 * (self.annual_growth_rate / 100.0);
        annual_increment / DAYS_PER_YEAR
    }

    /// Births and deaths per second, for client-side display only.
    #[allow(clippy::cast_precision_loss)]
    pub fn per_second_rates(&self) -> (f64, f64) {
        let seconds_per_year = DAYS_PER_YEAR * SECONDS_PER_DAY;
        (
            self.annual_births as f64 / seconds_per_year,
            self.annual_deaths as f64 / seconds_per_year,
        )
    }

    /// Compare the stated growth rate with the one implied by annual
    /// births and deaths.
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_wrap)]
    pub fn verify(&self) -> GrowthVerification {
        let net_change = (self.annual_births as i64).saturating_sub(self.annual_deaths as i64);
        let calculated_growth_rate = if self.base_population == 0 {
            0.0
        } else {
            net_change as f64 / self.base_population as f64 * 100.0
        };
        GrowthVerification {
            annual_births: self.annual_births,
            annual_deaths: self.annual_deaths,
            net_change,
            stated_growth_rate: self.annual_growth_rate,
            calculated_growth_rate,
            discrepancy: (self.annual_growth_rate - calculated_growth_rate).abs(),
        }
    }

    /// Cross-check the growth rate against the per-1000 crude rates.
    pub fn validate(&self) -> GrowthValidation {
        let calculated = (self.birth_rate_per_1000 - self.death_rate_per_1000) / 10.0;
        let difference = (calculated - self.annual_growth_rate).abs();
        GrowthValidation {
            country: self.name.clone(),
            birth_rate_per_1000: self.birth_rate_per_1000,
            death_rate_per_1000: self.death_rate_per_1000,
            calculated_growth_rate_percent: round_to(calculated, 2),
            actual_growth_rate_percent: self.annual_growth_rate,
            difference: round_to(difference, 2),
            validates: difference < 1.0,
        }
    }

    /// Build the next generation of this record with an administrative
    /// update applied. Omitted optional fields keep their current value.
    #[must_use]
    pub fn with_update(&self, update: &BaseDataUpdate) -> Self {
        Self {
            base_population: update.population,
            base_year: update.year,
            base_date: update.date.unwrap_or(self.base_date),
            annual_births: update.births.unwrap_or(self.annual_births),
            annual_deaths: update.deaths.unwrap_or(self.annual_deaths),
            annual_growth_rate: update.growth_rate.unwrap_or(self.annual_growth_rate),
            ..self.clone()
        }
    }
}

/// Round `value` to `places` decimal places.
fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10_f64.powi(places);
    (value * factor).round() / factor
}

// ---------------------------------------------------------------------------
// Administrative update
// ---------------------------------------------------------------------------

/// New official figures for one country.
///
/// `population` and `year` are always replaced; the optional fields are
/// left unchanged when absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct BaseDataUpdate {
    /// New base population.
    pub population: u64,
    /// Year the new figures refer to.
    pub year: i32,
    /// New base date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<DateTime<Utc>>,
    /// New annual births.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub births: Option<u64>,
    /// New annual deaths.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deaths: Option<u64>,
    /// New annual growth rate in percent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub growth_rate: Option<f64>,
}

// ---------------------------------------------------------------------------
// Consistency reports
// ---------------------------------------------------------------------------

/// Stated versus implied growth rate for one country.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowthVerification {
    /// Births per year.
    pub annual_births: u64,
    /// Deaths per year.
    pub annual_deaths: u64,
    /// Births minus deaths.
    pub net_change: i64,
    /// Growth rate as published.
    pub stated_growth_rate: f64,
    /// Growth rate implied by `net_change`.
    pub calculated_growth_rate: f64,
    /// Absolute difference between the two.
    pub discrepancy: f64,
}

/// Growth rate cross-checked against the per-1000 crude rates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct GrowthValidation {
    /// Display name of the country.
    pub country: String,
    /// Crude birth rate per 1000.
    pub birth_rate_per_1000: f64,
    /// Crude death rate per 1000.
    pub death_rate_per_1000: f64,
    /// `(birth_rate - death_rate) / 10`, rounded to 2 places.
    pub calculated_growth_rate_percent: f64,
    /// Growth rate as published.
    pub actual_growth_rate_percent: f64,
    /// Absolute difference, rounded to 2 places.
    pub difference: f64,
    /// Whether the difference is under one percentage point.
    pub validates: bool,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn parse_country_names() {
        assert_eq!("south_korea".parse::<Country>().unwrap(), Country::SouthKorea);
        assert_eq!("North_Korea".parse::<Country>().unwrap(), Country::NorthKorea);
        assert!("japan".parse::<Country>().is_err());
    }

    #[test]
    fn north_korea_counts_follow_crude_rates() {
        let nk = CountryStatistics::north_korea();
        assert_eq!(nk.annual_births, 25_971_909 * 132 / 10_000);
        assert_eq!(nk.annual_deaths, 25_971_909 * 92 / 10_000);
    }

    #[test]
    fn per_second_rates_cover_a_year() {
        let sk = CountryStatistics::south_korea();
        let (births, deaths) = sk.per_second_rates();
        let year = DAYS_PER_YEAR * SECONDS_PER_DAY;
        assert!((births * year - 216_215.0).abs() < 1e-6);
        assert!((deaths * year - 325_162.0).abs() < 1e-6);
    }

    #[test]
    fn verification_reports_net_change() {
        let report = CountryStatistics::south_korea().verify();
        assert_eq!(report.net_change, 216_215 - 325_162);
        assert!(report.calculated_growth_rate < 0.0);
        assert!(report.discrepancy < 0.1);
    }

    #[test]
    fn validation_uses_crude_rates() {
        let report = CountryStatistics::north_korea().validate();
        assert_eq!(report.calculated_growth_rate_percent, 0.4);
        assert_eq!(report.difference, 0.0);
        assert!(report.validates);
    }

    #[test]
    fn growth_only_update_keeps_counts() {
        let sk = CountryStatistics::south_korea();
        let update = BaseDataUpdate {
            population: sk.base_population,
            year: sk.base_year,
            date: None,
            births: None,
            deaths: None,
            growth_rate: Some(-0.5),
        };
        let next = sk.with_update(&update);
        assert_eq!(next.annual_growth_rate, -0.5);
        assert_eq!(next.annual_births, sk.annual_births);
        assert_eq!(next.annual_deaths, sk.annual_deaths);
        assert_eq!(next.base_date, sk.base_date);
        assert_eq!(next.name, sk.name);
    }

    #[test]
    fn statistics_use_original_wire_names() {
        let json = serde_json::to_value(CountryStatistics::south_korea()).unwrap();
        assert_eq!(json["birth_rate"], 4.2);
        assert_eq!(json["death_rate"], 6.3);
        assert!(json["data_source"].as_str().unwrap().starts_with("KOSIS"));
    }
}
