//! The population service: base statistics plus viewer membership.
//!
//! [`PopulationService`] is constructed once at startup and shared by
//! [`Arc`] with the broadcast loop, the `WebSocket` handler, the read
//! endpoints and the admin endpoint.
//!
//! Statistics are held as one [`Arc<CountryStatistics>`] per country. A
//! reader clones the pointers under a short read lock and computes from
//! them without holding the lock. An update builds a complete new record
//! and swaps the pointer, so a reader never observes a half-applied
//! update.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use pulse_types::{
    BaseDataUpdate, Country, CountryStatistics, InitialStateMessage, PopulationSnapshot,
    SimulationRates, StaticData,
};
use tokio::sync::RwLock;
use tracing::info;

use crate::estimator;
use crate::viewers::ViewerRegistry;

/// One consistent generation of both countries' statistics.
#[derive(Debug, Clone)]
struct StatisticsGeneration {
    south_korea: Arc<CountryStatistics>,
    north_korea: Arc<CountryStatistics>,
    last_updated: DateTime<Utc>,
}

/// Shared state behind every population read and broadcast.
#[derive(Debug)]
pub struct PopulationService {
    statistics: RwLock<StatisticsGeneration>,
    viewers: ViewerRegistry,
}

impl PopulationService {
    /// Create a service from explicit statistics and a viewer registry.
    pub fn new(
        south_korea: CountryStatistics,
        north_korea: CountryStatistics,
        viewers: ViewerRegistry,
    ) -> Self {
        Self {
            statistics: RwLock::new(StatisticsGeneration {
                south_korea: Arc::new(south_korea),
                north_korea: Arc::new(north_korea),
                last_updated: Utc::now(),
            }),
            viewers,
        }
    }

    /// Create a service with the built-in 2024 statistics.
    pub fn with_defaults() -> Self {
        Self::new(
            CountryStatistics::south_korea(),
            CountryStatistics::north_korea(),
            ViewerRegistry::default(),
        )
    }

    /// The connected viewers.
    pub const fn viewers(&self) -> &ViewerRegistry {
        &self.viewers
    }

    /// Current statistics for both countries, from the same generation.
    async fn current(&self) -> StatisticsGeneration {
        self.statistics.read().await.clone()
    }

    /// Snapshot of both countries at `now`.
    pub async fn snapshot_at(&self, now: DateTime<Utc>) -> PopulationSnapshot {
        let generation = self.current().await;
        estimator::snapshot(&generation.south_korea, &generation.north_korea, now)
    }

    /// Snapshot of both countries at the current wall-clock time.
    pub async fn get_snapshot(&self) -> PopulationSnapshot {
        self.snapshot_at(Utc::now()).await
    }

    /// Snapshot and animation rates computed from the same generation.
    pub async fn snapshot_with_rates(
        &self,
        now: DateTime<Utc>,
    ) -> (PopulationSnapshot, SimulationRates) {
        let generation = self.current().await;
        let snapshot = estimator::snapshot(&generation.south_korea, &generation.north_korea, now);
        let rates = SimulationRates::from_statistics(&generation.south_korea, &generation.north_korea);
        (snapshot, rates)
    }

    /// Per-second birth and death rates for both countries.
    pub async fn simulation_rates(&self) -> SimulationRates {
        let generation = self.current().await;
        SimulationRates::from_statistics(&generation.south_korea, &generation.north_korea)
    }

    /// Message sent to a viewer on connect.
    pub async fn initial_state(&self) -> InitialStateMessage {
        InitialStateMessage::from_snapshot(&self.get_snapshot().await)
    }

    /// Base statistics for both countries and when they last changed.
    pub async fn get_static_data(&self) -> StaticData {
        let generation = self.current().await;
        StaticData {
            south_korea: (*generation.south_korea).clone(),
            north_korea: (*generation.north_korea).clone(),
            last_updated: generation.last_updated,
        }
    }

    /// Replace one country's statistics with `update` applied.
    ///
    /// The caller is trusted: the country is already known and the values
    /// have been validated. Returns the new statistics.
    pub async fn update_base_data(
        &self,
        country: Country,
        update: &BaseDataUpdate,
    ) -> Arc<CountryStatistics> {
        let next = {
            let mut generation = self.statistics.write().await;
            let slot = match country {
                Country::SouthKorea => &mut generation.south_korea,
                Country::NorthKorea => &mut generation.north_korea,
            };
            let next = Arc::new(slot.with_update(update));
            *slot = Arc::clone(&next);
            generation.last_updated = Utc::now();
            next
        };

        let (births_per_sec, deaths_per_sec) = next.per_second_rates();
        info!(
            %country,
            base_population = next.base_population,
            base_year = next.base_year,
            annual_growth_rate = next.annual_growth_rate,
            births_per_sec,
            deaths_per_sec,
            "Base data updated"
        );
        next
    }

    /// Log the consistency of each country's figures.
    pub async fn log_verification(&self) {
        let generation = self.current().await;
        for (country, stats) in [
            (Country::SouthKorea, &generation.south_korea),
            (Country::NorthKorea, &generation.north_korea),
        ] {
            let report = stats.verify();
            let (births_per_sec, deaths_per_sec) = stats.per_second_rates();
            info!(
                %country,
                base_population = stats.base_population,
                annual_births = report.annual_births,
                annual_deaths = report.annual_deaths,
                net_change = report.net_change,
                stated_growth_rate = report.stated_growth_rate,
                calculated_growth_rate = report.calculated_growth_rate,
                discrepancy = report.discrepancy,
                daily_increment = stats.daily_increment(),
                births_per_sec,
                deaths_per_sec,
                "Base statistics verified"
            );
        }
    }
}
