//! Periodic broadcast of population snapshots to connected viewers.
//!
//! [`Broadcaster::run`] is a single repeating task for the life of the
//! process. Each tick it estimates both countries, builds a
//! [`TickMessage`], serializes it once and queues the frame for every
//! viewer in the registry. Viewers whose queue rejects the frame are
//! evicted; the tick itself never fails.
//!
//! Ticks are scheduled on absolute due times by [`tokio::time::interval`],
//! so a slow tick does not push later ticks back. Shutdown stops
//! scheduling further ticks; there is nothing in flight to cancel.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use pulse_types::TickMessage;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::config::BroadcastConfig;
use crate::resync::ResyncTracker;
use crate::service::PopulationService;
use crate::viewers::DeliveryReport;

/// Outcome of one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    /// The message that was broadcast.
    pub message: TickMessage,
    /// Delivery counts for this tick.
    pub delivery: DeliveryReport,
}

/// Totals returned when the broadcast loop stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BroadcastResult {
    /// Ticks executed.
    pub total_ticks: u64,
    /// Ticks that carried the resync flag.
    pub resync_ticks: u64,
    /// Viewers evicted over the whole run.
    pub evicted: u64,
}

/// Drives the estimator on a timer and pushes results to viewers.
#[derive(Debug)]
pub struct Broadcaster {
    service: Arc<PopulationService>,
    interval: Duration,
    resync: ResyncTracker,
}

impl Broadcaster {
    /// Create a broadcaster whose resync clock starts now.
    pub fn new(service: Arc<PopulationService>, config: &BroadcastConfig) -> Self {
        Self::starting_at(service, config, Utc::now())
    }

    /// Create a broadcaster whose resync clock starts at `started_at`.
    pub fn starting_at(
        service: Arc<PopulationService>,
        config: &BroadcastConfig,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            service,
            interval: config.interval(),
            resync: ResyncTracker::new(config.resync_interval(), started_at),
        }
    }

    /// Run one tick for the instant `now`.
    pub async fn tick_at(&mut self, now: DateTime<Utc>) -> TickReport {
        let (snapshot, rates) = self.service.snapshot_with_rates(now).await;
        let is_resync = self.resync.check(now);
        let message = TickMessage::new(&snapshot, rates, is_resync);

        let delivery = match serde_json::to_string(&message) {
            Ok(json) => self.service.viewers().deliver(Arc::from(json)).await,
            Err(e) => {
                warn!("Failed to serialize tick message: {e}");
                DeliveryReport::default()
            }
        };

        if is_resync {
            info!(
                viewers = delivery.delivered,
                south_korea = snapshot.south_korea.population,
                north_korea = snapshot.north_korea.population,
                sk_births_per_sec = rates.sk_births_per_sec,
                sk_deaths_per_sec = rates.sk_deaths_per_sec,
                nk_births_per_sec = rates.nk_births_per_sec,
                nk_deaths_per_sec = rates.nk_deaths_per_sec,
                "Resync tick broadcast"
            );
        } else {
            debug!(
                viewers = delivery.delivered,
                evicted = delivery.evicted,
                total = snapshot.total_population,
                "Tick broadcast"
            );
        }

        TickReport { message, delivery }
    }

    /// Tick until `shutdown` becomes `true` or its sender is dropped.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> BroadcastResult {
        let mut result = BroadcastResult::default();
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            interval_ms = self.interval.as_millis(),
            resync_interval_secs = self.resync.interval().num_seconds(),
            "Population broadcast starting"
        );

        loop {
            if *shutdown.borrow() {
                break;
            }

            tokio::select! {
                _ = ticker.tick() => {
                    let report = self.tick_at(Utc::now()).await;
                    result.total_ticks = result.total_ticks.saturating_add(1);
                    if report.message.is_resync {
                        result.resync_ticks = result.resync_ticks.saturating_add(1);
                    }
                    let evicted = u64::try_from(report.delivery.evicted).unwrap_or(u64::MAX);
                    result.evicted = result.evicted.saturating_add(evicted);
                }
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        info!(
            total_ticks = result.total_ticks,
            resync_ticks = result.resync_ticks,
            evicted = result.evicted,
            "Population broadcast stopped"
        );
        result
    }
}
