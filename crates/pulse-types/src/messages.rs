//! JSON messages pushed to viewers over the `WebSocket`.
//!
//! Two shapes exist: the flat [`TickMessage`] sent once per broadcast tick,
//! and the [`InitialStateMessage`] sent once when a viewer connects. The
//! initial message is tagged `"type": "initial_state"` and nests its fields
//! under `data` so a receiver can tell the two apart.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::country::CountryStatistics;
use crate::snapshot::PopulationSnapshot;

/// Per-second birth and death rates used by clients to animate between
/// authoritative ticks.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SimulationRates {
    /// South Korea births per second.
    pub sk_births_per_sec: f64,
    /// South Korea deaths per second.
    pub sk_deaths_per_sec: f64,
    /// North Korea births per second.
    pub nk_births_per_sec: f64,
    /// North Korea deaths per second.
    pub nk_deaths_per_sec: f64,
}

impl SimulationRates {
    /// Derive the rates from both countries' base statistics.
    pub fn from_statistics(south_korea: &CountryStatistics, north_korea: &CountryStatistics) -> Self {
        let (sk_births_per_sec, sk_deaths_per_sec) = south_korea.per_second_rates();
        let (nk_births_per_sec, nk_deaths_per_sec) = north_korea.per_second_rates();
        Self {
            sk_births_per_sec,
            sk_deaths_per_sec,
            nk_births_per_sec,
            nk_deaths_per_sec,
        }
    }
}

/// Event flags on tick messages. The server never generates events, so
/// both are always `false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct EventIndicators {
    /// A birth happened since the last tick.
    pub any_birth: bool,
    /// A death happened since the last tick.
    pub any_death: bool,
}

/// The message broadcast to every viewer once per tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct TickMessage {
    /// Unix timestamp in fractional seconds.
    pub timestamp: f64,
    /// South Korea population estimate.
    pub south_korea_population: i64,
    /// North Korea population estimate.
    pub north_korea_population: i64,
    /// Sum of both populations.
    pub total_population: i64,
    /// South Korea births since local midnight.
    pub sk_births_today: u64,
    /// South Korea deaths since local midnight.
    pub sk_deaths_today: u64,
    /// North Korea births since local midnight.
    pub nk_births_today: u64,
    /// North Korea deaths since local midnight.
    pub nk_deaths_today: u64,
    /// Korea Standard Time as `HH:MM:SS`.
    pub korea_time: String,
    /// Whole seconds since local midnight.
    pub seconds_since_midnight: u32,
    /// Set on the coarse reconciliation cadence.
    pub is_resync: bool,
    /// Client-side animation rates.
    pub simulation_rates: SimulationRates,
    /// Always-false event flags.
    pub event_indicators: EventIndicators,
}

impl TickMessage {
    /// Flatten a snapshot into the tick wire format.
    pub fn new(snapshot: &PopulationSnapshot, rates: SimulationRates, is_resync: bool) -> Self {
        Self {
            timestamp: snapshot.timestamp_secs(),
            south_korea_population: snapshot.south_korea.population,
            north_korea_population: snapshot.north_korea.population,
            total_population: snapshot.total_population,
            sk_births_today: snapshot.south_korea.births_today,
            sk_deaths_today: snapshot.south_korea.deaths_today,
            nk_births_today: snapshot.north_korea.births_today,
            nk_deaths_today: snapshot.north_korea.deaths_today,
            korea_time: snapshot.korea_time(),
            seconds_since_midnight: snapshot.seconds_since_local_midnight,
            is_resync,
            simulation_rates: rates,
            event_indicators: EventIndicators::default(),
        }
    }
}

/// Tag carried in the `type` field of non-tick messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum MessageType {
    /// Full state sent once on connect.
    InitialState,
}

/// Per-country event placeholders carried by the initial message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[allow(clippy::struct_excessive_bools)]
pub struct CountryEventIndicators {
    /// South Korea birth flag.
    pub south_korea_birth: bool,
    /// South Korea death flag.
    pub south_korea_death: bool,
    /// North Korea birth flag.
    pub north_korea_birth: bool,
    /// North Korea death flag.
    pub north_korea_death: bool,
    /// Any birth flag.
    pub any_birth: bool,
    /// Any death flag.
    pub any_death: bool,
}

/// Payload of the initial-state message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct InitialStateData {
    /// South Korea population estimate.
    pub south_korea_population: i64,
    /// North Korea population estimate.
    pub north_korea_population: i64,
    /// Sum of both populations.
    pub total_population: i64,
    /// South Korea births since local midnight.
    pub sk_births_today: u64,
    /// South Korea deaths since local midnight.
    pub sk_deaths_today: u64,
    /// North Korea births since local midnight.
    pub nk_births_today: u64,
    /// North Korea deaths since local midnight.
    pub nk_deaths_today: u64,
    /// Korea Standard Time as `HH:MM:SS`.
    pub korea_time: String,
    /// Always-false event flags.
    pub event_indicators: CountryEventIndicators,
    /// Always empty; kept for receiver compatibility.
    pub recent_visual_events: Vec<serde_json::Value>,
    /// Always empty; kept for receiver compatibility.
    pub recent_events: Vec<serde_json::Value>,
}

/// Message sent to a viewer immediately after it connects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct InitialStateMessage {
    /// Always [`MessageType::InitialState`].
    #[serde(rename = "type")]
    pub message_type: MessageType,
    /// State at connect time.
    pub data: InitialStateData,
}

impl InitialStateMessage {
    /// Build the connect-time message from a snapshot.
    pub fn from_snapshot(snapshot: &PopulationSnapshot) -> Self {
        Self {
            message_type: MessageType::InitialState,
            data: InitialStateData {
                south_korea_population: snapshot.south_korea.population,
                north_korea_population: snapshot.north_korea.population,
                total_population: snapshot.total_population,
                sk_births_today: snapshot.south_korea.births_today,
                sk_deaths_today: snapshot.south_korea.deaths_today,
                nk_births_today: snapshot.north_korea.births_today,
                nk_deaths_today: snapshot.north_korea.deaths_today,
                korea_time: snapshot.korea_time(),
                event_indicators: CountryEventIndicators::default(),
                recent_visual_events: Vec::new(),
                recent_events: Vec::new(),
            },
        }
    }
}
