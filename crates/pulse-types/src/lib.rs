//! Shared type definitions for the Pulse of Korea population service.
//!
//! Types defined here are used by the estimator, the broadcast loop and
//! the HTTP layer, and flow downstream to `TypeScript` via `ts-rs` for the
//! browser client.
//!
//! # Modules
//!
//! - [`country`] -- Tracked countries and their official base statistics
//! - [`snapshot`] -- Derived population state at one instant
//! - [`messages`] -- `WebSocket` wire messages (tick and initial state)

pub mod country;
pub mod messages;
pub mod snapshot;

// Re-export all public types at crate root for convenience.
pub use country::{
    BaseDataUpdate, Country, CountryStatistics, DAYS_PER_YEAR, GrowthValidation,
    GrowthVerification, REFERENCE_EPOCH_UNIX_SECS, SECONDS_PER_DAY, UnknownCountry,
    reference_epoch,
};
pub use messages::{
    CountryEventIndicators, EventIndicators, InitialStateData, InitialStateMessage, MessageType,
    SimulationRates, TickMessage,
};
pub use snapshot::{CountryFigures, PopulationSnapshot, StaticData};

#[cfg(test)]
mod tests {
    //! `TypeScript` binding generation.

    #[test]
    fn export_bindings() {
        // Files are written to the `bindings/` directory relative to the
        // crate root.
        use ts_rs::TS;

        let _ = crate::Country::export_all();
        let _ = crate::CountryStatistics::export_all();
        let _ = crate::BaseDataUpdate::export_all();
        let _ = crate::GrowthValidation::export_all();
        let _ = crate::CountryFigures::export_all();
        let _ = crate::StaticData::export_all();
        let _ = crate::TickMessage::export_all();
        let _ = crate::InitialStateMessage::export_all();
    }
}
