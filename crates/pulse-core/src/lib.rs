//! Population estimation and live broadcast for Pulse of Korea.
//!
//! This crate owns the deterministic population model and the loop that
//! pushes it to connected viewers once per second.
//!
//! # Modules
//!
//! - [`estimator`] -- Pure functions from base statistics and wall-clock
//!   time to population, births today and deaths today.
//! - [`service`] -- [`PopulationService`], the explicitly owned holder of
//!   base statistics and viewer membership.
//! - [`viewers`] -- Concurrent viewer registry with evict-on-failure
//!   delivery.
//! - [`resync`] -- 30-second reconciliation flag tracker.
//! - [`broadcaster`] -- The repeating tick task.
//! - [`config`] -- Configuration loading from `pulse-config.yaml`.
//!
//! [`PopulationService`]: service::PopulationService

pub mod broadcaster;
pub mod config;
pub mod estimator;
pub mod resync;
pub mod service;
pub mod viewers;

pub use broadcaster::{BroadcastResult, Broadcaster, TickReport};
pub use config::{ConfigError, PulseConfig};
pub use service::PopulationService;
pub use viewers::{DeliveryReport, ViewerHandle, ViewerId, ViewerRegistry};
