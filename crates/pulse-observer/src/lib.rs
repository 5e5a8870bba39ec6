//! HTTP and `WebSocket` server for Pulse of Korea.
//!
//! This crate provides an Axum server that exposes:
//!
//! - **`WebSocket` endpoint** (`/ws/population`) that sends an initial
//!   state on connect and then one tick message per broadcast interval
//! - **Read endpoints** for current figures, per-second rates, base
//!   statistics and the growth-rate cross-check
//! - **Admin endpoint** for replacing a country's base statistics
//!
//! # Architecture
//!
//! Every handler reads from the shared [`PopulationService`] and
//! computes a fresh snapshot. `WebSocket` connections register with the
//! service's viewer registry; the broadcast loop in `pulse-core` pushes
//! frames into each viewer's bounded queue and this crate drains the
//! queue onto the socket.
//!
//! [`PopulationService`]: pulse_core::PopulationService

pub mod admin;
pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod startup;
pub mod state;
pub mod ws;

// Re-export primary types for convenience.
pub use router::build_router;
pub use server::{start_server, ServerError};
pub use startup::spawn_observer;
pub use state::AppState;
