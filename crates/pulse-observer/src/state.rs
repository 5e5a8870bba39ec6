//! Shared application state for the population API server.
//!
//! [`AppState`] is a thin handle on the [`PopulationService`] plus the
//! admin secret. Handlers never hold service locks across an `await` on
//! the network, so reads never block the broadcast loop.

use std::sync::Arc;

use pulse_core::PopulationService;

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`] and injected via Axum's `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The population service shared with the broadcast loop.
    pub service: Arc<PopulationService>,
    /// Secret required by the base-data update endpoint.
    admin_key: String,
}

impl AppState {
    /// Create the application state around an existing service.
    pub fn new(service: Arc<PopulationService>, admin_key: impl Into<String>) -> Self {
        Self {
            service,
            admin_key: admin_key.into(),
        }
    }

    /// Whether `candidate` matches the configured admin key.
    ///
    /// An empty configured key disables the admin endpoint entirely. The
    /// comparison time depends only on the lengths, not on where the
    /// first differing byte is.
    pub fn admin_key_matches(&self, candidate: Option<&str>) -> bool {
        let Some(candidate) = candidate else {
            return false;
        };
        !self.admin_key.is_empty() && constant_time_eq(self.admin_key.as_bytes(), candidate.as_bytes())
    }
}

/// Compare two byte strings without short-circuiting on the first
/// mismatch.
fn constant_time_eq(expected: &[u8], actual: &[u8]) -> bool {
    if expected.len() != actual.len() {
        return false;
    }
    expected
        .iter()
        .zip(actual)
        .fold(0_u8, |diff, (a, b)| diff | (a ^ b))
        == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(key: &str) -> AppState {
        AppState::new(Arc::new(PopulationService::with_defaults()), key)
    }

    #[test]
    fn admin_key_must_match_exactly() {
        let state = state("secret");
        assert!(state.admin_key_matches(Some("secret")));
        assert!(!state.admin_key_matches(Some("secreT")));
        assert!(!state.admin_key_matches(Some("secret!")));
        assert!(!state.admin_key_matches(Some("")));
        assert!(!state.admin_key_matches(None));
    }

    #[test]
    fn empty_key_disables_admin() {
        let state = state("");
        assert!(!state.admin_key_matches(Some("")));
        assert!(!state.admin_key_matches(None));
    }
}
