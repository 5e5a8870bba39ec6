//! Coarse reconciliation cadence for tick messages.
//!
//! Every tick carries an `is_resync` flag. It is raised at most once per
//! resync interval of wall-clock time so clients can snap their animated
//! counters back to the authoritative value.

use chrono::{DateTime, TimeDelta, Utc};

/// Default wall-clock interval between resync ticks.
pub const DEFAULT_RESYNC_INTERVAL_SECS: u64 = 30;

/// Tracks when the last resync flag was raised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResyncTracker {
    interval: TimeDelta,
    last_resync: DateTime<Utc>,
}

impl ResyncTracker {
    /// Create a tracker whose first resync is due one interval after
    /// `started_at`.
    pub const fn new(interval: TimeDelta, started_at: DateTime<Utc>) -> Self {
        Self {
            interval,
            last_resync: started_at,
        }
    }

    /// Return whether the tick at `now` is a resync tick, recording it if so.
    pub fn check(&mut self, now: DateTime<Utc>) -> bool {
        let due = now.signed_duration_since(self.last_resync) >= self.interval;
        if due {
            self.last_resync = now;
        }
        due
    }

    /// Configured interval.
    pub const fn interval(&self) -> TimeDelta {
        self.interval
    }
}
