//! Timing and sizing parameters for a session.

use std::time::Duration;

use crate::location::PositionOptions;

/// Configuration shared by the session's components.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Quiet period after the last keystroke before an address lookup.
    pub debounce: Duration,

    /// Minimum trimmed query length (in characters) worth looking up.
    pub min_query_chars: usize,

    /// Maximum number of address candidates requested.
    pub address_limit: usize,

    /// Radius for nearby-station lookups, in meters.
    pub station_radius: u32,

    /// How often the arrivals board refreshes.
    pub refresh_interval: Duration,

    /// Pause before the relaxed-accuracy positioning attempt.
    pub retry_delay: Duration,

    /// Options for the first positioning attempt.
    pub high_accuracy: PositionOptions,

    /// Options for the single escalation attempt.
    pub relaxed_accuracy: PositionOptions,
}

impl SessionConfig {
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn with_station_radius(mut self, radius: u32) -> Self {
        self.station_radius = radius;
        self
    }

    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(500),
            min_query_chars: 2,
            address_limit: 5,
            station_radius: 300,
            refresh_interval: Duration::from_secs(30),
            retry_delay: Duration::from_secs(1),
            high_accuracy: PositionOptions::HIGH,
            relaxed_accuracy: PositionOptions::RELAXED,
        }
    }
}
