//! Thresholds for the update coordinator.

use std::time::Duration;

/// Configuration for refresh, caching and catch-up behavior.
#[derive(Debug, Clone)]
pub struct UpdateConfig {
    /// Maximum age of a cached snapshot before it is discarded.
    pub cache_max_age: Duration,

    /// Maximum distance in meters between the device's current location
    /// and a snapshot's fetch location for the snapshot to be trusted.
    pub cache_distance_m: f64,

    /// Age of the last successful update beyond which the coordinator
    /// self-triggers a forced refresh.
    pub stale_after: Duration,

    /// Minimum spacing between refresh attempts for the self-trigger.
    pub min_attempt_spacing: Duration,

    /// How often the driver loop evaluates the catch-up rule.
    pub poll_interval: Duration,
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            cache_max_age: Duration::from_secs(60),
            cache_distance_m: 50.0,
            stale_after: Duration::from_secs(120),
            min_attempt_spacing: Duration::from_secs(30),
            poll_interval: Duration::from_secs(15),
        }
    }
}

impl UpdateConfig {
    pub fn with_cache_max_age(mut self, max_age: Duration) -> Self {
        self.cache_max_age = max_age;
        self
    }

    pub fn with_cache_distance(mut self, meters: f64) -> Self {
        self.cache_distance_m = meters;
        self
    }

    pub fn with_stale_after(mut self, stale_after: Duration) -> Self {
        self.stale_after = stale_after;
        self
    }
}
