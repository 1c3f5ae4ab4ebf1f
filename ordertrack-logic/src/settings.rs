use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, specta::Type)]
/// Tunables for the tracking visuals, supplied by the host app
pub struct TrackingSettings {
    /// Length of one courier marker transition in milliseconds
    pub marker_transition_ms: u64,
    /// How long the outgoing route polyline takes to fade to transparent
    pub route_fade_out_ms: u64,
    /// How long the incoming route polyline takes to fade to opaque
    pub route_fade_in_ms: u64,
    /// How often animations are sampled while one is running
    pub frame_interval_ms: u64,
}

impl TrackingSettings {
    pub fn marker_transition(&self) -> Duration {
        Duration::from_millis(self.marker_transition_ms)
    }

    pub fn route_fade_out(&self) -> Duration {
        Duration::from_millis(self.route_fade_out_ms)
    }

    pub fn route_fade_in(&self) -> Duration {
        Duration::from_millis(self.route_fade_in_ms)
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }
}

impl Default for TrackingSettings {
    fn default() -> Self {
        Self {
            marker_transition_ms: 800,
            route_fade_out_ms: 250,
            route_fade_in_ms: 300,
            frame_interval_ms: 16,
        }
    }
}
