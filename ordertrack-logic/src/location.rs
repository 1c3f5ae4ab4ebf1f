use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Convenience alias for UTC DT
pub type UtcDT = DateTime<Utc>;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, specta::Type)]
/// Some point in the world as reported by the courier's device
pub struct Coordinate {
    /// Latitude, degrees
    pub lat: f64,
    /// Longitude, degrees
    pub long: f64,
}

impl Coordinate {
    pub fn new(lat: f64, long: f64) -> Self {
        Self { lat, long }
    }

    /// Whether this is a real geographic point. Tracking feeds are noisy,
    /// so consumers drop invalid coordinates instead of erroring.
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.long)
    }

    pub(crate) fn lerp(&self, other: &Coordinate, t: f64) -> Coordinate {
        Coordinate {
            lat: self.lat + (other.lat - self.lat) * t,
            long: self.long + (other.long - self.long) * t,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, specta::Type)]
/// A single position report from the tracking feed. Consumed immediately by
/// [crate::PositionInterpolator], never retained past the current transition.
pub struct LocationUpdate {
    pub coordinate: Coordinate,
    pub received_at: UtcDT,
}
