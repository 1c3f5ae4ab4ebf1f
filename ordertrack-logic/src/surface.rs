use crate::{location::Coordinate, prelude::*};

/// The host-provided map the tracking core draws onto. Both primitives are
/// write-only from this crate's perspective. A draw call returning an error
/// means the underlying view is gone (torn down mid-session); the session
/// treats that as terminal and stops issuing frames, leaving the last
/// rendered state static.
pub trait MapSurface: Send + Sync {
    /// Place or move the courier marker
    fn set_marker(&self, coordinate: Coordinate) -> Result;
    /// Replace the route polyline; an empty slice clears it
    fn set_route(&self, coordinates: &[Coordinate], opacity: f64) -> Result;
}

/// Nudges the host to re-read the panel view after it changes
pub trait StateUpdateSender {
    fn send_update(&self);
}
