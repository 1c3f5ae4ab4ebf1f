mod feed;
mod interpolator;
mod location;
mod panel;
mod route;
mod session;
mod settings;
mod surface;

pub use feed::{FeedMessage, TrackingFeed};
pub use interpolator::PositionInterpolator;
pub use location::{Coordinate, LocationUpdate, UtcDT};
pub use panel::{OrderItem, OrderSnapshot, PanelUiState, PanelView, TrackingPanelController};
pub use route::{FadePhase, RouteFrame, RouteRenderer, RouteSnapshot};
pub use session::{TrackingSession, TrackingState};
pub use settings::TrackingSettings;
pub use surface::{MapSurface, StateUpdateSender};

pub mod prelude {
    use anyhow::Error as AnyhowError;
    use std::result::Result as StdResult;
    pub type Result<T = (), E = AnyhowError> = StdResult<T, E>;
    pub use anyhow::Context;
}
