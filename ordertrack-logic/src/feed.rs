use serde::{Deserialize, Serialize};

use crate::{location::LocationUpdate, panel::OrderSnapshot, route::RouteSnapshot};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum FeedMessage {
    /// A new courier position report
    Location(LocationUpdate),
    /// The courier's route was recalculated
    Route(RouteSnapshot),
    /// Updated order summary (ETA, distance, items)
    /// Boxed for space reasons
    Order(Box<OrderSnapshot>),
    /// The feed closed cleanly (order delivered or tracking stopped by the
    /// user), used to help consumers know when to stop consuming messages
    Disconnected,
    /// The feed hit a fatal error and is going away
    Error(String),
}

/// The external source of tracking data. Whether it polls or holds a socket
/// open is the implementation's business; consumers only rely on messages
/// being eventually delivered in timestamp order. Out-of-order delivery is
/// the feed's bug to fix, not something this crate detects.
pub trait TrackingFeed: Send + Sync {
    /// Receive the next batch of feed messages, in arrival order
    fn receive_messages(&self) -> impl Future<Output = impl Iterator<Item = FeedMessage>>;
    /// Disconnect from the feed
    fn disconnect(&self) -> impl Future<Output = ()> {
        async {}
    }
}
