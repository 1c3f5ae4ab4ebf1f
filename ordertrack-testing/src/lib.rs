use std::sync::Arc;

use chrono::Utc;
use ordertrack_logic::{
    Coordinate, FeedMessage, LocationUpdate, OrderItem, OrderSnapshot, RouteSnapshot, TrackingFeed,
};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, mpsc};
use uuid::Uuid;

pub mod prelude {
    pub use anyhow::{Context, anyhow, bail};
    pub type Result<T = (), E = anyhow::Error> = std::result::Result<T, E>;
}

pub use prelude::*;

/// A scripted tracking feed, replayed in real time by the sim binary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedScript {
    pub steps: Vec<ScriptStep>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptStep {
    /// Milliseconds to wait after the previous step before sending
    pub after_ms: u64,
    pub event: ScriptEvent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ScriptEvent {
    /// A courier position report
    Location { lat: f64, long: f64 },
    /// A recalculated route
    Route { coordinates: Vec<(f64, f64)> },
    /// An order summary push
    Order {
        eta: String,
        distance: String,
        pharmacy_name: String,
        total_amount: String,
        /// (name, quantity, price) per line
        items: Vec<(String, u32, String)>,
    },
    /// The user taps the summary panel
    Toggle,
    /// The feed closes cleanly
    Disconnect,
}

impl ScriptEvent {
    /// The feed message this step produces, or [None] for user-input steps
    pub fn to_feed_message(&self) -> Option<FeedMessage> {
        match self {
            ScriptEvent::Location { lat, long } => Some(FeedMessage::Location(LocationUpdate {
                coordinate: Coordinate::new(*lat, *long),
                received_at: Utc::now(),
            })),
            ScriptEvent::Route { coordinates } => Some(FeedMessage::Route(RouteSnapshot::new(
                coordinates
                    .iter()
                    .map(|&(lat, long)| Coordinate::new(lat, long))
                    .collect(),
            ))),
            ScriptEvent::Order {
                eta,
                distance,
                pharmacy_name,
                total_amount,
                items,
            } => Some(FeedMessage::Order(Box::new(OrderSnapshot {
                order_id: Uuid::new_v4(),
                eta: eta.clone(),
                distance: distance.clone(),
                pharmacy_name: pharmacy_name.clone(),
                total_amount: total_amount.clone(),
                items: items
                    .iter()
                    .map(|(name, quantity, price)| OrderItem {
                        name: name.clone(),
                        quantity: *quantity,
                        price: price.clone(),
                    })
                    .collect(),
            }))),
            ScriptEvent::Toggle => None,
            ScriptEvent::Disconnect => Some(FeedMessage::Disconnected),
        }
    }
}

/// Marker for a user tap replayed from a script
#[derive(Debug, Clone, Copy)]
pub struct UserTap;

/// A [TrackingFeed] that replays a [FeedScript] on a background task,
/// routing `Toggle` steps out as [UserTap]s for the driver to apply
pub struct ScriptedFeed {
    rx: Mutex<mpsc::Receiver<FeedMessage>>,
}

impl ScriptedFeed {
    pub fn spawn(script: FeedScript) -> (Arc<Self>, mpsc::Receiver<UserTap>) {
        let (tx, rx) = mpsc::channel(20);
        let (tap_tx, tap_rx) = mpsc::channel(20);

        let feed = Arc::new(Self {
            rx: Mutex::new(rx),
        });

        tokio::spawn(async move {
            for step in script.steps {
                tokio::time::sleep(std::time::Duration::from_millis(step.after_ms)).await;
                match step.event.to_feed_message() {
                    Some(msg) => {
                        if tx.send(msg).await.is_err() {
                            return;
                        }
                    }
                    None => {
                        if tap_tx.send(UserTap).await.is_err() {
                            return;
                        }
                    }
                }
            }
            // Make sure the session winds down even if the script forgot to
            tx.send(FeedMessage::Disconnected).await.ok();
        });

        (feed, tap_rx)
    }
}

impl TrackingFeed for ScriptedFeed {
    async fn receive_messages(&self) -> impl Iterator<Item = FeedMessage> {
        let mut rx = self.rx.lock().await;
        let mut buf = Vec::with_capacity(20);
        rx.recv_many(&mut buf, 20).await;
        buf.into_iter()
    }

    async fn disconnect(&self) {
        let mut rx = self.rx.lock().await;
        rx.close();
    }
}

/// A short delivery run used by `tracking-sim --sample` and the tests
pub fn sample_script() -> FeedScript {
    FeedScript {
        steps: vec![
            ScriptStep {
                after_ms: 0,
                event: ScriptEvent::Order {
                    eta: "12 min".into(),
                    distance: "3.4 km".into(),
                    pharmacy_name: "Greenleaf Pharmacy".into(),
                    total_amount: "$24.50".into(),
                    items: vec![
                        ("Paracetamol 500mg".into(), 2, "$4.00".into()),
                        ("Vitamin D3".into(), 1, "$16.50".into()),
                    ],
                },
            },
            ScriptStep {
                after_ms: 100,
                event: ScriptEvent::Route {
                    coordinates: vec![(12.9716, 77.5946), (12.9731, 77.5961), (12.9750, 77.5980)],
                },
            },
            ScriptStep {
                after_ms: 100,
                event: ScriptEvent::Location {
                    lat: 12.9716,
                    long: 77.5946,
                },
            },
            ScriptStep {
                after_ms: 400,
                event: ScriptEvent::Toggle,
            },
            ScriptStep {
                after_ms: 2000,
                event: ScriptEvent::Location {
                    lat: 12.9731,
                    long: 77.5961,
                },
            },
            ScriptStep {
                after_ms: 1500,
                event: ScriptEvent::Route {
                    coordinates: vec![(12.9731, 77.5961), (12.9750, 77.5980)],
                },
            },
            ScriptStep {
                after_ms: 2000,
                event: ScriptEvent::Location {
                    lat: 12.9750,
                    long: 77.5980,
                },
            },
            ScriptStep {
                after_ms: 1000,
                event: ScriptEvent::Disconnect,
            },
        ],
    }
}
