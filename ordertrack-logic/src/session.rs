use std::sync::Arc;
use std::time::Duration;

use anyhow::bail;
use chrono::Utc;
use log::warn;
use tokio::sync::{RwLock, RwLockWriteGuard};
use tokio_util::sync::CancellationToken;

use crate::{
    feed::{FeedMessage, TrackingFeed},
    interpolator::PositionInterpolator,
    location::UtcDT,
    panel::{PanelView, TrackingPanelController},
    prelude::*,
    route::RouteRenderer,
    settings::TrackingSettings,
    surface::{MapSurface, StateUpdateSender},
};

/// Mutable state of one tracking session: the three animation/UI components
/// plus the surface-health flag. Owned exclusively by [TrackingSession]
/// behind its lock; nothing outside mutates it.
pub struct TrackingState {
    pub interpolator: PositionInterpolator,
    pub route: RouteRenderer,
    pub panel: TrackingPanelController,
    /// Set once the host surface rejects a draw; no further frames are
    /// issued after that, the last rendered state stays on screen
    surface_lost: bool,
}

impl TrackingState {
    fn new(settings: &TrackingSettings) -> Self {
        Self {
            interpolator: PositionInterpolator::new(settings.marker_transition()),
            route: RouteRenderer::new(settings.route_fade_out(), settings.route_fade_in()),
            panel: TrackingPanelController::default(),
            surface_lost: false,
        }
    }
}

/// Struct representing an active order-tracking view, consumes updates from
/// a [TrackingFeed], animates the courier marker and route polyline onto a
/// [MapSurface], and provides high-level methods for the host's panel
/// interactions.
pub struct TrackingSession<F: TrackingFeed, M: MapSurface, S: StateUpdateSender> {
    state: RwLock<TrackingState>,
    feed: Arc<F>,
    surface: M,
    state_updates: S,
    frame_interval: Duration,
    cancel: CancellationToken,
}

impl<F: TrackingFeed, M: MapSurface, S: StateUpdateSender> TrackingSession<F, M, S> {
    pub fn new(settings: TrackingSettings, feed: Arc<F>, surface: M, state_updates: S) -> Self {
        Self {
            state: RwLock::new(TrackingState::new(&settings)),
            feed,
            surface,
            state_updates,
            frame_interval: settings.frame_interval(),
            cancel: CancellationToken::new(),
        }
    }

    fn consume_message(&self, state: &mut TrackingState, msg: FeedMessage) -> Result<bool> {
        match msg {
            FeedMessage::Location(update) => {
                state.interpolator.on_location_update(update, Self::get_now());
                Ok(false)
            }
            FeedMessage::Route(snapshot) => {
                state.route.on_route_snapshot(snapshot, Self::get_now());
                Ok(false)
            }
            FeedMessage::Order(snapshot) => {
                state.panel.on_order_snapshot(*snapshot);
                self.state_updates.send_update();
                Ok(false)
            }
            FeedMessage::Disconnected => {
                // Expected disconnect, exit
                Ok(true)
            }
            FeedMessage::Error(err) => bail!("Tracking feed error: {err}"),
        }
    }

    /// Draw one frame for a specific moment in time. Components that have
    /// settled produce nothing, so an idle session issues no draw calls.
    fn frame(&self, state: &mut TrackingState, now: UtcDT) {
        if state.surface_lost {
            return;
        }

        if let Some(coordinate) = state.interpolator.frame(now) {
            if let Err(why) = self.surface.set_marker(coordinate) {
                warn!("Map surface gone, freezing tracking visuals: {why:?}");
                state.surface_lost = true;
                return;
            }
        }

        if let Some(route) = state.route.frame(now) {
            if let Err(why) = self.surface.set_route(route.coordinates, route.opacity) {
                warn!("Map surface gone, freezing tracking visuals: {why:?}");
                state.surface_lost = true;
            }
        }
    }

    /// Flip the order summary's expand/collapse state (user tap)
    pub async fn toggle_expanded(&self) {
        let mut state = self.state.write().await;
        state.panel.toggle_expanded();
        self.state_updates.send_update();
    }

    /// Get the display-ready panel contents, [None] until the first order
    /// snapshot arrives
    pub async fn panel_view(&self) -> Option<PanelView> {
        self.state.read().await.panel.as_view()
    }

    pub async fn quit(&self) {
        self.cancel.cancel();
    }

    #[cfg(test)]
    fn get_now() -> UtcDT {
        let fake = tokio::time::Instant::now();
        let real = std::time::Instant::now();
        Utc::now() + (fake.into_std().duration_since(real) + Duration::from_secs(1))
    }

    #[cfg(not(test))]
    fn get_now() -> UtcDT {
        Utc::now()
    }

    /// Main loop of the session, consumes [TrackingFeed] messages and drives
    /// animation frames until cancelled, disconnected, or the feed errors.
    pub async fn main_loop(&self) -> Result {
        let mut frames = tokio::time::interval(self.frame_interval);

        let res = 'track: loop {
            tokio::select! {
                biased;

                _ = self.cancel.cancelled() => {
                    break 'track Ok(());
                }

                messages = self.feed.receive_messages() => {
                    let mut state = self.state.write().await;
                    for msg in messages {
                        match self.consume_message(&mut state, msg) {
                            Ok(true) => break 'track Ok(()),
                            Ok(false) => {}
                            Err(why) => break 'track Err(why),
                        }
                    }
                }

                _ = frames.tick() => {
                    let mut state = self.state.write().await;
                    self.frame(&mut state, Self::get_now());
                }
            }
        };

        self.feed.disconnect().await;

        res
    }

    pub async fn lock_state(&self) -> RwLockWriteGuard<'_, TrackingState> {
        self.state.write().await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        location::{Coordinate, LocationUpdate},
        route::RouteSnapshot,
        tests::{DummySender, MockFeed, RecordingSurface, SurfaceOp, mk_order},
    };
    use tokio::{sync::oneshot, task::yield_now, test};

    type TestSession = TrackingSession<MockFeed, Arc<RecordingSurface>, DummySender>;

    type EndRecv = oneshot::Receiver<Result>;

    struct Harness {
        session: Arc<TestSession>,
        feed: Arc<MockFeed>,
        surface: Arc<RecordingSurface>,
    }

    impl Harness {
        fn new() -> Self {
            tokio::time::pause();
            let feed = MockFeed::new();
            let surface = Arc::new(RecordingSurface::default());
            let session = Arc::new(TestSession::new(
                TrackingSettings::default(),
                feed.clone(),
                surface.clone(),
                DummySender,
            ));
            Self {
                session,
                feed,
                surface,
            }
        }

        fn start(&self) -> EndRecv {
            let session = self.session.clone();
            let (send, recv) = oneshot::channel();
            tokio::spawn(async move {
                let res = session.main_loop().await;
                send.send(res).expect("Failed to send");
            });
            recv
        }

        async fn push(&self, msg: FeedMessage) {
            self.feed.push(msg).await;
            self.feed.wait_for_queue_empty().await;
            yield_now().await;
        }

        /// Advance paused time far past every transition window
        async fn settle(&self) {
            tokio::time::sleep(Duration::from_secs(2)).await;
            yield_now().await;
        }
    }

    fn coord(lat: f64, long: f64) -> Coordinate {
        Coordinate::new(lat, long)
    }

    fn location(lat: f64, long: f64) -> FeedMessage {
        FeedMessage::Location(LocationUpdate {
            coordinate: coord(lat, long),
            received_at: Utc::now(),
        })
    }

    #[test]
    async fn test_marker_settles_on_latest_update() {
        let h = Harness::new();
        h.start();

        h.push(location(10.0, 10.0)).await;
        h.settle().await;
        assert_eq!(h.surface.last_marker(), Some(coord(10.0, 10.0)));

        // Two more land mid-transition of each other
        h.push(location(10.001, 10.001)).await;
        tokio::time::sleep(Duration::from_millis(100)).await;
        h.push(location(10.002, 10.002)).await;
        h.settle().await;

        assert_eq!(h.surface.last_marker(), Some(coord(10.002, 10.002)));

        // Smoothing was not bypassed: some rendered point sits strictly
        // between the first and last coordinates
        let markers = h.surface.markers();
        assert!(
            markers
                .iter()
                .any(|c| c.lat > 10.0 && c.lat < 10.002 && c.long > 10.0 && c.long < 10.002),
            "No intermediate marker positions recorded: {markers:?}"
        );
    }

    #[test]
    async fn test_settled_marker_schedules_no_frames() {
        let h = Harness::new();
        h.start();

        h.push(location(10.0, 10.0)).await;
        h.settle().await;

        let drawn = h.surface.op_count();
        h.settle().await;
        assert_eq!(h.surface.op_count(), drawn, "Idle session kept drawing");

        // An identical update schedules nothing either
        h.push(location(10.0, 10.0)).await;
        h.settle().await;
        assert_eq!(
            h.surface.op_count(),
            drawn,
            "Identical update restarted the tween"
        );
    }

    #[test]
    async fn test_invalid_update_leaves_marker_unchanged() {
        let h = Harness::new();
        h.start();

        h.push(location(10.0, 10.0)).await;
        h.settle().await;
        let drawn = h.surface.op_count();

        h.push(location(200.0, 0.0)).await;
        h.settle().await;

        assert_eq!(h.surface.last_marker(), Some(coord(10.0, 10.0)));
        assert_eq!(h.surface.op_count(), drawn);
    }

    #[test]
    async fn test_route_settles_on_latest_snapshot() {
        let h = Harness::new();
        h.start();

        let r1 = RouteSnapshot::new(vec![coord(10.0, 10.0), coord(11.0, 11.0)]);
        let r2 = RouteSnapshot::new(vec![coord(10.0, 10.0), coord(12.0, 12.0)]);
        let r3 = RouteSnapshot::new(vec![coord(10.0, 10.0), coord(13.0, 13.0)]);

        h.push(FeedMessage::Route(r1.clone())).await;
        h.settle().await;
        assert_eq!(h.surface.last_route(), Some((r1.coordinates, 1.0)));

        // r3 supersedes r2 while r1's fade-out is still running
        h.push(FeedMessage::Route(r2)).await;
        tokio::time::sleep(Duration::from_millis(100)).await;
        h.push(FeedMessage::Route(r3.clone())).await;
        h.settle().await;

        assert_eq!(h.surface.last_route(), Some((r3.coordinates, 1.0)));

        // And the fade actually rendered partially-transparent frames
        assert!(
            h.surface
                .ops()
                .iter()
                .any(|op| matches!(op, SurfaceOp::Route(_, o) if *o > 0.0 && *o < 1.0)),
            "No mid-fade route frames recorded"
        );
    }

    #[test]
    async fn test_empty_route_after_non_empty() {
        let h = Harness::new();
        h.start();

        let r1 = RouteSnapshot::new(vec![coord(10.0, 10.0), coord(11.0, 11.0)]);
        h.push(FeedMessage::Route(r1)).await;
        h.settle().await;

        h.push(FeedMessage::Route(RouteSnapshot::new(vec![]))).await;
        h.settle().await;

        assert_eq!(h.surface.last_route(), Some((vec![], 1.0)));
    }

    #[test]
    async fn test_lost_surface_freezes_visuals() {
        let h = Harness::new();
        let recv = h.start();

        h.push(location(10.0, 10.0)).await;
        h.settle().await;
        assert_eq!(h.surface.last_marker(), Some(coord(10.0, 10.0)));

        h.surface.tear_down();
        let drawn = h.surface.op_count();

        h.push(location(20.0, 20.0)).await;
        h.settle().await;

        // No draws went through, the last good state stayed put
        assert_eq!(h.surface.op_count(), drawn);

        // The session itself is still alive and serving the panel
        h.push(FeedMessage::Order(Box::new(mk_order()))).await;
        assert!(h.session.panel_view().await.is_some());

        // And it still exits cleanly
        h.push(FeedMessage::Disconnected).await;
        let res = recv.await.expect("Failed to recv");
        assert!(res.is_ok());
        assert!(h.feed.is_disconnected());
    }

    #[test]
    async fn test_panel_updates_and_toggle() {
        let h = Harness::new();
        h.start();

        assert!(h.session.panel_view().await.is_none());

        h.push(FeedMessage::Order(Box::new(mk_order()))).await;
        let view = h.session.panel_view().await.expect("No panel view");
        assert!(view.items.is_none());

        h.session.toggle_expanded().await;
        let view = h.session.panel_view().await.expect("No panel view");
        assert!(view.items.is_some());

        h.session.toggle_expanded().await;
        let view = h.session.panel_view().await.expect("No panel view");
        assert!(view.items.is_none());
    }

    #[test]
    async fn test_feed_error_ends_loop() {
        let h = Harness::new();
        let recv = h.start();

        h.push(FeedMessage::Error("socket closed".into())).await;

        let res = recv.await.expect("Failed to recv");
        assert!(res.is_err());
        assert!(h.feed.is_disconnected());
    }

    #[test]
    async fn test_quit_cancels_loop() {
        let h = Harness::new();
        let recv = h.start();

        h.push(location(10.0, 10.0)).await;
        h.session.quit().await;

        let res = recv.await.expect("Failed to recv");
        assert!(res.is_ok());
        assert!(h.feed.is_disconnected());
    }
}
