use std::time::Duration;

use chrono::TimeDelta;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::location::{Coordinate, UtcDT};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, specta::Type)]
/// An ordered polyline from the feed describing the courier's path. An empty
/// snapshot is valid and simply renders nothing.
pub struct RouteSnapshot {
    pub coordinates: Vec<Coordinate>,
}

impl RouteSnapshot {
    pub fn new(coordinates: Vec<Coordinate>) -> Self {
        Self { coordinates }
    }

    pub fn is_valid(&self) -> bool {
        self.coordinates.iter().all(Coordinate::is_valid)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Where the renderer is in one snapshot-replacement lifecycle
pub enum FadePhase {
    Idle,
    FadingOut,
    FadingIn,
}

#[derive(Debug, Clone, Copy, PartialEq)]
/// One frame's worth of polyline to draw
pub struct RouteFrame<'a> {
    pub coordinates: &'a [Coordinate],
    pub opacity: f64,
}

/// Cross-fades between route geometries. Holds a tagged two-slot state:
/// `visible` is what's on screen (fading out, fading in, or steady) and
/// `pending` is the newest snapshot waiting to be promoted once the
/// fade-out finishes. A snapshot arriving mid-fade-out replaces `pending`;
/// the fade-out already in progress completes normally.
pub struct RouteRenderer {
    visible: Option<RouteSnapshot>,
    pending: Option<RouteSnapshot>,
    phase: FadePhase,
    phase_started_at: Option<UtcDT>,
    fade_out: Duration,
    fade_in: Duration,
    /// Set once the steady polyline has been handed out via [Self::frame]
    settled_drawn: bool,
}

fn delta(d: Duration) -> TimeDelta {
    TimeDelta::milliseconds(d.as_millis() as i64)
}

impl RouteRenderer {
    pub fn new(fade_out: Duration, fade_in: Duration) -> Self {
        Self {
            visible: None,
            pending: None,
            phase: FadePhase::Idle,
            phase_started_at: None,
            fade_out,
            fade_in,
            settled_drawn: false,
        }
    }

    pub fn phase(&self) -> FadePhase {
        self.phase
    }

    fn progress(&self, now: UtcDT, total: Duration) -> f64 {
        let Some(started) = self.phase_started_at else {
            return 1.0;
        };
        let elapsed = (now - started).num_milliseconds().max(0) as f64;
        let total = total.as_millis() as f64;
        if total <= 0.0 {
            1.0
        } else {
            (elapsed / total).min(1.0)
        }
    }

    /// Consume a new route snapshot from the feed
    pub fn on_route_snapshot(&mut self, snapshot: RouteSnapshot, now: UtcDT) {
        if !snapshot.is_valid() {
            warn!("Dropping route snapshot containing out-of-range coordinates");
            return;
        }

        match self.phase {
            FadePhase::Idle => {
                if self.visible.is_none() {
                    // Nothing on screen yet, fade the first route straight in
                    self.visible = Some(snapshot);
                    self.phase = FadePhase::FadingIn;
                    self.phase_started_at = Some(now);
                } else if self.visible.as_ref() == Some(&snapshot) {
                    // Same geometry, nothing to transition
                    return;
                } else {
                    self.pending = Some(snapshot);
                    self.phase = FadePhase::FadingOut;
                    self.phase_started_at = Some(now);
                }
            }
            FadePhase::FadingOut => {
                // The fade-out in progress completes normally; the newest
                // snapshot simply replaces whatever was waiting
                self.pending = Some(snapshot);
            }
            FadePhase::FadingIn => {
                // The half-visible incoming route becomes the outgoing one.
                // Offset the fade-out start so opacity stays continuous.
                let opacity = self.progress(now, self.fade_in);
                let already_faded = 1.0 - opacity;
                let offset_ms = (self.fade_out.as_millis() as f64 * already_faded) as i64;
                self.pending = Some(snapshot);
                self.phase = FadePhase::FadingOut;
                self.phase_started_at = Some(now - TimeDelta::milliseconds(offset_ms));
            }
        }

        self.settled_drawn = false;
    }

    /// Whether all transitions have settled and the visible polyline is the
    /// latest snapshot pushed
    pub fn settled(&self) -> bool {
        self.phase == FadePhase::Idle && self.pending.is_none()
    }

    /// The polyline currently promoted to the screen, ignoring opacity
    pub fn visible(&self) -> Option<&RouteSnapshot> {
        self.visible.as_ref()
    }

    /// Per-frame read. Yields geometry + opacity every frame during a
    /// transition, then exactly one full-opacity frame when it settles,
    /// then nothing until the next snapshot.
    pub fn frame(&mut self, now: UtcDT) -> Option<RouteFrame<'_>> {
        // Settle any phases that have run out before sampling
        loop {
            match self.phase {
                FadePhase::FadingOut if self.progress(now, self.fade_out) >= 1.0 => {
                    // Promote the newest snapshot; its fade-in starts where
                    // the fade-out ended, not at the current frame time
                    let ended = self
                        .phase_started_at
                        .map(|s| s + delta(self.fade_out))
                        .unwrap_or(now);
                    self.visible = self.pending.take();
                    self.phase = FadePhase::FadingIn;
                    self.phase_started_at = Some(ended);
                }
                FadePhase::FadingIn if self.progress(now, self.fade_in) >= 1.0 => {
                    self.phase = FadePhase::Idle;
                    self.phase_started_at = None;
                }
                _ => break,
            }
        }

        let opacity = match self.phase {
            FadePhase::FadingOut => 1.0 - self.progress(now, self.fade_out),
            FadePhase::FadingIn => self.progress(now, self.fade_in),
            FadePhase::Idle => {
                if self.settled_drawn {
                    return None;
                }
                self.settled_drawn = true;
                1.0
            }
        };

        let visible = self.visible.as_ref()?;
        Some(RouteFrame {
            coordinates: &visible.coordinates,
            opacity,
        })
    }
}
