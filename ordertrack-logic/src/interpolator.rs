use std::time::Duration;

use log::warn;

use crate::location::{Coordinate, LocationUpdate, UtcDT};

/// Cubic ease-in-out, `t` in `0..=1`
fn ease_in_out(t: f64) -> f64 {
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        let u = -2.0 * t + 2.0;
        1.0 - u * u * u / 2.0
    }
}

/// The single in-flight marker transition. Retargeted in place on a new
/// update, never queued behind one.
#[derive(Debug, Clone, Copy)]
struct AnimatedPosition {
    start: Coordinate,
    target: Coordinate,
    started_at: UtcDT,
    duration: Duration,
}

impl AnimatedPosition {
    fn progress(&self, now: UtcDT) -> f64 {
        let elapsed = (now - self.started_at).num_milliseconds().max(0) as f64;
        let total = self.duration.as_millis() as f64;
        if total <= 0.0 {
            1.0
        } else {
            (elapsed / total).min(1.0)
        }
    }

    fn sample(&self, now: UtcDT) -> Coordinate {
        self.start
            .lerp(&self.target, ease_in_out(self.progress(now)))
    }

    fn done(&self, now: UtcDT) -> bool {
        self.progress(now) >= 1.0
    }
}

/// Turns the feed's sparse, irregular position reports into a continuously
/// moving courier marker. Owns at most one [AnimatedPosition]; a new update
/// always supersedes the in-flight transition instead of queuing behind it.
pub struct PositionInterpolator {
    anim: Option<AnimatedPosition>,
    duration: Duration,
    /// Set once the settled coordinate has been handed out via [Self::frame],
    /// after which no further frames are needed until the next update
    settled_drawn: bool,
}

impl PositionInterpolator {
    pub fn new(duration: Duration) -> Self {
        Self {
            anim: None,
            duration,
            settled_drawn: false,
        }
    }

    /// Consume a position report. Invalid coordinates are dropped and the
    /// current animated position is left untouched.
    pub fn on_location_update(&mut self, update: LocationUpdate, now: UtcDT) {
        if !update.coordinate.is_valid() {
            warn!(
                "Dropping location update with out-of-range coordinate {:?}",
                update.coordinate
            );
            return;
        }

        let target = update.coordinate;

        match self.anim {
            None => {
                // First report, place the marker directly
                self.anim = Some(AnimatedPosition {
                    start: target,
                    target,
                    started_at: now,
                    duration: Duration::ZERO,
                });
                self.settled_drawn = false;
            }
            Some(anim) => {
                if anim.target == target {
                    // Zero-distance tween, don't restart
                    return;
                }

                // Retarget from the point currently on screen, not the old
                // target, so an update landing mid-flight causes no jump
                let start = anim.sample(now);
                self.anim = Some(AnimatedPosition {
                    start,
                    target,
                    started_at: now,
                    duration: self.duration,
                });
                self.settled_drawn = false;
            }
        }
    }

    /// The eased position at `now`, if any update has been received yet
    pub fn sample(&self, now: UtcDT) -> Option<Coordinate> {
        self.anim.map(|a| a.sample(now))
    }

    /// Whether the marker has converged on its target and no further frames
    /// will be produced
    pub fn settled(&self, now: UtcDT) -> bool {
        self.anim.map(|a| a.done(now)).unwrap_or(true)
    }

    /// Per-frame read. Yields a coordinate every frame while the transition
    /// runs, then exactly one final coordinate when it settles, then nothing
    /// until the next update retargets it.
    pub fn frame(&mut self, now: UtcDT) -> Option<Coordinate> {
        let anim = self.anim?;

        if anim.done(now) {
            if self.settled_drawn {
                None
            } else {
                self.settled_drawn = true;
                Some(anim.target)
            }
        } else {
            Some(anim.sample(now))
        }
    }
}
