//! # Decode Pacer
//!
//! Self-pacing decode loop. Each tick decodes under a wall-clock budget,
//! then computes its own next wakeup from the presentation timestamp of the
//! frame it just rendered; there is no fixed-rate timer. The clock anchors
//! a (pts, wall time) pair on the first rendered frame and re-anchors on
//! speed changes, so pacing stays drift-free across pause, seek and speed
//! adjustments.

use std::time::Duration;
use tokio::time::Instant;

use bridge_traits::ReadOutcome;

use crate::error::PlayerError;
use crate::events::PlayerEvent;
use crate::player::PlayerSession;

// ============================================================================
// Clock
// ============================================================================

/// Maps presentation timestamps to wall-clock deadlines.
#[derive(Debug)]
pub(crate) struct PlaybackClock {
    base_pts: Option<f64>,
    base_wall: Instant,
    speed: f64,
}

impl PlaybackClock {
    pub(crate) fn new(speed: f64) -> Self {
        Self {
            base_pts: None,
            base_wall: Instant::now(),
            speed,
        }
    }

    pub(crate) fn speed(&self) -> f64 {
        self.speed
    }

    pub(crate) fn is_anchored(&self) -> bool {
        self.base_pts.is_some()
    }

    /// Forget the anchor; the next rendered frame re-establishes it.
    pub(crate) fn reset(&mut self) {
        self.base_pts = None;
    }

    /// Anchor media time `pts` to the current wall clock.
    pub(crate) fn anchor(&mut self, pts: f64) {
        self.base_pts = Some(pts);
        self.base_wall = Instant::now();
    }

    /// Change speed. Re-anchors at the current position so already-elapsed
    /// playback is not re-timed under the new rate.
    pub(crate) fn set_speed(&mut self, speed: f64, current_pts: f64) {
        self.speed = speed;
        if self.base_pts.is_some() {
            self.anchor(current_pts);
        }
    }

    /// Wall-clock delay until `pts` is due. Zero when unanchored, behind
    /// schedule, or for non-monotonic timestamps.
    pub(crate) fn delay_until(&self, pts: f64) -> Duration {
        let Some(base_pts) = self.base_pts else {
            return Duration::ZERO;
        };
        let media_elapsed = (pts - base_pts).max(0.0);
        let due = self.base_wall + Duration::from_secs_f64(media_elapsed / self.speed);
        due.saturating_duration_since(Instant::now())
    }
}

// ============================================================================
// Tick
// ============================================================================

impl PlayerSession {
    pub(crate) fn schedule(&mut self, delay: Duration) {
        self.next_tick = Some(Instant::now() + delay);
    }

    pub(crate) fn schedule_now(&mut self) {
        self.schedule(Duration::ZERO);
    }

    /// One pacer tick: decode until the budget elapses, a frame schedules
    /// the next tick, or a terminal outcome ends playback.
    pub(crate) fn decode_tick(&mut self) {
        let shared = self.shared.clone();
        if !shared.is_playing() || !shared.is_opened() {
            return;
        }
        let token = shared.session_token.current();
        let budget = if self.seek.seeking {
            shared.config.seek_decode_budget
        } else {
            shared.config.decode_budget
        };
        let start = Instant::now();

        while start.elapsed() < budget {
            if !shared.session_token.is_current(token) {
                return;
            }
            let outcome = {
                let mut guard = shared.decoder.lock();
                match guard.as_mut() {
                    Some(decoder) => decoder.read_frame(),
                    None => return,
                }
            };

            match outcome {
                ReadOutcome::Audio(chunk) => {
                    self.maybe_recheck_duration();
                    if self.seek.seeking {
                        // Pre-target audio is stale; drop it.
                        continue;
                    }
                    {
                        let mut stats = shared.stats.lock();
                        stats.audio_channels = chunk.channels;
                        stats.audio_sample_rate = chunk.sample_rate;
                    }
                    shared.events.emit(PlayerEvent::Audio(chunk));
                }
                ReadOutcome::Video(frame) => {
                    self.maybe_recheck_duration();
                    shared.stats.lock().pts = frame.pts;
                    if self.seek.seeking {
                        if frame.pts < self.seek.target {
                            self.seek_preview(&frame);
                            continue;
                        }
                        self.finish_seek();
                    }
                    if !self.clock.is_anchored() {
                        self.clock.anchor(frame.pts);
                    }
                    self.render_frame(&frame);
                    let delay = self.clock.delay_until(frame.pts);
                    self.schedule(delay);
                    return;
                }
                ReadOutcome::NeedData => {
                    shared
                        .waiting_for_data
                        .store(true, std::sync::atomic::Ordering::Release);
                    // The pump wakes us early if bytes arrive before this.
                    self.schedule(shared.config.starved_retry);
                    return;
                }
                ReadOutcome::EndOfStream => {
                    if self.seek.seeking {
                        self.abandon_seek_at_eof();
                    }
                    shared.events.log("End of stream.");
                    shared
                        .playing
                        .store(false, std::sync::atomic::Ordering::Release);
                    shared.events.status("Ended");
                    shared.emit_stats(true);
                    shared.events.emit(PlayerEvent::Ended);
                    return;
                }
                ReadOutcome::Failed(code) => {
                    let err = PlayerError::DecodeFailed(code);
                    shared.events.log(format!("{err}."));
                    shared.fail_session(&err, "Error");
                    return;
                }
            }
        }

        // Budget exhausted mid-burst. Seeking yields a real gap so command
        // handling stays responsive; normal playback resumes immediately.
        let delay = if self.seek.seeking {
            shared.config.seeking_reschedule
        } else {
            Duration::ZERO
        };
        self.schedule(delay);
    }

    /// Present a frame: resolution change notification, sink render, frame
    /// accounting and periodic boundary compaction.
    pub(crate) fn render_frame(&mut self, frame: &bridge_traits::VideoFrame) {
        let shared = self.shared.clone();
        if frame.width > 0 && self.resolution != Some((frame.width, frame.height)) {
            self.resolution = Some((frame.width, frame.height));
            shared.events.emit(PlayerEvent::Resolution {
                width: frame.width,
                height: frame.height,
            });
        }
        self.video.render(frame);
        let frames = {
            let mut stats = shared.stats.lock();
            stats.frames += 1;
            stats.frames
        };
        shared.emit_stats(false);
        if frames % shared.config.compact_interval_frames == 0 {
            let mut guard = shared.decoder.lock();
            if let Some(decoder) = guard.as_mut() {
                if decoder.caps().compact {
                    decoder.compact();
                }
            }
        }
    }

    /// Periodically re-query the duration while the container has not
    /// reported one (live-ish or growing sources).
    pub(crate) fn maybe_recheck_duration(&mut self) {
        let shared = self.shared.clone();
        if shared.stats.lock().duration > 0.0 {
            return;
        }
        let now = Instant::now();
        if now.duration_since(self.duration_checked_at) < shared.config.duration_recheck_interval {
            return;
        }
        self.duration_checked_at = now;
        let duration = {
            let guard = shared.decoder.lock();
            guard.as_ref().and_then(|d| d.duration())
        };
        if let Some(duration) = duration.filter(|d| *d > 0.0) {
            shared.stats.lock().duration = duration;
            shared.emit_stats(true);
        }
    }
}
