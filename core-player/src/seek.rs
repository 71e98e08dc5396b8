//! # Seek Coordinator
//!
//! Two seek strategies behind one entry point:
//!
//! - **fast**: reposition the boundary in place via its native seek, then
//!   fast-forward decode to the exact target. Preferred whenever the
//!   boundary advertises the capability.
//! - **slow**: fast-forward decode from the current position (forward
//!   targets), or restart ingestion from byte 0 with a fresh decode session
//!   (backward targets, restartable sources only).
//!
//! A fast seek that fails, or that lands a keyframe further past the target
//! than the configured tolerance, latches the session into slow-seek mode;
//! it never retries the native path. During any fast-forward, audio decode
//! is gated off, stats are forced on a coarse cadence and preview frames
//! render at a low rate so the host can show progress.

use std::sync::atomic::Ordering;
use tokio::time::Instant;

use bridge_traits::{ReadOutcome, VideoFrame};

use crate::error::PlayerError;
use crate::events::PlayerEvent;
use crate::player::{open_source, PlayerSession};

/// Worker-owned seek state for the loaded source.
#[derive(Debug)]
pub(crate) struct SeekState {
    /// Seeking available at all for this source.
    pub(crate) enabled: bool,
    /// A fast-forward toward `target` is in progress.
    pub(crate) seeking: bool,
    pub(crate) target: f64,
    /// Latched once the native path fails or mis-lands.
    pub(crate) slow: bool,
    pub(crate) last_stats: Instant,
    pub(crate) last_preview: Instant,
}

impl SeekState {
    pub(crate) fn new(enabled: bool) -> Self {
        Self {
            enabled,
            seeking: false,
            target: 0.0,
            slow: false,
            last_stats: Instant::now(),
            last_preview: Instant::now(),
        }
    }
}

impl PlayerSession {
    pub(crate) async fn perform_seek(&mut self, seconds: f64) {
        let shared = self.shared.clone();
        if self.source_spec.is_none() {
            shared.events.log("Seek ignored: no source loaded.");
            return;
        }
        if !self.seek.enabled {
            shared.events.log("Seeking is not available for this source.");
            return;
        }
        if !shared.is_opened() {
            shared.events.log("Seek ignored: container not opened yet.");
            return;
        }

        let duration = shared.stats.lock().duration;
        let target = if duration > 0.0 {
            seconds.clamp(0.0, duration)
        } else {
            seconds.max(0.0)
        };

        if self.seek.slow {
            self.slow_seek(target).await;
            return;
        }
        let native = {
            let guard = shared.decoder.lock();
            guard.as_ref().map(|d| d.caps().native_seek).unwrap_or(false)
        };
        if !native {
            let err = PlayerError::SeekNotSupported;
            if err.is_seek_fallback() {
                self.seek.slow = true;
                self.slow_seek(target).await;
            }
            return;
        }
        self.fast_seek(target).await;
    }

    async fn fast_seek(&mut self, target: f64) {
        let shared = self.shared.clone();
        shared.events.log(format!("Seeking to {target:.2}s."));
        self.next_tick = None;
        shared.events.emit(PlayerEvent::AudioClear);

        let result = {
            let mut guard = shared.decoder.lock();
            match guard.as_mut() {
                Some(decoder) => decoder.seek(target),
                None => return,
            }
        };
        if let Err(fault) = result {
            let err = PlayerError::SeekFaulted(fault.code);
            shared
                .events
                .log(format!("{err}; falling back to stream restart."));
            if err.is_seek_fallback() {
                self.seek.slow = true;
                self.slow_seek(target).await;
            }
            return;
        }

        // Verify the landing. A keyframe past target + tolerance means the
        // container index mis-led the native seek. The peek consumes one
        // outcome, so terminal results must be handled right here.
        enum Peek {
            Landed,
            Overshot(f64),
            Ended,
            Failed(i32),
        }
        let peek = {
            let mut guard = shared.decoder.lock();
            match guard.as_mut() {
                Some(decoder) => match decoder.read_frame() {
                    ReadOutcome::Video(frame)
                        if frame.pts > target + shared.config.seek_tolerance_secs =>
                    {
                        Peek::Overshot(frame.pts)
                    }
                    ReadOutcome::EndOfStream => Peek::Ended,
                    ReadOutcome::Failed(code) => Peek::Failed(code),
                    _ => Peek::Landed,
                },
                None => return,
            }
        };
        match peek {
            Peek::Landed => {
                self.begin_seek(target);
                self.schedule_now();
            }
            Peek::Overshot(landed) => {
                shared.events.log(format!(
                    "Seek landed at {landed:.2}s, past the {target:.2}s target; restarting stream."
                ));
                self.seek.slow = true;
                self.slow_seek(target).await;
            }
            Peek::Ended => {
                shared.events.log("End of stream.");
                shared.playing.store(false, Ordering::Release);
                shared.events.status("Ended");
                shared.emit_stats(true);
                shared.events.emit(PlayerEvent::Ended);
            }
            Peek::Failed(code) => {
                let err = PlayerError::DecodeFailed(code);
                shared.events.log(format!("{err}."));
                shared.fail_session(&err, "Error");
            }
        }
    }

    pub(crate) async fn slow_seek(&mut self, target: f64) {
        let shared = self.shared.clone();
        let current = shared.stats.lock().pts;
        let needs_restart = target < current;
        let restartable = self
            .source_spec
            .as_ref()
            .map(|s| s.is_restartable())
            .unwrap_or(false);
        if needs_restart && !restartable {
            shared
                .events
                .log(format!("{}.", PlayerError::SeekNotRestartable));
            return;
        }

        shared.events.log(if needs_restart {
            format!("Seeking backward to {target:.2}s via stream restart.")
        } else {
            format!("Seeking forward to {target:.2}s via decode fast-forward.")
        });
        self.next_tick = None;
        shared.events.emit(PlayerEvent::AudioClear);
        // Pre-target output is discarded, so cap what ingestion may pile up.
        shared.governor.lower_for_seek();
        self.begin_seek(target);

        if !needs_restart {
            self.schedule_now();
            return;
        }
        self.restart_stream_for_seek().await;
    }

    /// Backward slow seek: invalidate everything, recreate the decode
    /// session and re-ingest from byte 0. Seek state and the lowered
    /// ceiling survive the teardown.
    async fn restart_stream_for_seek(&mut self) {
        let shared = self.shared.clone();
        let Some(spec) = self.source_spec.clone() else {
            return;
        };

        shared.session_token.bump();
        let stream_token = shared.stream_token.bump();
        self.next_tick = None;

        *shared.decoder.lock() = None;
        shared.opened.store(false, Ordering::Release);
        shared.waiting_for_data.store(false, Ordering::Release);
        shared.governor.clear_draining();
        {
            let mut stats = shared.stats.lock();
            stats.bytes = 0;
            stats.frames = 0;
            stats.pts = 0.0;
            stats.duration = 0.0;
        }
        shared.ingest.lock().reset_for_restart();

        let chunk_source = match open_source(&spec).await {
            Ok(s) => s,
            Err(e) => {
                // The session is already torn down, so a reopen failure
                // ends it even though a plain load failure would not.
                let err = PlayerError::SourceOpen(e.to_string());
                shared.events.log(format!("{err} (seek restart)."));
                shared.playing.store(false, Ordering::Release);
                shared.events.status("Error");
                shared.emit_stats(true);
                shared.events.emit(PlayerEvent::Ended);
                return;
            }
        };
        let source_len = chunk_source.len_hint();

        let mut decoder = match self.factory.create(shared.config.default_capacity_hint) {
            Ok(d) => d,
            Err(fault) => {
                let err = PlayerError::DecoderAllocation(fault.code);
                shared.events.log(format!("{err} (seek restart)."));
                shared.fail_session(&err, "Error");
                return;
            }
        };
        let caps = decoder.caps();
        if caps.set_buffer_limit {
            decoder.set_buffer_limit(shared.config.decoder_buffer_limit);
        }
        if caps.set_file_size {
            if let Some(len) = source_len {
                decoder.set_file_size(len);
            }
        }
        if caps.set_audio_enabled {
            decoder.set_audio_enabled(false);
        }
        *shared.decoder.lock() = Some(decoder);
        shared.ingest.lock().source_len = source_len;

        shared.playing.store(true, Ordering::Release);
        tokio::spawn(crate::ingest::run_pump(shared.clone(), chunk_source, stream_token));
        // The pacer resumes once the container reopens.
    }

    /// Enter the fast-forward state shared by both strategies.
    fn begin_seek(&mut self, target: f64) {
        let shared = &self.shared;
        self.seek.seeking = true;
        self.seek.target = target;
        self.seek.last_stats = Instant::now();
        self.seek.last_preview = Instant::now();
        self.clock.reset();
        {
            let mut stats = shared.stats.lock();
            stats.seeking = true;
            stats.pts = 0.0;
            stats.frames = 0;
        }
        shared.events.status("Seeking...");
        shared.set_audio_enabled(false);
        shared.emit_stats(true);
    }

    /// Coarse progress reporting while fast-forwarding past a pre-target
    /// frame.
    pub(crate) fn seek_preview(&mut self, frame: &VideoFrame) {
        let now = Instant::now();
        if now.duration_since(self.seek.last_stats) >= self.shared.config.stats_interval {
            self.seek.last_stats = now;
            self.shared.emit_stats(true);
        }
        if now.duration_since(self.seek.last_preview) >= self.shared.config.seek_preview_interval {
            self.seek.last_preview = now;
            self.render_frame(frame);
        }
    }

    /// The fast-forward reached its target; resume normal playback.
    pub(crate) fn finish_seek(&mut self) {
        let shared = self.shared.clone();
        self.seek.seeking = false;
        self.seek.target = 0.0;
        self.clock.reset();
        shared.governor.restore();
        shared.stats.lock().seeking = false;
        shared.events.emit(PlayerEvent::AudioClear);
        shared.set_audio_enabled(true);
        shared.events.status("Playing");
        shared.emit_stats(true);
        shared.events.log("Seek target reached.");
    }

    /// End of stream arrived before the target; leave the seek cleanly so
    /// the session ends in a normal state.
    pub(crate) fn abandon_seek_at_eof(&mut self) {
        self.seek.seeking = false;
        self.seek.target = 0.0;
        self.shared.governor.restore();
        self.shared.stats.lock().seeking = false;
        self.shared.set_audio_enabled(true);
    }
}
