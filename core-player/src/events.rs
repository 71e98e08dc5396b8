//! # Commands and Events
//!
//! The orchestrator's typed control surface. Hosts drive a session with
//! [`Command`] values over a channel and observe it through [`PlayerEvent`]
//! values; no stringly-typed message protocol is involved. Stats events are
//! rate-limited by [`EventSender`] so per-frame updates do not flood the
//! host.

use bridge_traits::{AudioChunk, RenderMode};
use bytes::Bytes;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;

// ============================================================================
// Sources
// ============================================================================

/// Where the encoded container bytes come from.
#[derive(Debug, Clone)]
pub enum SourceSpec {
    /// A local file, read in chunks.
    File(PathBuf),
    /// Bytes already resident in memory.
    Memory(Bytes),
    /// A progressive HTTP(S) download.
    #[cfg(feature = "http-streaming")]
    Http(String),
}

impl SourceSpec {
    /// Whether ingestion can be restarted from byte 0. Restart-based
    /// (backward) seeks require this.
    pub fn is_restartable(&self) -> bool {
        match self {
            SourceSpec::File(_) | SourceSpec::Memory(_) => true,
            #[cfg(feature = "http-streaming")]
            SourceSpec::Http(_) => false,
        }
    }

    /// Short description for logs.
    pub fn describe(&self) -> String {
        match self {
            SourceSpec::File(path) => format!("file:{}", path.display()),
            SourceSpec::Memory(data) => format!("memory:{} bytes", data.len()),
            #[cfg(feature = "http-streaming")]
            SourceSpec::Http(url) => format!("http:{url}"),
        }
    }
}

// ============================================================================
// Commands
// ============================================================================

/// Control messages accepted by a playback session.
#[derive(Debug)]
pub enum Command {
    /// Tear down any current session and start streaming a new source.
    Load {
        source: SourceSpec,
        /// Optional container format name forwarded to the boundary's open.
        format_hint: Option<String>,
        /// Optional initial capacity hint for the decode session, in bytes.
        buffer_bytes: Option<usize>,
    },
    /// Resume decoding.
    Play,
    /// Suspend decoding; buffered state is kept.
    Pause,
    /// Tear down the session and return to the ready state.
    Stop,
    /// Reposition playback to `seconds`.
    Seek { seconds: f64 },
    /// Change the playback speed multiplier (clamped to the configured
    /// range).
    SetSpeed { speed: f64 },
    /// Switch the presentation path.
    SetRenderMode { mode: RenderMode },
}

// ============================================================================
// Events
// ============================================================================

/// Periodic progress snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaybackStats {
    /// Video frames rendered this session.
    pub frames: u64,
    /// Source bytes appended this session.
    pub bytes: u64,
    /// Latest video presentation timestamp, in seconds.
    pub pts: f64,
    /// Container duration in seconds (0 until known).
    pub duration: f64,
    /// Whether a seek fast-forward is in progress.
    pub seeking: bool,
    /// Channel count of the most recent audio output.
    pub audio_channels: u16,
    /// Sample rate of the most recent audio output.
    pub audio_sample_rate: u32,
}

/// Notifications emitted by a playback session.
#[derive(Debug, Clone)]
pub enum PlayerEvent {
    /// The session worker is up and accepting commands.
    Ready,
    /// Coarse user-facing state ("Playing", "Seeking...", "Ready").
    Status(String),
    /// Human-readable diagnostic line.
    Log(String),
    /// Progress snapshot (rate-limited unless forced).
    Stats(PlaybackStats),
    /// Whether seeking is available for the loaded source, and why not.
    SeekInfo {
        enabled: bool,
        reason: Option<String>,
    },
    /// Video resolution, sent when it first becomes known or changes.
    Resolution { width: u32, height: u32 },
    /// Decoded audio for the host's audio pipeline.
    Audio(AudioChunk),
    /// Discard all queued/buffered audio immediately.
    AudioClear,
    /// Playback finished (end of stream or terminal error).
    Ended,
}

// ============================================================================
// Event Sender
// ============================================================================

/// Emits [`PlayerEvent`]s to the host, rate-limiting unforced stats.
#[derive(Debug)]
pub struct EventSender {
    tx: mpsc::UnboundedSender<PlayerEvent>,
    stats_interval: Duration,
    last_stats: Mutex<Option<Instant>>,
}

impl EventSender {
    pub fn new(tx: mpsc::UnboundedSender<PlayerEvent>, stats_interval: Duration) -> Self {
        Self {
            tx,
            stats_interval,
            last_stats: Mutex::new(None),
        }
    }

    /// Send an event. Errors (host receiver dropped) are ignored; the
    /// session keeps running and tokens handle teardown.
    pub fn emit(&self, event: PlayerEvent) {
        let _ = self.tx.send(event);
    }

    /// Emit a diagnostic line, mirrored to tracing.
    pub fn log(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::info!(target: "core_player", "{message}");
        self.emit(PlayerEvent::Log(message));
    }

    /// Emit a status change.
    pub fn status(&self, status: impl Into<String>) {
        self.emit(PlayerEvent::Status(status.into()));
    }

    /// Emit a stats snapshot. Unforced snapshots are dropped while inside
    /// the rate-limit window; forced ones always go out and reset it.
    pub fn stats(&self, snapshot: PlaybackStats, force: bool) {
        let now = Instant::now();
        let mut last = self.last_stats.lock();
        if !force {
            if let Some(prev) = *last {
                if now.duration_since(prev) < self.stats_interval {
                    return;
                }
            }
        }
        *last = Some(now);
        self.emit(PlayerEvent::Stats(snapshot));
    }
}
