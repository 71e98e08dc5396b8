//! # Decoder Boundary
//!
//! Contract for the external demuxer/codec engine. The engine owns container
//! parsing and frame decoding; the playback core owns pacing, buffering and
//! seeking policy. All operations here model a foreign call interface whose
//! calls are plain memory operations, so the trait is synchronous; the core
//! serializes access behind its own lock.
//!
//! ## Session Lifecycle
//!
//! One [`DecoderBoundary`] value is one open decode session. The orchestrator
//! holds exactly one live session at a time and destroys it (by dropping) on
//! stop, reload, or before a seek-restart recreates it through the
//! [`DecoderFactory`].
//!
//! ## Result Classification
//!
//! `read_frame` returns a closed [`ReadOutcome`] union instead of a raw
//! integer protocol, so callers exhaustively match on need-data, video,
//! audio, end-of-stream and failure.

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Decoded Units
// ============================================================================

/// Metadata for one decoded video frame.
///
/// Pixel data stays inside the boundary; presentation surfaces pull pixels
/// through their own host-specific path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoFrame {
    /// Presentation timestamp in seconds.
    pub pts: f64,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
}

/// One decoded chunk of interleaved PCM audio.
///
/// Samples are f32 in `[-1.0, 1.0]`, interleaved per channel
/// (stereo: `[L0, R0, L1, R1, ...]`).
#[derive(Debug, Clone, PartialEq)]
pub struct AudioChunk {
    /// Number of audio channels.
    pub channels: u16,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Presentation timestamp of the first sample, in seconds.
    pub pts: f64,
    /// Interleaved samples (`frames * channels` values).
    pub samples: Vec<f32>,
}

impl AudioChunk {
    /// Number of frames represented by this chunk (one sample per channel).
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            return 0;
        }
        self.samples.len() / self.channels as usize
    }
}

/// Classification of one `read_frame` call.
#[derive(Debug, Clone, PartialEq)]
pub enum ReadOutcome {
    /// Not enough buffered input to produce another unit; append more bytes.
    NeedData,
    /// A decoded video frame is current; metadata attached.
    Video(VideoFrame),
    /// A decoded audio chunk is current; samples attached.
    Audio(AudioChunk),
    /// All buffered input has been decoded and end-of-input was signaled.
    EndOfStream,
    /// Unrecoverable decode failure with the boundary's raw error code.
    Failed(i32),
}

// ============================================================================
// Errors
// ============================================================================

/// Unrecoverable boundary failure carrying the foreign error code.
///
/// Returned by `append` and `seek`. An append fault ends ingestion for the
/// session; a seek fault triggers the slow-seek fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("decoder boundary fault (code {code})")]
pub struct DecoderFault {
    /// Raw foreign error code (always negative).
    pub code: i32,
}

impl DecoderFault {
    pub fn new(code: i32) -> Self {
        Self { code }
    }
}

/// Container open failure.
///
/// Open errors are retryable while more input may still arrive; the core
/// treats them as terminal only once the source is draining.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("container open failed (code {code})")]
pub struct OpenError {
    /// Raw foreign error code.
    pub code: i32,
}

impl OpenError {
    pub fn new(code: i32) -> Self {
        Self { code }
    }
}

// ============================================================================
// Capability Descriptor
// ============================================================================

/// Typed set of optional operations a boundary implementation supports.
///
/// Resolved once when the session is created. The seek coordinator consults
/// `native_seek`; the buffer governor consults `buffered_bytes` and
/// `compact`; load-time tuning hooks are applied only when advertised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecoderCaps {
    /// `seek` repositions the session in place.
    pub native_seek: bool,
    /// `buffered_bytes` reports the undecoded backlog.
    pub buffered_bytes: bool,
    /// `compact` reclaims memory for consumed input.
    pub compact: bool,
    /// `set_audio_enabled` gates audio decode output.
    pub set_audio_enabled: bool,
    /// `set_file_size` accepts a total-size hint.
    pub set_file_size: bool,
    /// `set_buffer_limit` accepts an internal ceiling hint.
    pub set_buffer_limit: bool,
}

impl DecoderCaps {
    /// Descriptor advertising every optional operation.
    pub fn all() -> Self {
        Self {
            native_seek: true,
            buffered_bytes: true,
            compact: true,
            set_audio_enabled: true,
            set_file_size: true,
            set_buffer_limit: true,
        }
    }

    /// Descriptor advertising nothing beyond the mandatory operations.
    pub fn none() -> Self {
        Self {
            native_seek: false,
            buffered_bytes: false,
            compact: false,
            set_audio_enabled: false,
            set_file_size: false,
            set_buffer_limit: false,
        }
    }
}

// ============================================================================
// Core Traits
// ============================================================================

/// One open decode session of the external demuxer/codec engine.
///
/// Input flows in through `append`; decoded units flow out through
/// `read_frame`. The session is push-based: it never reads from a file or
/// socket itself.
///
/// Implementations must tolerate calls after `set_eof` (further `append`
/// calls may be rejected with a fault) and must make `read_frame` cheap when
/// it returns [`ReadOutcome::NeedData`].
pub trait DecoderBoundary: Send {
    /// The capability descriptor for this session, stable for its lifetime.
    fn caps(&self) -> DecoderCaps;

    /// Feed encoded container bytes. Returns the number of bytes accepted
    /// (all of `data` on success).
    ///
    /// # Errors
    ///
    /// A [`DecoderFault`] means the session can accept no further input.
    fn append(&mut self, data: &[u8]) -> Result<usize, DecoderFault>;

    /// Mark that no further input will arrive. Idempotent.
    fn set_eof(&mut self);

    /// Attempt to parse the container header and select streams.
    ///
    /// `format_hint` optionally names the container format (e.g. `"matroska"`).
    ///
    /// # Errors
    ///
    /// [`OpenError`] with the foreign code; retryable while input is still
    /// arriving.
    fn open(&mut self, format_hint: Option<&str>) -> Result<(), OpenError>;

    /// Decode and classify the next unit.
    fn read_frame(&mut self) -> ReadOutcome;

    /// Container duration in seconds, if known yet.
    fn duration(&self) -> Option<f64>;

    /// Reposition the session near `seconds` without restarting ingestion.
    ///
    /// The landing position is approximate (keyframe granularity); callers
    /// verify it. Only meaningful when `caps().native_seek` is set.
    ///
    /// # Errors
    ///
    /// [`DecoderFault`] when the seek is unsupported for the buffered data.
    fn seek(&mut self, seconds: f64) -> Result<(), DecoderFault>;

    /// Bytes appended but not yet consumed by decoding.
    fn buffered_bytes(&self) -> u64;

    /// Reclaim memory for already-consumed input.
    fn compact(&mut self);

    /// Enable or disable audio decode output (disabled while seeking).
    fn set_audio_enabled(&mut self, enabled: bool);

    /// Hint the total source size in bytes, when known up front.
    fn set_file_size(&mut self, bytes: u64);

    /// Hint a ceiling for the boundary's internal buffer.
    fn set_buffer_limit(&mut self, bytes: u64);
}

/// Creates decode sessions.
///
/// A factory outlives individual sessions; the seek coordinator uses it to
/// recreate the boundary for a restart-based backward seek.
pub trait DecoderFactory: Send + Sync {
    /// Create a session sized around `initial_capacity_hint` bytes of input.
    ///
    /// # Errors
    ///
    /// [`DecoderFault`] on allocation failure; the playback session never
    /// starts.
    fn create(&self, initial_capacity_hint: usize)
        -> Result<Box<dyn DecoderBoundary>, DecoderFault>;
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audio_chunk_frame_count() {
        let chunk = AudioChunk {
            channels: 2,
            sample_rate: 48000,
            pts: 0.0,
            samples: vec![0.0; 960],
        };
        assert_eq!(chunk.frames(), 480);

        let silent = AudioChunk {
            channels: 0,
            sample_rate: 0,
            pts: 0.0,
            samples: Vec::new(),
        };
        assert_eq!(silent.frames(), 0);
    }

    #[test]
    fn caps_presets() {
        assert!(DecoderCaps::all().native_seek);
        assert!(DecoderCaps::all().compact);
        assert!(!DecoderCaps::none().native_seek);
        assert!(!DecoderCaps::none().set_file_size);
    }

    #[test]
    fn read_outcome_matching_is_exhaustive() {
        let outcome = ReadOutcome::Video(VideoFrame {
            pts: 1.5,
            width: 1920,
            height: 1080,
        });
        let described = match outcome {
            ReadOutcome::NeedData => "need-data",
            ReadOutcome::Video(_) => "video",
            ReadOutcome::Audio(_) => "audio",
            ReadOutcome::EndOfStream => "end",
            ReadOutcome::Failed(_) => "failed",
        };
        assert_eq!(described, "video");
    }
}
