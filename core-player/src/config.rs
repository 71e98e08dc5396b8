//! # Player Configuration
//!
//! Tuning knobs for ingestion, buffering, pacing and seeking. Every
//! threshold the orchestrator consults lives here so hosts can adjust
//! memory ceilings and cadences without touching policy code.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{PlayerError, Result};

/// Orchestrator configuration.
///
/// Controls chunk slicing, buffered-byte ceilings, open gating, decode
/// budgets and timer cadences.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerConfig {
    // ========================================================================
    // Ingestion
    // ========================================================================
    /// Maximum bytes appended to the boundary in one call. Larger source
    /// chunks are re-sliced.
    ///
    /// Default: 256 KiB.
    #[serde(default = "default_max_chunk_bytes")]
    pub max_chunk_bytes: usize,

    /// Interval between backpressure polls while the buffered backlog sits
    /// above the ceiling.
    ///
    /// Default: 15 ms.
    #[serde(default = "default_buffer_poll")]
    pub buffer_poll: Duration,

    /// Bytes of header sampled from the front of the stream for open-failure
    /// diagnostics.
    ///
    /// Default: 32 bytes.
    #[serde(default = "default_header_sample_bytes")]
    pub header_sample_bytes: usize,

    // ========================================================================
    // Buffering
    // ========================================================================
    /// Normal ceiling for the boundary's undecoded backlog. Ingestion pauses
    /// while the backlog exceeds this.
    ///
    /// Default: 512 MiB.
    #[serde(default = "default_max_buffered_bytes")]
    pub max_buffered_bytes: u64,

    /// Reduced ceiling applied while a slow seek fast-forwards, so discarded
    /// pre-target data does not accumulate.
    ///
    /// Default: 48 MiB.
    #[serde(default = "default_seek_buffered_bytes")]
    pub seek_buffered_bytes: u64,

    /// Internal buffer ceiling hinted to the boundary at session creation
    /// (when the capability is advertised).
    ///
    /// Default: 500 MiB.
    #[serde(default = "default_decoder_buffer_limit")]
    pub decoder_buffer_limit: u64,

    /// Session capacity hint passed to the decoder factory when the host
    /// does not supply one at load time.
    ///
    /// Default: 4 MiB.
    #[serde(default = "default_capacity_hint")]
    pub default_capacity_hint: usize,

    // ========================================================================
    // Open Gating
    // ========================================================================
    /// Minimum bytes buffered before the first open attempt.
    ///
    /// Default: 2 MiB.
    #[serde(default = "default_min_open_bytes")]
    pub min_open_bytes: u64,

    /// Open threshold for small sources (total size at or below this value).
    ///
    /// Default: 256 KiB.
    #[serde(default = "default_min_open_bytes_small")]
    pub min_open_bytes_small: u64,

    // ========================================================================
    // Pacing
    // ========================================================================
    /// Wall-clock decode budget per tick during normal playback.
    ///
    /// Default: 8 ms.
    #[serde(default = "default_decode_budget")]
    pub decode_budget: Duration,

    /// Wall-clock decode budget per tick while a seek fast-forwards. Smaller
    /// so command handling stays responsive.
    ///
    /// Default: 4 ms.
    #[serde(default = "default_seek_decode_budget")]
    pub seek_decode_budget: Duration,

    /// Retry delay after the boundary reports it is starved for input.
    ///
    /// Default: 30 ms.
    #[serde(default = "default_starved_retry")]
    pub starved_retry: Duration,

    /// Reschedule delay when a seeking tick exhausts its budget.
    ///
    /// Default: 5 ms.
    #[serde(default = "default_seeking_reschedule")]
    pub seeking_reschedule: Duration,

    /// Frames decoded between boundary memory-compaction requests.
    ///
    /// Default: 60.
    #[serde(default = "default_compact_interval_frames")]
    pub compact_interval_frames: u64,

    /// Interval between duration re-queries while the container has not yet
    /// reported one.
    ///
    /// Default: 500 ms.
    #[serde(default = "default_duration_recheck_interval")]
    pub duration_recheck_interval: Duration,

    // ========================================================================
    // Seeking
    // ========================================================================
    /// Maximum seconds a native seek may land past its target before the
    /// orchestrator falls back to a restart-based seek.
    ///
    /// Default: 10.0.
    #[serde(default = "default_seek_tolerance_secs")]
    pub seek_tolerance_secs: f64,

    /// Minimum interval between preview frames rendered during seek
    /// fast-forward.
    ///
    /// Default: 250 ms.
    #[serde(default = "default_seek_preview_interval")]
    pub seek_preview_interval: Duration,

    // ========================================================================
    // Reporting
    // ========================================================================
    /// Minimum interval between unforced stats events.
    ///
    /// Default: 120 ms.
    #[serde(default = "default_stats_interval")]
    pub stats_interval: Duration,

    // ========================================================================
    // Clock
    // ========================================================================
    /// Lowest accepted playback speed multiplier.
    ///
    /// Default: 0.25.
    #[serde(default = "default_min_speed")]
    pub min_speed: f64,

    /// Highest accepted playback speed multiplier.
    ///
    /// Default: 2.0.
    #[serde(default = "default_max_speed")]
    pub max_speed: f64,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            max_chunk_bytes: default_max_chunk_bytes(),
            buffer_poll: default_buffer_poll(),
            header_sample_bytes: default_header_sample_bytes(),
            max_buffered_bytes: default_max_buffered_bytes(),
            seek_buffered_bytes: default_seek_buffered_bytes(),
            decoder_buffer_limit: default_decoder_buffer_limit(),
            default_capacity_hint: default_capacity_hint(),
            min_open_bytes: default_min_open_bytes(),
            min_open_bytes_small: default_min_open_bytes_small(),
            decode_budget: default_decode_budget(),
            seek_decode_budget: default_seek_decode_budget(),
            starved_retry: default_starved_retry(),
            seeking_reschedule: default_seeking_reschedule(),
            compact_interval_frames: default_compact_interval_frames(),
            duration_recheck_interval: default_duration_recheck_interval(),
            seek_tolerance_secs: default_seek_tolerance_secs(),
            seek_preview_interval: default_seek_preview_interval(),
            stats_interval: default_stats_interval(),
            min_speed: default_min_speed(),
            max_speed: default_max_speed(),
        }
    }
}

impl PlayerConfig {
    /// Configuration for memory-constrained hosts.
    ///
    /// - 64 MiB normal ceiling, 16 MiB seek ceiling
    /// - 60 MiB boundary buffer hint
    /// - 1 MiB session capacity hint
    pub fn low_memory() -> Self {
        Self {
            max_buffered_bytes: 64 * 1024 * 1024,
            seek_buffered_bytes: 16 * 1024 * 1024,
            decoder_buffer_limit: 60 * 1024 * 1024,
            default_capacity_hint: 1024 * 1024,
            ..Default::default()
        }
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// [`PlayerError::InvalidConfig`] naming the offending field.
    pub fn validate(&self) -> Result<()> {
        if self.max_chunk_bytes == 0 {
            return Err(PlayerError::InvalidConfig(
                "max_chunk_bytes must be > 0".to_string(),
            ));
        }

        if self.max_buffered_bytes == 0 {
            return Err(PlayerError::InvalidConfig(
                "max_buffered_bytes must be > 0".to_string(),
            ));
        }

        if self.seek_buffered_bytes > self.max_buffered_bytes {
            return Err(PlayerError::InvalidConfig(
                "seek_buffered_bytes cannot exceed max_buffered_bytes".to_string(),
            ));
        }

        if self.min_open_bytes_small > self.min_open_bytes {
            return Err(PlayerError::InvalidConfig(
                "min_open_bytes_small cannot exceed min_open_bytes".to_string(),
            ));
        }

        if self.buffer_poll.is_zero() {
            return Err(PlayerError::InvalidConfig(
                "buffer_poll must be > 0".to_string(),
            ));
        }

        if self.compact_interval_frames == 0 {
            return Err(PlayerError::InvalidConfig(
                "compact_interval_frames must be > 0".to_string(),
            ));
        }

        if self.seek_tolerance_secs < 0.0 {
            return Err(PlayerError::InvalidConfig(
                "seek_tolerance_secs must be >= 0".to_string(),
            ));
        }

        if self.min_speed <= 0.0 || self.max_speed < self.min_speed {
            return Err(PlayerError::InvalidConfig(
                "speed range must satisfy 0 < min_speed <= max_speed".to_string(),
            ));
        }

        Ok(())
    }

    /// Clamp a requested playback speed into the accepted range.
    pub fn clamp_speed(&self, speed: f64) -> f64 {
        if !speed.is_finite() {
            return 1.0;
        }
        speed.clamp(self.min_speed, self.max_speed)
    }

    /// Open-gating threshold for a source of known total size.
    ///
    /// Small sources open once fully buffered; unknown sizes use the normal
    /// threshold.
    pub fn open_threshold(&self, source_len: Option<u64>) -> u64 {
        match source_len {
            Some(len) if len <= self.min_open_bytes_small => self.min_open_bytes_small.min(len),
            Some(len) => self.min_open_bytes.min(len),
            None => self.min_open_bytes,
        }
    }
}

// ============================================================================
// Default Functions (for serde)
// ============================================================================

fn default_max_chunk_bytes() -> usize {
    256 * 1024
}

fn default_buffer_poll() -> Duration {
    Duration::from_millis(15)
}

fn default_header_sample_bytes() -> usize {
    32
}

fn default_max_buffered_bytes() -> u64 {
    512 * 1024 * 1024
}

fn default_seek_buffered_bytes() -> u64 {
    48 * 1024 * 1024
}

fn default_decoder_buffer_limit() -> u64 {
    500 * 1024 * 1024
}

fn default_capacity_hint() -> usize {
    4 * 1024 * 1024
}

fn default_min_open_bytes() -> u64 {
    2 * 1024 * 1024
}

fn default_min_open_bytes_small() -> u64 {
    256 * 1024
}

fn default_decode_budget() -> Duration {
    Duration::from_millis(8)
}

fn default_seek_decode_budget() -> Duration {
    Duration::from_millis(4)
}

fn default_starved_retry() -> Duration {
    Duration::from_millis(30)
}

fn default_seeking_reschedule() -> Duration {
    Duration::from_millis(5)
}

fn default_compact_interval_frames() -> u64 {
    60
}

fn default_duration_recheck_interval() -> Duration {
    Duration::from_millis(500)
}

fn default_seek_tolerance_secs() -> f64 {
    10.0
}

fn default_seek_preview_interval() -> Duration {
    Duration::from_millis(250)
}

fn default_stats_interval() -> Duration {
    Duration::from_millis(120)
}

fn default_min_speed() -> f64 {
    0.25
}

fn default_max_speed() -> f64 {
    2.0
}
