//! # Audio Pipeline
//!
//! Host-side consumer of decoded audio. The pipeline owns the ring buffer
//! and speaks a three-message protocol with the orchestrator (configure,
//! push, clear); the host's real-time callback pulls samples through
//! [`AudioPipeline::render`]. Status snapshots are throttled by callback
//! count so the render path never floods observers.

use crate::ring_buffer::AudioRingBuffer;

/// Render callbacks between status snapshots.
pub const STATUS_EVERY_CALLBACKS: u32 = 50;

/// Messages from the orchestrator to the audio pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum AudioMessage {
    /// Adopt a channel count before the next push.
    Config { channels: u16 },
    /// Interleaved samples to buffer.
    Push { samples: Vec<f32> },
    /// Drop everything buffered, immediately (seek, stop, reload).
    Clear,
}

/// Occupancy snapshot returned periodically from the render path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioStatus {
    /// Samples currently buffered.
    pub available: usize,
    /// Buffer capacity in samples.
    pub capacity: usize,
    /// Current channel count.
    pub channels: u16,
    /// Output sample rate in Hz.
    pub sample_rate: u32,
}

/// Ring buffer plus protocol handling.
#[derive(Debug)]
pub struct AudioPipeline {
    ring: AudioRingBuffer,
    sample_rate: u32,
    renders: u32,
}

impl AudioPipeline {
    /// Create a pipeline for the host's output sample rate. Starts stereo;
    /// a `Config` message adjusts the channel count once known.
    pub fn new(sample_rate: u32) -> Self {
        Self {
            ring: AudioRingBuffer::new(sample_rate, 2),
            sample_rate,
            renders: 0,
        }
    }

    pub fn channels(&self) -> u16 {
        self.ring.channels()
    }

    pub fn available(&self) -> usize {
        self.ring.available()
    }

    /// Apply one protocol message.
    pub fn handle(&mut self, message: AudioMessage) {
        match message {
            AudioMessage::Config { channels } => self.ring.reconfigure(channels),
            AudioMessage::Push { samples } => self.ring.push(&samples),
            AudioMessage::Clear => self.ring.clear(),
        }
    }

    /// Fill `out` for one render quantum (zero-filled on underflow). Every
    /// [`STATUS_EVERY_CALLBACKS`]th call returns an occupancy snapshot.
    pub fn render(&mut self, out: &mut [f32]) -> Option<AudioStatus> {
        self.ring.pop(out);
        self.renders = self.renders.wrapping_add(1);
        if self.renders % STATUS_EVERY_CALLBACKS == 0 {
            Some(self.status())
        } else {
            None
        }
    }

    /// Current occupancy snapshot.
    pub fn status(&self) -> AudioStatus {
        AudioStatus {
            available: self.ring.available(),
            capacity: self.ring.capacity(),
            channels: self.ring.channels(),
            sample_rate: self.sample_rate,
        }
    }
}
