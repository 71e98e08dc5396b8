//! # Audio Ring Buffer
//!
//! Fixed-capacity circular buffer of interleaved f32 samples sitting between
//! decode output and the real-time render callback. Overflow drops the
//! oldest samples (playback latency stays bounded); underflow zero-fills
//! (the output never blocks or glitches with stale data).
//!
//! The buffer has a single owner; the [`AudioPipeline`](crate::audio)
//! serializes producer messages and render pulls, so no interior locking is
//! needed here.

/// Floor for the derived capacity, in frames.
pub const MIN_CAPACITY_FRAMES: usize = 4096;

/// Circular buffer of interleaved audio samples.
#[derive(Debug)]
pub struct AudioRingBuffer {
    buffer: Vec<f32>,
    capacity_frames: usize,
    channels: u16,
    read_index: usize,
    write_index: usize,
    available: usize,
}

impl AudioRingBuffer {
    /// Create a buffer holding a quarter second at `sample_rate`, floored at
    /// [`MIN_CAPACITY_FRAMES`].
    pub fn new(sample_rate: u32, channels: u16) -> Self {
        let capacity_frames = (sample_rate as usize / 4).max(MIN_CAPACITY_FRAMES);
        Self::with_capacity(capacity_frames, channels)
    }

    /// Create a buffer with an explicit frame capacity.
    pub fn with_capacity(capacity_frames: usize, channels: u16) -> Self {
        Self {
            buffer: vec![0.0; capacity_frames * channels as usize],
            capacity_frames,
            channels,
            read_index: 0,
            write_index: 0,
            available: 0,
        }
    }

    /// Capacity in samples.
    pub fn capacity(&self) -> usize {
        self.capacity_frames * self.channels as usize
    }

    /// Samples currently buffered.
    pub fn available(&self) -> usize {
        self.available
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn is_empty(&self) -> bool {
        self.available == 0
    }

    /// Append interleaved samples, evicting the oldest buffered samples when
    /// the free space is insufficient.
    pub fn push(&mut self, samples: &[f32]) {
        let cap = self.capacity();
        if cap == 0 || samples.is_empty() {
            return;
        }

        // A write at least as large as the buffer replaces the entire
        // contents with the freshest tail.
        if samples.len() >= cap {
            let tail = &samples[samples.len() - cap..];
            self.buffer[..cap].copy_from_slice(tail);
            self.read_index = 0;
            self.write_index = 0;
            self.available = cap;
            return;
        }

        let free = cap - self.available;
        if samples.len() > free {
            let evict = samples.len() - free;
            self.read_index = (self.read_index + evict) % cap;
            self.available -= evict;
        }

        let first = samples.len().min(cap - self.write_index);
        self.buffer[self.write_index..self.write_index + first].copy_from_slice(&samples[..first]);
        let rest = samples.len() - first;
        if rest > 0 {
            self.buffer[..rest].copy_from_slice(&samples[first..]);
        }
        self.write_index = (self.write_index + samples.len()) % cap;
        self.available += samples.len();
    }

    /// Fill `out` from the buffer, zero-filling any shortfall.
    pub fn pop(&mut self, out: &mut [f32]) {
        let cap = self.capacity();
        if cap == 0 {
            out.fill(0.0);
            return;
        }

        let take = out.len().min(self.available);
        let first = take.min(cap - self.read_index);
        out[..first].copy_from_slice(&self.buffer[self.read_index..self.read_index + first]);
        let rest = take - first;
        if rest > 0 {
            out[first..take].copy_from_slice(&self.buffer[..rest]);
        }
        self.read_index = (self.read_index + take) % cap;
        self.available -= take;

        if take < out.len() {
            out[take..].fill(0.0);
        }
    }

    /// Discard all buffered samples without reallocating.
    pub fn clear(&mut self) {
        self.read_index = 0;
        self.write_index = 0;
        self.available = 0;
    }

    /// Adopt a new channel count. Reallocates (and discards contents) only
    /// when the count actually changes.
    pub fn reconfigure(&mut self, channels: u16) {
        if channels == self.channels {
            return;
        }
        self.channels = channels;
        self.buffer = vec![0.0; self.capacity_frames * channels as usize];
        self.clear();
    }
}
