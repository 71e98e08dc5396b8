//! # Buffer Governor
//!
//! Owns the buffered-byte ceiling the ingestion pump honors and the
//! draining flag raised once the source is exhausted. The ceiling is
//! lowered while a slow seek fast-forwards (decoded-and-discarded data must
//! not pile up) and restored when the seek completes.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use crate::config::PlayerConfig;

/// Backpressure and drain state shared between the pump and the worker.
#[derive(Debug)]
pub struct BufferGovernor {
    ceiling: AtomicU64,
    default_ceiling: u64,
    seek_ceiling: u64,
    draining: AtomicBool,
}

impl BufferGovernor {
    pub fn new(config: &PlayerConfig) -> Self {
        Self {
            ceiling: AtomicU64::new(config.max_buffered_bytes),
            default_ceiling: config.max_buffered_bytes,
            seek_ceiling: config.seek_buffered_bytes,
            draining: AtomicBool::new(false),
        }
    }

    /// Whether the pump may append given the boundary's current backlog.
    pub fn can_append(&self, buffered_bytes: u64) -> bool {
        buffered_bytes <= self.ceiling.load(Ordering::Acquire)
    }

    pub fn ceiling(&self) -> u64 {
        self.ceiling.load(Ordering::Acquire)
    }

    /// Apply the reduced seek ceiling.
    pub fn lower_for_seek(&self) {
        self.ceiling.store(self.seek_ceiling, Ordering::Release);
    }

    /// Restore the normal ceiling.
    pub fn restore(&self) {
        self.ceiling.store(self.default_ceiling, Ordering::Release);
    }

    /// Mark the source exhausted; open gating stops waiting for more bytes.
    pub fn note_draining(&self) {
        self.draining.store(true, Ordering::Release);
    }

    pub fn is_draining(&self) -> bool {
        self.draining.load(Ordering::Acquire)
    }

    /// Clear the drain flag without touching the ceiling. Used when a seek
    /// restart begins re-ingesting while the seek ceiling is in effect.
    pub fn clear_draining(&self) {
        self.draining.store(false, Ordering::Release);
    }

    /// Reset for a fresh session: normal ceiling, not draining.
    pub fn reset(&self) {
        self.restore();
        self.draining.store(false, Ordering::Release);
    }
}
