//! # Presentation Sink
//!
//! The decode pacer hands decoded-frame metadata to a [`VideoSink`]; the
//! sink owns pixel transfer, format conversion and display, all of which are
//! host concerns. The sink is called from the orchestrator worker, never
//! from a real-time context.

use crate::decoder::VideoFrame;
use serde::{Deserialize, Serialize};

/// Presentation path selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    /// CPU copy into a 2D surface.
    Software,
    /// GPU-textured path.
    Accelerated,
}

impl Default for RenderMode {
    fn default() -> Self {
        Self::Software
    }
}

/// Receives frames for display.
pub trait VideoSink: Send {
    /// Present the frame identified by `frame`. Called for every rendered
    /// frame, including low-frequency preview frames during seek
    /// fast-forward.
    fn render(&mut self, frame: &VideoFrame);

    /// Switch the presentation path. Takes effect on the next `render`.
    fn set_mode(&mut self, mode: RenderMode);

    /// Blank the surface (stop / reload).
    fn clear(&mut self);
}

/// A sink that discards frames; useful for headless operation and tests.
#[derive(Debug, Default)]
pub struct NullVideoSink;

impl VideoSink for NullVideoSink {
    fn render(&mut self, _frame: &VideoFrame) {}
    fn set_mode(&mut self, _mode: RenderMode) {}
    fn clear(&mut self) {}
}
