#![allow(dead_code)] // each test binary uses a subset of the helpers

//! Scripted decoder boundary for integration tests.
//!
//! The fake decodes a fixed plan: one video frame every `frame_step`
//! seconds up to `end_pts`, optionally preceded by an audio chunk, gated on
//! appended bytes when `bytes_per_frame` is set. Tests observe appends,
//! session creations, native seek calls and audio gating through shared
//! counters on the factory.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc::UnboundedReceiver;

use bridge_traits::{
    AudioChunk, DecoderBoundary, DecoderCaps, DecoderFactory, DecoderFault, OpenError,
    ReadOutcome, VideoFrame,
};
use core_player::PlayerEvent;

#[derive(Clone)]
pub struct FakePlan {
    pub caps: DecoderCaps,
    /// Last video pts served; reads past it after EOF yield end-of-stream.
    pub end_pts: f64,
    /// Seconds between consecutive video frames.
    pub frame_step: f64,
    /// Appended bytes required per decodable frame (0 = never starved).
    pub bytes_per_frame: u64,
    /// Serve one audio chunk before each video frame while audio is
    /// enabled.
    pub with_audio: bool,
    /// Native seek lands at `target + seek_bias` (keyframe approximation).
    pub seek_bias: f64,
    /// `open` always fails with this code.
    pub open_fail_code: Option<i32>,
    /// `seek` always fails with this code.
    pub seek_fail_code: Option<i32>,
    /// `read_frame` fails with this code after that many video frames.
    pub fail_after_frames: Option<(u64, i32)>,
}

impl Default for FakePlan {
    fn default() -> Self {
        Self {
            caps: DecoderCaps::all(),
            end_pts: 5.0,
            frame_step: 1.0,
            bytes_per_frame: 0,
            with_audio: false,
            seek_bias: -2.0,
            open_fail_code: None,
            seek_fail_code: None,
            fail_after_frames: None,
        }
    }
}

/// Factory handing out scripted sessions; shared counters survive session
/// recreation so tests can observe restarts.
pub struct FakeFactory {
    plan: FakePlan,
    pub created: AtomicUsize,
    pub appended: Arc<AtomicU64>,
    pub seek_calls: Arc<AtomicUsize>,
    pub audio_gate_log: Arc<Mutex<Vec<bool>>>,
    pub fail_create: Option<i32>,
}

impl FakeFactory {
    pub fn new(plan: FakePlan) -> Arc<Self> {
        Arc::new(Self {
            plan,
            created: AtomicUsize::new(0),
            appended: Arc::new(AtomicU64::new(0)),
            seek_calls: Arc::new(AtomicUsize::new(0)),
            audio_gate_log: Arc::new(Mutex::new(Vec::new())),
            fail_create: None,
        })
    }

    pub fn failing_create(code: i32) -> Arc<Self> {
        Arc::new(Self {
            plan: FakePlan::default(),
            created: AtomicUsize::new(0),
            appended: Arc::new(AtomicU64::new(0)),
            seek_calls: Arc::new(AtomicUsize::new(0)),
            audio_gate_log: Arc::new(Mutex::new(Vec::new())),
            fail_create: Some(code),
        })
    }

    pub fn sessions_created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn bytes_appended(&self) -> u64 {
        self.appended.load(Ordering::SeqCst)
    }

    pub fn native_seeks(&self) -> usize {
        self.seek_calls.load(Ordering::SeqCst)
    }
}

impl DecoderFactory for FakeFactory {
    fn create(
        &self,
        _initial_capacity_hint: usize,
    ) -> Result<Box<dyn DecoderBoundary>, DecoderFault> {
        if let Some(code) = self.fail_create {
            return Err(DecoderFault::new(code));
        }
        self.created.fetch_add(1, Ordering::SeqCst);
        // Fresh session, fresh append counter.
        self.appended.store(0, Ordering::SeqCst);
        Ok(Box::new(FakeDecoder {
            audio_turn: self.plan.with_audio,
            plan: self.plan.clone(),
            appended: self.appended.clone(),
            seek_calls: self.seek_calls.clone(),
            audio_gate_log: self.audio_gate_log.clone(),
            opened: false,
            eof: false,
            audio_enabled: true,
            pos: 0.0,
            frames_decoded: 0,
        }))
    }
}

pub struct FakeDecoder {
    plan: FakePlan,
    appended: Arc<AtomicU64>,
    seek_calls: Arc<AtomicUsize>,
    audio_gate_log: Arc<Mutex<Vec<bool>>>,
    opened: bool,
    eof: bool,
    audio_enabled: bool,
    pos: f64,
    frames_decoded: u64,
    audio_turn: bool,
}

impl DecoderBoundary for FakeDecoder {
    fn caps(&self) -> DecoderCaps {
        self.plan.caps
    }

    fn append(&mut self, data: &[u8]) -> Result<usize, DecoderFault> {
        self.appended.fetch_add(data.len() as u64, Ordering::SeqCst);
        Ok(data.len())
    }

    fn set_eof(&mut self) {
        self.eof = true;
    }

    fn open(&mut self, _format_hint: Option<&str>) -> Result<(), OpenError> {
        if let Some(code) = self.plan.open_fail_code {
            return Err(OpenError::new(code));
        }
        self.opened = true;
        Ok(())
    }

    fn read_frame(&mut self) -> ReadOutcome {
        if !self.opened {
            return ReadOutcome::NeedData;
        }
        if let Some((limit, code)) = self.plan.fail_after_frames {
            if self.frames_decoded >= limit {
                return ReadOutcome::Failed(code);
            }
        }
        if self.plan.bytes_per_frame > 0 {
            let needed = (self.frames_decoded + 1) * self.plan.bytes_per_frame;
            if self.appended.load(Ordering::SeqCst) < needed {
                return if self.eof {
                    ReadOutcome::EndOfStream
                } else {
                    ReadOutcome::NeedData
                };
            }
        }
        if self.pos > self.plan.end_pts {
            return if self.eof {
                ReadOutcome::EndOfStream
            } else {
                ReadOutcome::NeedData
            };
        }
        if self.plan.with_audio && self.audio_enabled && self.audio_turn {
            self.audio_turn = false;
            return ReadOutcome::Audio(AudioChunk {
                channels: 2,
                sample_rate: 48000,
                pts: self.pos,
                samples: vec![0.0; 256],
            });
        }
        let frame = VideoFrame {
            pts: self.pos,
            width: 640,
            height: 360,
        };
        self.pos += self.plan.frame_step;
        self.frames_decoded += 1;
        self.audio_turn = self.plan.with_audio;
        ReadOutcome::Video(frame)
    }

    fn duration(&self) -> Option<f64> {
        self.opened.then_some(self.plan.end_pts + self.plan.frame_step)
    }

    fn seek(&mut self, seconds: f64) -> Result<(), DecoderFault> {
        self.seek_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(code) = self.plan.seek_fail_code {
            return Err(DecoderFault::new(code));
        }
        self.pos = (seconds + self.plan.seek_bias).max(0.0);
        self.audio_turn = self.plan.with_audio;
        Ok(())
    }

    fn buffered_bytes(&self) -> u64 {
        self.appended
            .load(Ordering::SeqCst)
            .saturating_sub(self.frames_decoded * self.plan.bytes_per_frame)
    }

    fn compact(&mut self) {}

    fn set_audio_enabled(&mut self, enabled: bool) {
        self.audio_enabled = enabled;
        self.audio_gate_log.lock().push(enabled);
    }

    fn set_file_size(&mut self, _bytes: u64) {}

    fn set_buffer_limit(&mut self, _bytes: u64) {}
}

// ============================================================================
// Event helpers
// ============================================================================

/// Receive the next event, panicking if the session goes quiet.
pub async fn next_event(events: &mut UnboundedReceiver<PlayerEvent>) -> PlayerEvent {
    tokio::time::timeout(Duration::from_secs(120), events.recv())
        .await
        .expect("timed out waiting for a player event")
        .expect("event channel closed")
}

/// Drain events until `predicate` matches, returning everything seen
/// including the match.
pub async fn collect_until(
    events: &mut UnboundedReceiver<PlayerEvent>,
    predicate: impl Fn(&PlayerEvent) -> bool,
) -> Vec<PlayerEvent> {
    let mut seen = Vec::new();
    loop {
        let event = next_event(events).await;
        let done = predicate(&event);
        seen.push(event);
        if done {
            return seen;
        }
    }
}

/// Drain events until the given status string is observed.
pub async fn wait_for_status(
    events: &mut UnboundedReceiver<PlayerEvent>,
    status: &str,
) -> Vec<PlayerEvent> {
    collect_until(events, |e| matches!(e, PlayerEvent::Status(s) if s == status)).await
}
