//! # Player Session Usage Example
//!
//! Demonstrates driving a playback session end to end against a synthetic
//! decoder boundary: load an in-memory source, watch events flow, seek,
//! change speed, and feed decoded audio through the ring-buffer pipeline.
//!
//! Run with: `cargo run --example player_demo --package core-player`

use std::sync::Arc;

use bridge_traits::{
    AudioChunk, DecoderBoundary, DecoderCaps, DecoderFactory, DecoderFault, NullVideoSink,
    OpenError, ReadOutcome, VideoFrame,
};
use bytes::Bytes;
use core_player::logging::{init_logging, LogFormat};
use core_player::{
    spawn_player, AudioMessage, AudioPipeline, Command, PlayerConfig, PlayerEvent, SourceSpec,
};

// ============================================================================
// Synthetic Decoder Boundary (for demonstration)
// ============================================================================

/// Serves 24 video frames per second with a 440 Hz tone, once 64 KiB of
/// "container" bytes have been appended.
struct ToneDecoder {
    appended: u64,
    opened: bool,
    eof: bool,
    audio_enabled: bool,
    pos: f64,
    emit_audio: bool,
}

const FRAME_STEP: f64 = 1.0 / 24.0;
const CLIP_SECONDS: f64 = 3.0;

impl DecoderBoundary for ToneDecoder {
    fn caps(&self) -> DecoderCaps {
        DecoderCaps::all()
    }

    fn append(&mut self, data: &[u8]) -> Result<usize, DecoderFault> {
        self.appended += data.len() as u64;
        Ok(data.len())
    }

    fn set_eof(&mut self) {
        self.eof = true;
    }

    fn open(&mut self, _format_hint: Option<&str>) -> Result<(), OpenError> {
        if self.appended < 64 * 1024 && !self.eof {
            return Err(OpenError::new(-11));
        }
        self.opened = true;
        Ok(())
    }

    fn read_frame(&mut self) -> ReadOutcome {
        if !self.opened {
            return ReadOutcome::NeedData;
        }
        if self.pos >= CLIP_SECONDS {
            return if self.eof {
                ReadOutcome::EndOfStream
            } else {
                ReadOutcome::NeedData
            };
        }
        if self.emit_audio && self.audio_enabled {
            self.emit_audio = false;
            let sample_rate = 48000u32;
            let frames = (sample_rate as f64 * FRAME_STEP) as usize;
            let mut samples = Vec::with_capacity(frames * 2);
            for i in 0..frames {
                let t = self.pos + i as f64 / sample_rate as f64;
                let value = (2.0 * std::f64::consts::PI * 440.0 * t).sin() as f32 * 0.3;
                samples.push(value);
                samples.push(value);
            }
            return ReadOutcome::Audio(AudioChunk {
                channels: 2,
                sample_rate,
                pts: self.pos,
                samples,
            });
        }
        let frame = VideoFrame {
            pts: self.pos,
            width: 1280,
            height: 720,
        };
        self.pos += FRAME_STEP;
        self.emit_audio = true;
        ReadOutcome::Video(frame)
    }

    fn duration(&self) -> Option<f64> {
        self.opened.then_some(CLIP_SECONDS)
    }

    fn seek(&mut self, seconds: f64) -> Result<(), DecoderFault> {
        // Land on the previous "keyframe" half a second back.
        self.pos = (seconds - 0.5).max(0.0);
        self.emit_audio = true;
        Ok(())
    }

    fn buffered_bytes(&self) -> u64 {
        self.appended
    }

    fn compact(&mut self) {}

    fn set_audio_enabled(&mut self, enabled: bool) {
        self.audio_enabled = enabled;
    }

    fn set_file_size(&mut self, _bytes: u64) {}

    fn set_buffer_limit(&mut self, _bytes: u64) {}
}

struct ToneFactory;

impl DecoderFactory for ToneFactory {
    fn create(
        &self,
        _initial_capacity_hint: usize,
    ) -> Result<Box<dyn DecoderBoundary>, DecoderFault> {
        Ok(Box::new(ToneDecoder {
            appended: 0,
            opened: false,
            eof: false,
            audio_enabled: true,
            pos: 0.0,
            emit_audio: true,
        }))
    }
}

// ============================================================================
// Demo
// ============================================================================

#[tokio::main]
async fn main() -> core_player::Result<()> {
    init_logging(LogFormat::Compact)?;

    println!("=== Player Session Demo ===\n");

    let mut handle = spawn_player(
        Arc::new(ToneFactory),
        Box::new(NullVideoSink),
        PlayerConfig::default(),
    )?;

    // A fake 256 KiB "container".
    let source = SourceSpec::Memory(Bytes::from(vec![0u8; 256 * 1024]));
    handle
        .commands
        .send(Command::Load {
            source,
            format_hint: Some("webm".into()),
            buffer_bytes: None,
        })
        .map_err(|e| core_player::PlayerError::Internal(e.to_string()))?;

    // Host-side audio pipeline: push decoded chunks, pull render quanta.
    let mut audio = AudioPipeline::new(48000);
    let mut render_quantum = [0.0f32; 256];
    let mut seeked = false;

    while let Some(event) = handle.events.recv().await {
        match event {
            PlayerEvent::Ready => println!("[event] ready"),
            PlayerEvent::Status(status) => println!("[status] {status}"),
            PlayerEvent::Log(line) => println!("[log] {line}"),
            PlayerEvent::Resolution { width, height } => {
                println!("[video] {width}x{height}");
            }
            PlayerEvent::Audio(chunk) => {
                audio.handle(AudioMessage::Config {
                    channels: chunk.channels,
                });
                audio.handle(AudioMessage::Push {
                    samples: chunk.samples,
                });
                if let Some(status) = audio.render(&mut render_quantum) {
                    println!(
                        "[audio] {} / {} samples buffered",
                        status.available, status.capacity
                    );
                }
            }
            PlayerEvent::AudioClear => audio.handle(AudioMessage::Clear),
            PlayerEvent::Stats(stats) => {
                println!(
                    "[stats] pts={:.2}s frames={} bytes={} seeking={}",
                    stats.pts, stats.frames, stats.bytes, stats.seeking
                );
                // Halfway through, jump near the end once.
                if !seeked && stats.pts >= 1.0 {
                    seeked = true;
                    let _ = handle.commands.send(Command::SetSpeed { speed: 1.5 });
                    let _ = handle.commands.send(Command::Seek { seconds: 2.5 });
                }
            }
            PlayerEvent::SeekInfo { enabled, .. } => {
                println!("[seek] available: {enabled}");
            }
            PlayerEvent::Ended => {
                println!("\n=== Playback ended ===");
                break;
            }
        }
    }

    Ok(())
}
