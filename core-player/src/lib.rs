//! # Streaming Decode Orchestrator
//!
//! Platform-agnostic core for progressive media playback: chunked byte
//! ingestion with backpressure, open gating, a self-pacing decode loop,
//! a two-strategy seek coordinator and a cross-thread audio ring buffer.
//! The decoder itself lives behind the
//! [`DecoderBoundary`](bridge_traits::DecoderBoundary) trait; this crate
//! owns every policy decision around it.
//!
//! ## Architecture
//!
//! ```text
//! ChunkSource ──> ingestion pump ──> DecoderBoundary ──> decode pacer
//!                  (backpressure,      (behind lock)       (budgeted ticks,
//!                   open gating)                            pts scheduling)
//!                                                              │
//!                           host events <── Audio / Stats / Resolution
//!                                │
//!                          AudioPipeline (ring buffer, RT render pulls)
//! ```
//!
//! One spawned worker task owns the session; the ingestion pump is the only
//! other task. Cancellation is purely token-based: every long-running
//! activity captures a generation token ([`tokens`]) and abandons itself
//! when the token goes stale. Nothing joins, nothing blocks on teardown.
//!
//! ## Usage
//!
//! ```ignore
//! use core_player::{spawn_player, Command, PlayerConfig, SourceSpec};
//! use bridge_traits::NullVideoSink;
//! use std::sync::Arc;
//!
//! let mut handle = spawn_player(factory, Box::new(NullVideoSink), PlayerConfig::default())?;
//! handle.commands.send(Command::Load {
//!     source: SourceSpec::File("movie.webm".into()),
//!     format_hint: Some("webm".into()),
//!     buffer_bytes: None,
//! })?;
//! while let Some(event) = handle.events.recv().await {
//!     println!("{event:?}");
//! }
//! ```

pub mod audio;
pub mod config;
pub mod error;
pub mod events;
pub mod governor;
pub mod logging;
pub mod ring_buffer;
pub mod source;
pub mod tokens;

mod ingest;
mod pacer;
mod player;
mod seek;

pub use audio::{AudioMessage, AudioPipeline, AudioStatus};
pub use config::PlayerConfig;
pub use error::{PlayerError, Result};
pub use events::{Command, EventSender, PlaybackStats, PlayerEvent, SourceSpec};
pub use player::{spawn_player, PlayerHandle};
pub use ring_buffer::AudioRingBuffer;
