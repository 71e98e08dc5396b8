//! # Foreign Boundary Traits
//!
//! Contracts between the playback core and the external collaborators it
//! orchestrates but does not implement.
//!
//! ## Overview
//!
//! This crate defines the seams around the streaming decode core. Each trait
//! represents a capability the core requires but that lives outside it:
//!
//! - [`DecoderBoundary`](decoder::DecoderBoundary) - the demuxer/codec engine
//!   reached through a foreign call interface (byte ingestion, frame pull,
//!   timestamp queries, seek primitives)
//! - [`DecoderFactory`](decoder::DecoderFactory) - creates decode sessions
//! - [`ChunkSource`](source::ChunkSource) - a cancellable producer of byte
//!   chunks (local file, network body, in-memory buffer)
//! - [`VideoSink`](video::VideoSink) - the presentation surface receiving
//!   decoded-frame metadata (pixel transfer is the host's concern)
//!
//! ## Capability Resolution
//!
//! Optional decoder operations are not probed dynamically at call sites.
//! Instead each boundary implementation reports a [`DecoderCaps`]
//! (decoder::DecoderCaps) descriptor once at initialization; the seek
//! coordinator and buffer governor consult the typed set of supported
//! operations.
//!
//! ## Error Handling
//!
//! Boundary failures keep their raw foreign error codes ([`DecoderFault`]
//! (decoder::DecoderFault), [`OpenError`](decoder::OpenError)) so the core
//! can deduplicate log output per distinct code; source failures use
//! [`SourceError`](source::SourceError).

pub mod decoder;
pub mod source;
pub mod video;

pub use decoder::{
    AudioChunk, DecoderBoundary, DecoderCaps, DecoderFactory, DecoderFault, OpenError,
    ReadOutcome, VideoFrame,
};
pub use source::{ChunkSource, SourceError};
pub use video::{NullVideoSink, RenderMode, VideoSink};
