//! # Chunked Byte Sources
//!
//! A [`ChunkSource`] produces the encoded container bytes the ingestion pump
//! feeds into the decoder boundary. Sources are pull-based and cancellable:
//! the pump stops calling `next_chunk` once its stream token goes stale, and
//! dropping the source releases any underlying file handle or connection.

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

/// Errors produced while reading from a byte source.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Underlying I/O failure (file read, disk error).
    #[error("source I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Network transport failure or non-success HTTP status.
    #[error("source transport error: {0}")]
    Transport(String),

    /// The read was aborted by cancellation.
    #[error("source read aborted")]
    Aborted,
}

/// A cancellable producer of encoded byte chunks.
///
/// Chunk sizes are source-determined; the ingestion pump re-slices large
/// chunks before appending. A source is consumed front to back exactly once;
/// restarting ingestion (backward slow seek) constructs a fresh source.
#[async_trait]
pub trait ChunkSource: Send {
    /// Read the next chunk, or `None` on natural exhaustion.
    ///
    /// # Errors
    ///
    /// A [`SourceError`] terminates ingestion for this attempt; the session
    /// stays in its last state.
    async fn next_chunk(&mut self) -> Result<Option<Bytes>, SourceError>;

    /// Total source size in bytes, if known up front.
    ///
    /// Known sizes tune the open-gating threshold and are forwarded to the
    /// boundary via `set_file_size`.
    fn len_hint(&self) -> Option<u64> {
        None
    }
}
