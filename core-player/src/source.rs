//! # Byte Source Implementations
//!
//! [`ChunkSource`] implementations for local files, in-memory buffers and
//! (behind the `http-streaming` feature) progressive HTTP downloads.

use async_trait::async_trait;
use bridge_traits::{ChunkSource, SourceError};
use bytes::{Bytes, BytesMut};
use tokio::fs::File;
use tokio::io::AsyncReadExt;

/// Read size for file sources. The ingestion pump re-slices before
/// appending, so this only shapes I/O granularity.
const FILE_READ_BYTES: usize = 256 * 1024;

// ============================================================================
// File
// ============================================================================

/// Streams a local file front to back.
pub struct FileChunkSource {
    file: File,
    len: u64,
}

impl FileChunkSource {
    /// Open `path` and capture its length.
    ///
    /// # Errors
    ///
    /// [`SourceError::Io`] when the file cannot be opened or stat'd.
    pub async fn open(path: &std::path::Path) -> Result<Self, SourceError> {
        let file = File::open(path).await?;
        let len = file.metadata().await?.len();
        Ok(Self { file, len })
    }
}

#[async_trait]
impl ChunkSource for FileChunkSource {
    async fn next_chunk(&mut self) -> Result<Option<Bytes>, SourceError> {
        let mut buf = BytesMut::zeroed(FILE_READ_BYTES);
        let n = self.file.read(&mut buf).await?;
        if n == 0 {
            return Ok(None);
        }
        buf.truncate(n);
        Ok(Some(buf.freeze()))
    }

    fn len_hint(&self) -> Option<u64> {
        Some(self.len)
    }
}

// ============================================================================
// Memory
// ============================================================================

/// Streams an in-memory buffer. Slicing is zero-copy.
pub struct MemoryChunkSource {
    data: Bytes,
    offset: usize,
}

impl MemoryChunkSource {
    pub fn new(data: Bytes) -> Self {
        Self { data, offset: 0 }
    }
}

#[async_trait]
impl ChunkSource for MemoryChunkSource {
    async fn next_chunk(&mut self) -> Result<Option<Bytes>, SourceError> {
        if self.offset >= self.data.len() {
            return Ok(None);
        }
        let end = (self.offset + FILE_READ_BYTES).min(self.data.len());
        let chunk = self.data.slice(self.offset..end);
        self.offset = end;
        Ok(Some(chunk))
    }

    fn len_hint(&self) -> Option<u64> {
        Some(self.data.len() as u64)
    }
}

// ============================================================================
// HTTP
// ============================================================================

/// Streams an HTTP(S) response body progressively.
///
/// Chunk sizes are transport-determined. The source is not restartable, so
/// backward seeks are unavailable for it.
#[cfg(feature = "http-streaming")]
pub struct HttpChunkSource {
    stream: std::pin::Pin<
        Box<dyn futures::Stream<Item = reqwest::Result<Bytes>> + Send>,
    >,
    len: Option<u64>,
}

#[cfg(feature = "http-streaming")]
impl HttpChunkSource {
    /// Issue the GET and begin streaming the body.
    ///
    /// # Errors
    ///
    /// [`SourceError::Transport`] on connect failure or a non-success
    /// status.
    pub async fn connect(url: &str) -> Result<Self, SourceError> {
        let response = reqwest::get(url)
            .await
            .map_err(|e| SourceError::Transport(e.to_string()))?
            .error_for_status()
            .map_err(|e| SourceError::Transport(e.to_string()))?;
        let len = response.content_length();
        Ok(Self {
            stream: Box::pin(response.bytes_stream()),
            len,
        })
    }
}

#[cfg(feature = "http-streaming")]
#[async_trait]
impl ChunkSource for HttpChunkSource {
    async fn next_chunk(&mut self) -> Result<Option<Bytes>, SourceError> {
        use futures::StreamExt;

        match self.stream.next().await {
            Some(Ok(chunk)) => Ok(Some(chunk)),
            Some(Err(e)) => Err(SourceError::Transport(e.to_string())),
            None => Ok(None),
        }
    }

    fn len_hint(&self) -> Option<u64> {
        self.len
    }
}
