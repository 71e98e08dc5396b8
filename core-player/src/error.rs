//! # Player Error Types
//!
//! Error types for the streaming decode orchestrator.

use thiserror::Error;

/// Errors that can occur while orchestrating a playback session.
#[derive(Error, Debug)]
pub enum PlayerError {
    // ========================================================================
    // Source Errors
    // ========================================================================
    /// Failed to open the byte source (file missing, connect failure).
    #[error("Failed to open source: {0}")]
    SourceOpen(String),

    /// Reading from the byte source failed mid-stream.
    #[error("Source read failed: {0}")]
    SourceRead(String),

    // ========================================================================
    // Boundary Errors
    // ========================================================================
    /// The decoder boundary could not allocate a session.
    #[error("Failed to create decoder context (code {0})")]
    DecoderAllocation(i32),

    /// The boundary rejected appended bytes.
    #[error("Decoder rejected input (code {0})")]
    AppendRejected(i32),

    /// Container open failed.
    #[error("Failed to open container (code {0})")]
    OpenFailed(i32),

    /// Unrecoverable decode failure.
    #[error("Decode failed (code {0})")]
    DecodeFailed(i32),

    // ========================================================================
    // Seek Errors
    // ========================================================================
    /// The boundary cannot seek natively.
    #[error("Native seek not supported")]
    SeekNotSupported,

    /// The boundary's native seek call failed at runtime.
    #[error("Native seek failed (code {0})")]
    SeekFaulted(i32),

    /// Backward seek requested on a source that cannot be re-read.
    #[error("Backward seek requires a restartable source")]
    SeekNotRestartable,

    // ========================================================================
    // Session Errors
    // ========================================================================
    /// Operation requires a loaded session.
    #[error("No session loaded")]
    NoSession,

    /// Configuration rejected by validation.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Internal error (should not occur in normal operation).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PlayerError {
    /// Returns `true` if this error is transient and the operation may
    /// succeed once more input arrives.
    pub fn is_transient(&self) -> bool {
        matches!(self, PlayerError::SourceRead(_))
    }

    /// Returns `true` if this error ends the session.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PlayerError::DecoderAllocation(_)
                | PlayerError::AppendRejected(_)
                | PlayerError::OpenFailed(_)
                | PlayerError::DecodeFailed(_)
        )
    }

    /// Returns `true` if this error should trigger the slow-seek fallback.
    pub fn is_seek_fallback(&self) -> bool {
        matches!(
            self,
            PlayerError::SeekNotSupported | PlayerError::SeekFaulted(_)
        )
    }
}

/// Result type for player operations.
pub type Result<T> = std::result::Result<T, PlayerError>;
