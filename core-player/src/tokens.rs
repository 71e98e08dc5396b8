//! # Generation Tokens
//!
//! The sole cancellation primitive in the orchestrator. A [`TokenCell`]
//! holds a monotonically increasing generation counter; long-running
//! activities (ingestion pump, decode pacer) capture the current [`Token`]
//! when they start and re-check it at every resumption point. Bumping the
//! cell invalidates all outstanding activities at once, with no join or
//! acknowledgement required.
//!
//! Two cells exist per session:
//!
//! - the *stream* token invalidates ingestion only (stop streaming, keep
//!   decoding what is buffered)
//! - the *session* token invalidates everything (reset, reload, restart
//!   seek)

use std::sync::atomic::{AtomicU64, Ordering};

/// A captured generation. Stale once the owning cell is bumped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token(u64);

/// Shared monotonic generation counter.
#[derive(Debug, Default)]
pub struct TokenCell {
    generation: AtomicU64,
}

impl TokenCell {
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture the current generation.
    pub fn current(&self) -> Token {
        Token(self.generation.load(Ordering::Acquire))
    }

    /// Advance the generation, invalidating every previously captured token,
    /// and capture the new one.
    pub fn bump(&self) -> Token {
        Token(self.generation.fetch_add(1, Ordering::AcqRel) + 1)
    }

    /// Whether `token` still names the live generation.
    pub fn is_current(&self, token: Token) -> bool {
        self.generation.load(Ordering::Acquire) == token.0
    }
}
