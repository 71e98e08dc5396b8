//! # Ingestion Pump
//!
//! The spawned task that moves bytes from a [`ChunkSource`] into the
//! decoder boundary. It re-slices oversized chunks, honors the governor's
//! backpressure ceiling between appends, samples the stream header for
//! diagnostics, and attempts to open the container after each append until
//! open gating passes.
//!
//! The pump is cancelled purely by its stream token going stale; it never
//! joins or acknowledges. The token is re-checked under the decoder lock
//! before every append.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use bridge_traits::{ChunkSource, DecoderBoundary};

use crate::error::PlayerError;
use crate::player::SharedState;
use crate::tokens::Token;

/// EBML magic at the front of Matroska/WebM streams.
const EBML_MAGIC: [u8; 4] = [0x1A, 0x45, 0xDF, 0xA3];

/// Pump-side bookkeeping for one ingestion attempt.
#[derive(Debug, Default)]
pub(crate) struct IngestState {
    /// First bytes of the stream, kept for open-failure diagnostics.
    pub(crate) header_sample: Vec<u8>,
    /// Container format name forwarded to `open`.
    pub(crate) format_hint: Option<String>,
    /// Total source size, when the source reports one.
    pub(crate) source_len: Option<u64>,
    /// Code of the most recent open failure that was described in a log.
    pub(crate) last_open_logged: Option<i32>,
}

impl IngestState {
    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }

    /// Partial reset for a seek restart: keep the format hint, drop
    /// per-attempt state.
    pub(crate) fn reset_for_restart(&mut self) {
        self.header_sample.clear();
        self.last_open_logged = None;
    }
}

/// Stream `source` into the live decode session until exhaustion, a source
/// error, an append fault, or token invalidation.
pub(crate) async fn run_pump(
    shared: Arc<SharedState>,
    mut source: Box<dyn ChunkSource>,
    token: Token,
) {
    tracing::debug!(target: "core_player::ingest", "ingestion pump started");
    loop {
        if wait_for_buffer(&shared, token).await.is_err() {
            return;
        }
        let chunk = match source.next_chunk().await {
            Ok(Some(chunk)) => chunk,
            Ok(None) => break,
            Err(e) => {
                if shared.stream_token.is_current(token) {
                    let err = PlayerError::SourceRead(e.to_string());
                    shared.events.log(format!("{err}."));
                    // Transient: the session keeps its last state and
                    // only a fresh load recovers it.
                    shared.fail_session(&err, "Error");
                }
                return;
            }
        };
        if !shared.stream_token.is_current(token) {
            return;
        }

        let max = shared.config.max_chunk_bytes;
        let oversized = chunk.len() > max;
        let mut offset = 0;
        while offset < chunk.len() {
            if wait_for_buffer(&shared, token).await.is_err() {
                return;
            }
            let end = (offset + max).min(chunk.len());
            if !append_slice(&shared, token, &chunk[offset..end]) {
                return;
            }
            offset = end;
            if oversized {
                // Large chunks must not monopolize the executor between
                // appends.
                tokio::task::yield_now().await;
            }
        }
    }

    if !shared.stream_token.is_current(token) {
        return;
    }
    finish_stream(&shared);
}

/// Poll until the boundary's backlog is at or below the ceiling.
///
/// # Errors
///
/// `Err(())` when the token went stale or the session was torn down.
async fn wait_for_buffer(shared: &SharedState, token: Token) -> Result<(), ()> {
    loop {
        if !shared.stream_token.is_current(token) {
            return Err(());
        }
        let backlog = {
            let guard = shared.decoder.lock();
            match guard.as_ref() {
                Some(decoder) if decoder.caps().buffered_bytes => decoder.buffered_bytes(),
                // No backlog reporting means no throttling.
                Some(_) => return Ok(()),
                None => return Err(()),
            }
        };
        if shared.governor.can_append(backlog) {
            return Ok(());
        }
        tokio::time::sleep(shared.config.buffer_poll).await;
    }
}

/// Append one bounded slice. Returns `false` when the pump must stop.
fn append_slice(shared: &SharedState, token: Token, data: &[u8]) -> bool {
    let mut guard = shared.decoder.lock();
    // Token re-check under the lock: a session swapped in after our
    // cancellation can never see these bytes.
    if !shared.stream_token.is_current(token) {
        return false;
    }
    let Some(decoder) = guard.as_mut() else {
        return false;
    };

    capture_header_sample(shared, data);

    if let Err(fault) = decoder.append(data) {
        // Terminal for the session, but only after draining: the boundary
        // may still decode what it already holds.
        let err = PlayerError::AppendRejected(fault.code);
        shared.events.log(format!("{err}. Ending stream."));
        decoder.set_eof();
        shared.governor.note_draining();
        try_open_locked(shared, decoder.as_mut());
        shared.data_ready.notify_one();
        return false;
    }

    {
        let mut stats = shared.stats.lock();
        stats.bytes += data.len() as u64;
    }
    shared.emit_stats(false);
    try_open_locked(shared, decoder.as_mut());
    if shared.waiting_for_data.load(Ordering::Acquire) {
        shared.data_ready.notify_one();
    }
    true
}

/// Natural exhaustion: signal end of input and drain.
fn finish_stream(shared: &SharedState) {
    let mut guard = shared.decoder.lock();
    let Some(decoder) = guard.as_mut() else {
        return;
    };
    decoder.set_eof();
    shared.governor.note_draining();
    shared.events.log("Stream ended. Draining decoder.");
    try_open_locked(shared, decoder.as_mut());
    drop(guard);
    shared.data_ready.notify_one();
}

fn capture_header_sample(shared: &SharedState, data: &[u8]) {
    let mut ingest = shared.ingest.lock();
    let want = shared.config.header_sample_bytes;
    if ingest.header_sample.len() < want {
        let take = (want - ingest.header_sample.len()).min(data.len());
        ingest.header_sample.extend_from_slice(&data[..take]);
    }
}

/// Attempt to open the container. Caller holds the decoder lock.
///
/// Gating: skipped until the open threshold is buffered, unless draining.
/// Failures are logged once per distinct code; a failure while draining is
/// terminal.
pub(crate) fn try_open_locked(shared: &SharedState, decoder: &mut dyn DecoderBoundary) {
    if shared.is_opened() {
        return;
    }

    let draining = shared.governor.is_draining();
    let bytes = shared.stats.lock().bytes;
    let (threshold, hint) = {
        let ingest = shared.ingest.lock();
        (
            shared.config.open_threshold(ingest.source_len),
            ingest.format_hint.clone(),
        )
    };
    if bytes < threshold && !draining {
        return;
    }

    match decoder.open(hint.as_deref()) {
        Ok(()) => {
            shared.opened.store(true, Ordering::Release);
            shared.ingest.lock().last_open_logged = None;
            let duration = decoder.duration().unwrap_or(0.0);
            {
                let mut stats = shared.stats.lock();
                stats.duration = duration;
            }
            shared.events.log("Container opened.");
            if duration <= 0.0 && hints_mp4(hint.as_deref()) {
                shared.events.log(
                    "Duration unavailable; MP4 sources need the moov atom at the front \
                     (faststart) for progressive playback.",
                );
            }
            shared.events.status("Playing");
            shared.emit_stats(true);
            shared.data_ready.notify_one();
        }
        Err(e) => {
            let err = PlayerError::OpenFailed(e.code);
            // The gate above guarantees bytes >= threshold or draining
            // here, so every failure code is worth describing once.
            let (describe, header) = {
                let mut ingest = shared.ingest.lock();
                let describe = ingest.last_open_logged != Some(e.code);
                if describe {
                    ingest.last_open_logged = Some(e.code);
                }
                (describe, ingest.header_sample.clone())
            };

            if describe {
                shared
                    .events
                    .log(describe_open_failure(&err, &header, hint.as_deref()));
            }

            if draining {
                // No more bytes are coming; this session can never open.
                shared
                    .events
                    .log(format!("Container never opened (code {}).", e.code));
                shared.fail_session(&err, "Open failed");
            }
        }
    }
}

fn hints_mp4(hint: Option<&str>) -> bool {
    matches!(hint, Some(h) if h.eq_ignore_ascii_case("mp4") || h.eq_ignore_ascii_case("mov"))
}

fn hints_matroska(hint: Option<&str>) -> bool {
    matches!(
        hint,
        Some(h) if h.eq_ignore_ascii_case("matroska") || h.eq_ignore_ascii_case("webm")
    )
}

fn looks_like_ebml(header: &[u8]) -> bool {
    header.len() >= EBML_MAGIC.len() && header[..EBML_MAGIC.len()] == EBML_MAGIC
}

fn describe_open_failure(err: &PlayerError, header: &[u8], hint: Option<&str>) -> String {
    let mut message = format!("{err}.");
    if hints_matroska(hint) && !looks_like_ebml(header) {
        message.push_str(
            " Input does not begin with an EBML header; ensure the stream starts at byte 0.",
        );
    }
    message
}
