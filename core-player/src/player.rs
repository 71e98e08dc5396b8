//! # Playback Session Worker
//!
//! One spawned task owns a [`PlayerSession`] and serializes everything:
//! commands from the host, decode-pacer ticks and data-arrival wakeups all
//! flow through a single `select!` loop. The ingestion pump is the only
//! other task, and it touches the session exclusively through
//! [`SharedState`] (decoder slot, governor, tokens, stats).
//!
//! ## Lock Discipline
//!
//! The decoder lock is acquired before the stats or ingest locks, never the
//! reverse, and is never held across an await. The pump re-checks its
//! stream token *under* the decoder lock before appending, so a stale pump
//! can never feed bytes into a session created after its cancellation.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Notify};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use bridge_traits::{ChunkSource, DecoderBoundary, DecoderFactory, SourceError, VideoSink};

use crate::config::PlayerConfig;
use crate::error::{PlayerError, Result};
use crate::events::{Command, EventSender, PlaybackStats, PlayerEvent, SourceSpec};
use crate::governor::BufferGovernor;
use crate::ingest::{self, IngestState};
use crate::pacer::PlaybackClock;
use crate::seek::SeekState;
use crate::source::{FileChunkSource, MemoryChunkSource};
use crate::tokens::TokenCell;

#[cfg(feature = "http-streaming")]
use crate::source::HttpChunkSource;

// ============================================================================
// Shared State
// ============================================================================

/// State reachable from both the worker and the ingestion pump.
pub(crate) struct SharedState {
    pub(crate) config: PlayerConfig,
    /// The live decode session, if any. `None` between loads.
    pub(crate) decoder: Mutex<Option<Box<dyn DecoderBoundary>>>,
    pub(crate) governor: BufferGovernor,
    /// Invalidates ingestion only.
    pub(crate) stream_token: TokenCell,
    /// Invalidates the whole session.
    pub(crate) session_token: TokenCell,
    pub(crate) playing: AtomicBool,
    pub(crate) opened: AtomicBool,
    /// Set by the pacer when the boundary is starved; the pump notifies
    /// `data_ready` on the next append while it is set.
    pub(crate) waiting_for_data: AtomicBool,
    pub(crate) stats: Mutex<PlaybackStats>,
    pub(crate) ingest: Mutex<IngestState>,
    /// Wakes the worker when buffered input changed state (bytes arrived
    /// while starved, container opened, source drained).
    pub(crate) data_ready: Notify,
    pub(crate) events: EventSender,
}

impl SharedState {
    fn new(config: PlayerConfig, events: EventSender) -> Self {
        Self {
            governor: BufferGovernor::new(&config),
            config,
            decoder: Mutex::new(None),
            stream_token: TokenCell::new(),
            session_token: TokenCell::new(),
            playing: AtomicBool::new(false),
            opened: AtomicBool::new(false),
            waiting_for_data: AtomicBool::new(false),
            stats: Mutex::new(PlaybackStats::default()),
            ingest: Mutex::new(IngestState::default()),
            data_ready: Notify::new(),
            events,
        }
    }

    pub(crate) fn is_playing(&self) -> bool {
        self.playing.load(Ordering::Acquire)
    }

    pub(crate) fn is_opened(&self) -> bool {
        self.opened.load(Ordering::Acquire)
    }

    /// Snapshot current stats and emit them.
    pub(crate) fn emit_stats(&self, force: bool) {
        let snapshot = *self.stats.lock();
        self.events.stats(snapshot, force);
    }

    /// Apply an error's classification to the session: terminal errors
    /// stop playback and emit the final accounting before `Ended`; any
    /// other error leaves the session in its current state.
    pub(crate) fn fail_session(&self, err: &PlayerError, status: &str) {
        if !err.is_terminal() {
            return;
        }
        self.playing.store(false, Ordering::Release);
        self.events.status(status);
        self.emit_stats(true);
        self.events.emit(PlayerEvent::Ended);
    }

    /// Gate audio decode output, when the boundary supports it.
    pub(crate) fn set_audio_enabled(&self, enabled: bool) {
        let mut guard = self.decoder.lock();
        if let Some(decoder) = guard.as_mut() {
            if decoder.caps().set_audio_enabled {
                decoder.set_audio_enabled(enabled);
            }
        }
    }
}

/// Construct a [`ChunkSource`] for a source spec.
pub(crate) async fn open_source(
    spec: &SourceSpec,
) -> std::result::Result<Box<dyn ChunkSource>, SourceError> {
    match spec {
        SourceSpec::File(path) => Ok(Box::new(FileChunkSource::open(path).await?)),
        SourceSpec::Memory(data) => Ok(Box::new(MemoryChunkSource::new(data.clone()))),
        #[cfg(feature = "http-streaming")]
        SourceSpec::Http(url) => Ok(Box::new(HttpChunkSource::connect(url).await?)),
    }
}

// ============================================================================
// Session
// ============================================================================

/// A running playback session: handles for commands, events and the worker.
pub struct PlayerHandle {
    /// Send control messages here.
    pub commands: mpsc::UnboundedSender<Command>,
    /// Session notifications arrive here.
    pub events: mpsc::UnboundedReceiver<PlayerEvent>,
    /// The worker task. Finishes once the command sender is dropped.
    pub worker: JoinHandle<()>,
}

/// Validate `config` and spawn a session worker.
///
/// # Errors
///
/// [`PlayerError::InvalidConfig`](crate::error::PlayerError::InvalidConfig)
/// when the configuration fails validation.
pub fn spawn_player(
    factory: Arc<dyn DecoderFactory>,
    video: Box<dyn VideoSink>,
    config: PlayerConfig,
) -> Result<PlayerHandle> {
    config.validate()?;
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
    let (evt_tx, evt_rx) = mpsc::unbounded_channel();
    let events = EventSender::new(evt_tx, config.stats_interval);
    let session = PlayerSession::new(factory, video, config, events);
    let worker = tokio::spawn(session.run(cmd_rx));
    Ok(PlayerHandle {
        commands: cmd_tx,
        events: evt_rx,
        worker,
    })
}

/// Worker-owned session state.
pub(crate) struct PlayerSession {
    pub(crate) shared: Arc<SharedState>,
    pub(crate) factory: Arc<dyn DecoderFactory>,
    pub(crate) video: Box<dyn VideoSink>,
    pub(crate) clock: PlaybackClock,
    pub(crate) seek: SeekState,
    pub(crate) source_spec: Option<SourceSpec>,
    pub(crate) resolution: Option<(u32, u32)>,
    /// When the next pacer tick fires; `None` while the pacer is idle.
    pub(crate) next_tick: Option<Instant>,
    pub(crate) duration_checked_at: Instant,
}

impl PlayerSession {
    fn new(
        factory: Arc<dyn DecoderFactory>,
        video: Box<dyn VideoSink>,
        config: PlayerConfig,
        events: EventSender,
    ) -> Self {
        Self {
            shared: Arc::new(SharedState::new(config, events)),
            factory,
            video,
            clock: PlaybackClock::new(1.0),
            seek: SeekState::new(false),
            source_spec: None,
            resolution: None,
            next_tick: None,
            duration_checked_at: Instant::now(),
        }
    }

    pub(crate) async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        self.shared.events.emit(PlayerEvent::Ready);
        let shared = self.shared.clone();
        loop {
            let tick_at = self.next_tick;
            tokio::select! {
                cmd = commands.recv() => match cmd {
                    Some(cmd) => self.handle_command(cmd).await,
                    None => {
                        self.reset_playback();
                        break;
                    }
                },
                _ = shared.data_ready.notified() => self.on_data_ready(),
                _ = tokio::time::sleep_until(tick_at.unwrap_or_else(Instant::now)),
                    if tick_at.is_some() =>
                {
                    self.next_tick = None;
                    self.decode_tick();
                }
            }
        }
        tracing::debug!(target: "core_player", "session worker finished");
    }

    async fn handle_command(&mut self, command: Command) {
        match command {
            Command::Load {
                source,
                format_hint,
                buffer_bytes,
            } => self.load(source, format_hint, buffer_bytes).await,
            Command::Play => self.play(),
            Command::Pause => self.pause(),
            Command::Stop => self.reset_playback(),
            Command::Seek { seconds } => self.perform_seek(seconds).await,
            Command::SetSpeed { speed } => self.set_speed(speed),
            Command::SetRenderMode { mode } => self.video.set_mode(mode),
        }
    }

    /// The pump signaled a buffering state change.
    fn on_data_ready(&mut self) {
        if !self.shared.is_playing() || !self.shared.is_opened() {
            return;
        }
        // Wake the pacer early out of a starved-retry wait, or start it if
        // it is idle (container just opened).
        if self.shared.waiting_for_data.swap(false, Ordering::AcqRel) || self.next_tick.is_none() {
            self.schedule_now();
        }
    }

    // ------------------------------------------------------------------
    // Command handlers
    // ------------------------------------------------------------------

    async fn load(
        &mut self,
        source: SourceSpec,
        format_hint: Option<String>,
        buffer_bytes: Option<usize>,
    ) {
        self.reset_playback();
        let shared = self.shared.clone();
        shared.events.log(format!("Loading {}.", source.describe()));

        self.seek = SeekState::new(source.is_restartable());
        let reason = (!self.seek.enabled).then(|| "source cannot be re-read".to_string());
        shared.events.emit(PlayerEvent::SeekInfo {
            enabled: self.seek.enabled,
            reason,
        });

        // Open the source before allocating a decode session so a bad path
        // or URL fails cheaply.
        let chunk_source = match open_source(&source).await {
            Ok(s) => s,
            Err(e) => {
                // Nothing was started yet, so this is not terminal: stay
                // ready for the next load.
                let err = PlayerError::SourceOpen(e.to_string());
                shared.events.log(format!("{err}."));
                shared.events.status("Ready");
                return;
            }
        };
        let source_len = chunk_source.len_hint();

        let capacity = buffer_bytes
            .filter(|b| *b > 0)
            .unwrap_or(shared.config.default_capacity_hint);
        let mut decoder = match self.factory.create(capacity) {
            Ok(d) => d,
            Err(fault) => {
                let err = PlayerError::DecoderAllocation(fault.code);
                shared.events.log(format!("{err}."));
                shared.fail_session(&err, "Error");
                return;
            }
        };
        let caps = decoder.caps();
        if caps.set_buffer_limit {
            decoder.set_buffer_limit(shared.config.decoder_buffer_limit);
        }
        if caps.set_file_size {
            if let Some(len) = source_len {
                decoder.set_file_size(len);
            }
        }
        *shared.decoder.lock() = Some(decoder);

        {
            let mut ingest = shared.ingest.lock();
            ingest.reset();
            ingest.format_hint = format_hint;
            ingest.source_len = source_len;
        }

        self.source_spec = Some(source);
        shared.playing.store(true, Ordering::Release);
        shared.emit_stats(true);

        let token = shared.stream_token.bump();
        tokio::spawn(ingest::run_pump(shared.clone(), chunk_source, token));
        // The pacer starts once the pump opens the container.
    }

    fn play(&mut self) {
        if self.source_spec.is_none() {
            self.shared
                .events
                .log(format!("Play ignored: {}.", PlayerError::NoSession));
            return;
        }
        self.shared.playing.store(true, Ordering::Release);
        self.shared.events.status("Playing");
        if self.shared.is_opened() && self.next_tick.is_none() {
            self.schedule_now();
        }
    }

    fn pause(&mut self) {
        if self.source_spec.is_none() {
            return;
        }
        self.shared.playing.store(false, Ordering::Release);
        self.next_tick = None;
        // Re-anchor on resume rather than racing to catch up.
        self.clock.reset();
        self.shared.events.status("Paused");
    }

    fn set_speed(&mut self, speed: f64) {
        let clamped = self.shared.config.clamp_speed(speed);
        let current_pts = self.shared.stats.lock().pts;
        self.clock.set_speed(clamped, current_pts);
        self.shared
            .events
            .log(format!("Playback speed set to {clamped:.2}x."));
    }

    /// Tear everything down and return to the ready state. Also the first
    /// step of a reload.
    pub(crate) fn reset_playback(&mut self) {
        let shared = &self.shared;
        shared.session_token.bump();
        shared.stream_token.bump();
        shared.playing.store(false, Ordering::Release);
        shared.opened.store(false, Ordering::Release);
        shared.waiting_for_data.store(false, Ordering::Release);
        self.next_tick = None;
        *shared.decoder.lock() = None;
        shared.governor.reset();
        *shared.stats.lock() = PlaybackStats::default();
        shared.ingest.lock().reset();
        self.clock.reset();
        self.seek = SeekState::new(false);
        self.resolution = None;
        self.source_spec = None;
        self.video.clear();
        shared.events.emit(PlayerEvent::AudioClear);
        shared.emit_stats(true);
        shared.events.status("Ready");
    }
}
