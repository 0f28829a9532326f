//! The playback engine: single active track, command API, serialized state.
//!
//! All four event sources — caller commands, backend status/rate callbacks,
//! sampler ticks and audio-session notifications — are messages on one
//! `mpsc` channel consumed by a single thread, so no two state mutations can
//! race. Backend and sampler messages carry the epoch (load generation) they
//! belong to; messages from a torn-down track are discarded on arrival.

use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use crate::backend::{Backend, BackendEvent};
use crate::config::PlaybackSettings;
use crate::error::PlaybackError;
use crate::nowplaying::{NowPlayingHandle, NowPlayingPublisher};
use crate::session::{AudioSession, SessionEvent, SessionGuard};
use crate::telemetry::TelemetrySink;
use crate::track::Track;

mod state;
mod thread;

pub use state::{PlaybackState, PlaybackStatus, StateHandle};


/// Caller-issued transport commands.
#[derive(Debug)]
pub(crate) enum Command {
    Play(Track),
    TogglePlayPause,
    Seek(Duration),
    SkipForward(u64),
    SkipBackward(u64),
    Stop,
    /// A source string failed URL validation. Recorded as `last_error`
    /// without touching an active track.
    ReportInvalidSource(String),
    Shutdown,
}

/// Everything the engine thread consumes, from all four event sources.
#[derive(Debug)]
pub(crate) enum EngineEvent {
    Command(Command),
    Backend { epoch: u64, event: BackendEvent },
    SamplerTick { epoch: u64 },
    Session(SessionEvent),
}

/// Owns the single active track and is the single write path for playback
/// state. Construct one per process and pass it to whoever needs transport
/// control; every method is fire-and-forget and returns immediately.
pub struct PlaybackEngine {
    tx: Sender<EngineEvent>,
    state: StateHandle,
    publisher: NowPlayingPublisher,
    join: Mutex<Option<JoinHandle<()>>>,
}

impl PlaybackEngine {
    pub fn new(
        backend: Box<dyn Backend>,
        session: Box<dyn AudioSession>,
        telemetry: Arc<dyn TelemetrySink>,
        settings: PlaybackSettings,
    ) -> Self {
        let (tx, rx) = mpsc::channel::<EngineEvent>();
        let state: StateHandle = Arc::new(Mutex::new(PlaybackState::default()));
        let publisher = NowPlayingPublisher::new();

        let join = thread::spawn_engine_thread(
            rx,
            tx.clone(),
            state.clone(),
            publisher.clone(),
            telemetry,
            backend,
            session,
            settings,
        );

        Self {
            tx,
            state,
            publisher,
            join: Mutex::new(Some(join)),
        }
    }

    /// Load and play `source`.
    ///
    /// If `source` is the current track and it is playing, this is a pause
    /// toggle ("tap again to pause"). Otherwise the previous track is fully
    /// torn down first. A string that does not parse as a URL is rejected
    /// synchronously with `InvalidSource` and recorded in `last_error`; an
    /// active track is left untouched in that case.
    pub fn play(&self, source: &str) -> Result<(), PlaybackError> {
        match Track::from_source(source) {
            Ok(track) => {
                self.send(Command::Play(track));
                Ok(())
            }
            Err(e) => {
                self.send(Command::ReportInvalidSource(e.to_string()));
                Err(e)
            }
        }
    }

    /// Flip between playing and paused. No-op when no track is loaded.
    pub fn toggle_play_pause(&self) {
        self.send(Command::TogglePlayPause);
    }

    /// Seek to `to`, clamped to `[0, duration]` once duration is known.
    /// Fire-and-forget; `position` updates when the backend completes the
    /// seek, and the last completion to arrive wins.
    pub fn seek(&self, to: Duration) {
        self.send(Command::Seek(to));
    }

    pub fn skip_forward(&self, seconds: u64) {
        self.send(Command::SkipForward(seconds));
    }

    pub fn skip_backward(&self, seconds: u64) {
        self.send(Command::SkipBackward(seconds));
    }

    /// Release the backend player, reset to `Idle` and clear the external
    /// now-playing display.
    pub fn stop(&self) {
        self.send(Command::Stop);
    }

    /// Handle for host audio-session notifications (interruptions, route
    /// changes). Cloneable and callable from any thread.
    pub fn session_guard(&self) -> SessionGuard {
        SessionGuard::new(self.tx.clone())
    }

    /// Shared handle the remote-control surface reads the projected
    /// now-playing record from.
    pub fn now_playing_handle(&self) -> NowPlayingHandle {
        self.publisher.handle()
    }

    /// Synchronously re-project the current state onto the now-playing
    /// display. Used by remote command handlers so the external surface
    /// reflects a command without waiting for the next sampler tick.
    pub fn republish_now_playing(&self) {
        if let Ok(st) = self.state.lock() {
            self.publisher.publish(&st);
        }
    }

    /// Clone of the full playback record.
    pub fn state_snapshot(&self) -> PlaybackState {
        self.state
            .lock()
            .map(|st| st.clone())
            .unwrap_or_default()
    }

    pub fn is_playing(&self) -> bool {
        self.state.lock().map(|st| st.is_playing()).unwrap_or(false)
    }

    pub fn is_loading(&self) -> bool {
        self.state.lock().map(|st| st.is_loading()).unwrap_or(false)
    }

    pub fn current_time(&self) -> Duration {
        self.state
            .lock()
            .map(|st| st.position)
            .unwrap_or(Duration::ZERO)
    }

    pub fn duration(&self) -> Option<Duration> {
        self.state.lock().ok().and_then(|st| st.duration)
    }

    pub fn error_message(&self) -> Option<String> {
        self.state.lock().ok().and_then(|st| st.last_error.clone())
    }

    /// Stop playback, tear down the engine thread and clear external
    /// surfaces. Idempotent; also runs on drop.
    pub fn shutdown(&self) {
        self.send(Command::Shutdown);
        if let Ok(mut j) = self.join.lock() {
            if let Some(h) = j.take() {
                let _ = h.join();
            }
        }
    }

    fn send(&self, cmd: Command) {
        // A closed channel only happens after shutdown; commands against a
        // dead engine are dropped.
        let _ = self.tx.send(EngineEvent::Command(cmd));
    }
}

impl Drop for PlaybackEngine {
    fn drop(&mut self) {
        self.shutdown();
    }
}
