use std::sync::Arc;
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crate::backend::{Backend, BackendEvent, BackendPlayer, BackendStatus, RateSignal};
use crate::config::PlaybackSettings;
use crate::nowplaying::NowPlayingPublisher;
use crate::sampler::PositionSampler;
use crate::session::{AudioSession, RouteChangeReason, SessionEvent};
use crate::telemetry::TelemetrySink;
use crate::track::Track;

use super::state::{PlaybackState, PlaybackStatus, StateHandle};
use super::{Command, EngineEvent};

/// How often the loop wakes without traffic to check the load deadline.
const IDLE_WAKE: Duration = Duration::from_millis(200);

#[allow(clippy::too_many_arguments)]
pub(super) fn spawn_engine_thread(
    rx: Receiver<EngineEvent>,
    tx: Sender<EngineEvent>,
    state: StateHandle,
    publisher: NowPlayingPublisher,
    telemetry: Arc<dyn TelemetrySink>,
    backend: Box<dyn Backend>,
    session: Box<dyn AudioSession>,
    settings: PlaybackSettings,
) -> JoinHandle<()> {
    thread::spawn(move || {
        Runtime {
            rx,
            tx,
            state,
            publisher,
            telemetry,
            backend,
            session,
            settings,
            player: None,
            epoch: 0,
            sampler: None,
            loading_since: None,
            tick: 0,
        }
        .run();
    })
}

struct Runtime {
    rx: Receiver<EngineEvent>,
    /// Handed to backend event sinks and samplers, tagged with the epoch
    /// they were created for.
    tx: Sender<EngineEvent>,
    state: StateHandle,
    publisher: NowPlayingPublisher,
    telemetry: Arc<dyn TelemetrySink>,
    backend: Box<dyn Backend>,
    session: Box<dyn AudioSession>,
    settings: PlaybackSettings,

    /// The single backend player; exclusively owned, replaced wholesale on
    /// every new load.
    player: Option<Box<dyn BackendPlayer>>,
    /// Load generation. Bumped on every teardown so in-flight messages from
    /// old players/samplers identify themselves as stale.
    epoch: u64,
    sampler: Option<PositionSampler>,
    loading_since: Option<Instant>,
    /// Sampler tick parity; the display is republished on every other tick.
    tick: u64,
}

impl Runtime {
    fn run(mut self) {
        loop {
            match self.rx.recv_timeout(IDLE_WAKE) {
                Ok(event) => {
                    if self.handle(event) {
                        break;
                    }
                }
                Err(RecvTimeoutError::Timeout) => self.check_load_deadline(),
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
    }

    /// Returns true when the engine should shut down.
    fn handle(&mut self, event: EngineEvent) -> bool {
        match event {
            EngineEvent::Command(cmd) => return self.handle_command(cmd),
            EngineEvent::Backend { epoch, event } => {
                if epoch != self.epoch {
                    tracing::trace!(epoch, current = self.epoch, "stale backend event dropped");
                    return false;
                }
                self.handle_backend(event);
            }
            EngineEvent::SamplerTick { epoch } => {
                if epoch == self.epoch {
                    self.handle_tick();
                }
            }
            EngineEvent::Session(event) => self.handle_session(event),
        }
        false
    }

    fn handle_command(&mut self, cmd: Command) -> bool {
        match cmd {
            Command::Play(track) => {
                let same_track_playing = self
                    .with_state(|st| {
                        st.is_playing()
                            && st
                                .current_track
                                .as_ref()
                                .is_some_and(|t| t.source_url == track.source_url)
                    })
                    .unwrap_or(false);

                if same_track_playing {
                    // Tap-again-to-pause.
                    if let Some(p) = self.player.as_mut() {
                        p.pause();
                    }
                } else {
                    self.start_load(track);
                }
            }
            Command::TogglePlayPause => self.toggle(),
            Command::Seek(to) => self.do_seek(to),
            Command::SkipForward(secs) => {
                let target = self.position() + Duration::from_secs(secs);
                self.do_seek(target);
            }
            Command::SkipBackward(secs) => {
                let target = self
                    .position()
                    .saturating_sub(Duration::from_secs(secs));
                self.do_seek(target);
            }
            Command::Stop => self.teardown_to_idle(),
            Command::ReportInvalidSource(reason) => {
                tracing::warn!(%reason, "rejected playback source");
                self.with_state(|st| {
                    st.last_error = Some(reason.clone());
                    // An active track keeps playing; only an empty engine
                    // surfaces the failure as its status.
                    if st.current_track.is_none() {
                        st.status = PlaybackStatus::Failed(reason.clone());
                    }
                });
                self.publish();
            }
            Command::Shutdown => {
                self.teardown_to_idle();
                return true;
            }
        }
        false
    }

    fn start_load(&mut self, track: Track) {
        tracing::info!(url = %track.source_url, "loading track");

        // Tear down the previous track completely before the new one can
        // produce any event: bump the epoch, then drop sampler and player.
        self.epoch += 1;
        self.sampler = None;
        self.player = None;
        self.tick = 0;
        self.loading_since = Some(Instant::now());

        self.with_state(|st| st.reset_for_load(track.clone()));
        self.publish();

        self.activate_session();

        let sink = self.event_sink();
        self.player = Some(self.backend.open(&track, sink));
    }

    fn toggle(&mut self) {
        if self.player.is_none() {
            return;
        }
        let status = match self.with_state(|st| st.status.clone()) {
            Some(s) => s,
            None => return,
        };

        match status {
            PlaybackStatus::Playing => {
                if let Some(p) = self.player.as_mut() {
                    p.pause();
                }
            }
            PlaybackStatus::Paused | PlaybackStatus::Ready => {
                self.activate_session();
                if let Some(p) = self.player.as_mut() {
                    p.play();
                }
            }
            _ => {}
        }
    }

    fn do_seek(&mut self, target: Duration) {
        if self.player.is_none() {
            return;
        }
        let Some((from, clamped)) =
            self.with_state(|st| (st.position, st.clamp_target(target)))
        else {
            return;
        };

        self.telemetry.seeked(from, clamped);
        if let Some(p) = self.player.as_mut() {
            p.seek(clamped);
        }
    }

    fn handle_backend(&mut self, event: BackendEvent) {
        match event {
            BackendEvent::Status(BackendStatus::Unknown) => {}
            BackendEvent::Status(BackendStatus::ReadyToPlay { duration }) => {
                self.loading_since = None;
                self.with_state(|st| st.mark_ready(duration));
                self.publish();

                self.sampler = Some(PositionSampler::start(
                    self.tx.clone(),
                    self.epoch,
                    Duration::from_millis(self.settings.sampler_interval_ms),
                ));

                // `play()` means play: start rendering as soon as the
                // backend is ready.
                if let Some(p) = self.player.as_mut() {
                    p.play();
                }
            }
            BackendEvent::Status(BackendStatus::Failed(reason)) => self.fail(&reason),
            BackendEvent::Rate(RateSignal::Playing) => {
                self.loading_since = None;
                let (url, duration) = match self.with_state(|st| {
                    st.status = PlaybackStatus::Playing;
                    (
                        st.current_track.as_ref().map(|t| t.source_url.clone()),
                        st.duration,
                    )
                }) {
                    Some(v) => v,
                    None => return,
                };
                if let Some(url) = url {
                    self.telemetry.played(&url, duration);
                }
                self.publish();
            }
            BackendEvent::Rate(RateSignal::Paused) => {
                let snapshot = self.with_state(|st| {
                    if st.current_track.is_some() {
                        st.status = PlaybackStatus::Paused;
                    }
                    (st.position, st.duration)
                });
                if let Some((position, duration)) = snapshot {
                    self.telemetry.paused(position, duration);
                }
                self.publish();
            }
            BackendEvent::Rate(RateSignal::WaitingToPlay { error: Some(reason) }) => {
                self.fail(&reason);
            }
            BackendEvent::Rate(RateSignal::WaitingToPlay { error: None }) => {
                // Plain buffering: back to Loading until the backend makes
                // up its mind. The load deadline restarts with it.
                self.loading_since = Some(Instant::now());
                self.with_state(|st| {
                    if st.current_track.is_some() {
                        st.status = PlaybackStatus::Loading;
                    }
                });
                self.publish();
            }
            BackendEvent::SeekDone { position } => {
                self.with_state(|st| st.set_position(position));
                self.publish();
            }
        }
    }

    fn handle_tick(&mut self) {
        let playing_with_duration = self
            .with_state(|st| {
                st.is_playing() && st.duration.is_some_and(|d| !d.is_zero())
            })
            .unwrap_or(false);
        // Samples are discarded while the duration is unknown; a 0/0
        // progress report helps nobody.
        if !playing_with_duration {
            return;
        }

        let position = self.position();
        self.with_state(|st| st.set_position(position));

        self.tick += 1;
        if self.tick % 2 == 0 {
            self.publish();
        }
    }

    fn handle_session(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::InterruptionBegan => {
                // Idempotent: only a playing engine has anything to pause.
                if self.with_state(|st| st.is_playing()).unwrap_or(false) {
                    tracing::info!("audio interrupted; pausing");
                    if let Some(p) = self.player.as_mut() {
                        p.pause();
                    }
                }
            }
            SessionEvent::InterruptionEnded { should_resume } => {
                let paused = self
                    .with_state(|st| st.status == PlaybackStatus::Paused)
                    .unwrap_or(false);
                if should_resume && paused && self.player.is_some() {
                    tracing::info!("interruption ended; resuming");
                    self.activate_session();
                    if let Some(p) = self.player.as_mut() {
                        p.play();
                    }
                }
            }
            SessionEvent::RouteChanged(RouteChangeReason::OldDeviceUnavailable) => {
                // Headphones unplugged: never continue aloud on the fallback
                // route.
                if self.with_state(|st| st.is_playing()).unwrap_or(false) {
                    tracing::info!("audio route lost; pausing");
                    if let Some(p) = self.player.as_mut() {
                        p.pause();
                    }
                }
            }
            SessionEvent::RouteChanged(reason) => {
                tracing::debug!(?reason, "route change without playback policy");
            }
        }
    }

    fn check_load_deadline(&mut self) {
        let timeout_ms = self.settings.load_timeout_ms;
        if timeout_ms == 0 {
            return;
        }
        let expired = self
            .loading_since
            .is_some_and(|since| since.elapsed() >= Duration::from_millis(timeout_ms));
        let loading = self.with_state(|st| st.is_loading()).unwrap_or(false);
        if expired && loading {
            self.fail("load timed out");
        }
    }

    fn fail(&mut self, reason: &str) {
        tracing::warn!(%reason, "playback failed");
        self.sampler = None;
        self.player = None;
        self.loading_since = None;
        self.with_state(|st| st.mark_failed(reason));
        self.publish();
    }

    /// `stop()` semantics: back to a blank Idle record, external display
    /// cleared, every per-track resource released.
    fn teardown_to_idle(&mut self) {
        self.epoch += 1;
        self.sampler = None;
        self.player = None;
        self.loading_since = None;
        self.tick = 0;
        self.with_state(|st| *st = PlaybackState::default());
        self.publisher.clear();
    }

    fn activate_session(&mut self) {
        if let Err(e) = self.session.activate() {
            // Non-fatal: the backend's own status callback reports it if the
            // session truly cannot be used.
            tracing::warn!("audio session activation failed: {e}");
        }
    }

    fn event_sink(&self) -> crate::backend::BackendEventSink {
        let tx = self.tx.clone();
        let epoch = self.epoch;
        Arc::new(move |event| {
            let _ = tx.send(EngineEvent::Backend { epoch, event });
        })
    }

    fn position(&self) -> Duration {
        self.player
            .as_ref()
            .map(|p| p.position())
            .unwrap_or_else(|| {
                self.state
                    .lock()
                    .map(|st| st.position)
                    .unwrap_or(Duration::ZERO)
            })
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut PlaybackState) -> R) -> Option<R> {
        self.state.lock().ok().map(|mut st| f(&mut st))
    }

    fn publish(&self) {
        if let Ok(st) = self.state.lock() {
            self.publisher.publish(&st);
        }
    }
}
