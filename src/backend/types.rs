use std::sync::Arc;
use std::time::Duration;

use crate::track::Track;

/// Load status reported by a backend player, at most once per load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendStatus {
    /// Not yet determined (still opening the stream).
    Unknown,
    /// The stream opened; `duration` is reported when the container knows it.
    ReadyToPlay { duration: Option<Duration> },
    /// The stream could not be opened or died mid-playback. Fatal for this
    /// track.
    Failed(String),
}

/// Rate-control signal: whether audio is actively rendering, paused, or
/// stalled waiting to buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RateSignal {
    Playing,
    Paused,
    /// Stalled. With an attached error the stall is fatal; without one it is
    /// ordinary buffering and the track stays in `Loading`.
    WaitingToPlay { error: Option<String> },
}

/// Everything a backend player reports back to its owner.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendEvent {
    Status(BackendStatus),
    Rate(RateSignal),
    /// An asynchronous seek finished at `position`. When seeks overlap, the
    /// last completion to arrive wins.
    SeekDone { position: Duration },
}

/// Observer callback for backend events. May be invoked from any thread the
/// backend uses internally; implementations marshal onto their own execution
/// context.
pub type BackendEventSink = Arc<dyn Fn(BackendEvent) + Send + Sync>;

/// Factory for backend players, one per `play()` call.
///
/// `open` must not block on the network or the audio device beyond what is
/// needed to kick off loading; readiness and failure arrive through `events`.
pub trait Backend: Send {
    fn open(&mut self, track: &Track, events: BackendEventSink) -> Box<dyn BackendPlayer>;
}

/// One loaded source. Commands are synchronous and cheap; their effects are
/// observed through the event sink handed to `Backend::open`.
pub trait BackendPlayer {
    fn play(&mut self);
    fn pause(&mut self);
    /// Begin an asynchronous seek. Completion is reported via
    /// `BackendEvent::SeekDone`; a seek that never completes simply leaves
    /// the position where it was.
    fn seek(&mut self, to: Duration);
    /// Current playback position as the backend knows it.
    fn position(&self) -> Duration;
}
