use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use super::*;
use crate::backend::{
    Backend, BackendEvent, BackendEventSink, BackendPlayer, BackendStatus, RateSignal,
};
use crate::config::PlaybackSettings;
use crate::session::SystemSession;
use crate::telemetry::LogTelemetry;
use crate::track::Track;

const URL: &str = "https://example.com/show/episode.mp3";

/// Backend that reports readiness as soon as a track is opened and echoes
/// transport calls back as rate/seek events, so a real engine can be driven
/// straight from interface handlers.
struct EchoBackend {
    duration: Duration,
}

struct EchoPlayer {
    sink: BackendEventSink,
    position: Arc<Mutex<Duration>>,
}

impl Backend for EchoBackend {
    fn open(&mut self, _track: &Track, events: BackendEventSink) -> Box<dyn BackendPlayer> {
        events(BackendEvent::Status(BackendStatus::ReadyToPlay {
            duration: Some(self.duration),
        }));
        Box::new(EchoPlayer {
            sink: events,
            position: Arc::new(Mutex::new(Duration::ZERO)),
        })
    }
}

impl BackendPlayer for EchoPlayer {
    fn play(&mut self) {
        (self.sink)(BackendEvent::Rate(RateSignal::Playing));
    }

    fn pause(&mut self) {
        (self.sink)(BackendEvent::Rate(RateSignal::Paused));
    }

    fn seek(&mut self, to: Duration) {
        *self.position.lock().unwrap() = to;
        (self.sink)(BackendEvent::SeekDone { position: to });
    }

    fn position(&self) -> Duration {
        *self.position.lock().unwrap()
    }
}

/// Backend that never reports readiness; tracks opened through it stay in
/// `Loading` forever.
struct SilentBackend;

/// Backend whose every open fails immediately.
struct BrokenBackend;

struct InertPlayer;

impl Backend for SilentBackend {
    fn open(&mut self, _track: &Track, _events: BackendEventSink) -> Box<dyn BackendPlayer> {
        Box::new(InertPlayer)
    }
}

impl Backend for BrokenBackend {
    fn open(&mut self, _track: &Track, events: BackendEventSink) -> Box<dyn BackendPlayer> {
        events(BackendEvent::Status(BackendStatus::Failed(
            "no codec".into(),
        )));
        Box::new(InertPlayer)
    }
}

impl BackendPlayer for InertPlayer {
    fn play(&mut self) {}
    fn pause(&mut self) {}
    fn seek(&mut self, _to: Duration) {}
    fn position(&self) -> Duration {
        Duration::ZERO
    }
}

fn engine_with(backend: Box<dyn Backend>) -> Arc<PlaybackEngine> {
    Arc::new(PlaybackEngine::new(
        backend,
        Box::new(SystemSession),
        Arc::new(LogTelemetry),
        PlaybackSettings::default(),
    ))
}

fn playing_engine() -> Arc<PlaybackEngine> {
    let engine = engine_with(Box::new(EchoBackend {
        duration: Duration::from_secs(600),
    }));
    engine.play(URL).unwrap();
    wait_until("engine playing", || engine.is_playing());
    engine
}

fn player_iface(engine: Arc<PlaybackEngine>) -> PlayerIface {
    let display = engine.now_playing_handle();
    PlayerIface {
        engine,
        display,
        skip_seconds: 15,
    }
}

fn wait_until(what: &str, cond: impl Fn() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(2);
    while !cond() {
        assert!(Instant::now() < deadline, "timed out waiting for {what}");
        thread::sleep(Duration::from_millis(5));
    }
}

#[test]
fn status_label_maps_engine_states_to_mpris_strings() {
    assert_eq!(status_label(&PlaybackStatus::Playing), "Playing");
    assert_eq!(status_label(&PlaybackStatus::Paused), "Paused");
    assert_eq!(status_label(&PlaybackStatus::Ready), "Paused");
    assert_eq!(status_label(&PlaybackStatus::Idle), "Stopped");
    assert_eq!(status_label(&PlaybackStatus::Loading), "Stopped");
    assert_eq!(status_label(&PlaybackStatus::Failed("x".into())), "Stopped");
}

#[test]
fn metadata_map_carries_the_expected_keys() {
    let info = NowPlayingInfo {
        title: "Episode".into(),
        artist: Some("Host".into()),
        album: Some("Show".into()),
        source_url: URL.into(),
        duration: Some(Duration::from_secs(600)),
        position: Duration::from_secs(30),
        rate: 1.0,
        media_type: "podcast",
        art_url: "data:image/png;base64,AAAA".into(),
    };

    let map = metadata_map(Some(&info));
    for key in [
        "mpris:trackid",
        "xesam:title",
        "xesam:artist",
        "xesam:album",
        "xesam:url",
        "mpris:length",
        "mpris:artUrl",
    ] {
        assert!(map.contains_key(key), "missing key: {key}");
    }

    assert!(metadata_map(None).is_empty());
}

#[test]
fn metadata_map_omits_what_the_record_does_not_have() {
    let info = NowPlayingInfo {
        title: "Episode".into(),
        artist: None,
        album: None,
        source_url: URL.into(),
        duration: None,
        position: Duration::ZERO,
        rate: 0.0,
        media_type: "podcast",
        art_url: String::new(),
    };

    let map = metadata_map(Some(&info));
    assert!(map.contains_key("xesam:title"));
    for key in ["xesam:artist", "xesam:album", "mpris:length", "mpris:artUrl"] {
        assert!(!map.contains_key(key), "unexpected key: {key}");
    }
}

#[test]
fn play_is_rejected_while_already_playing() {
    let iface = player_iface(playing_engine());
    assert!(iface.play().is_err());

    iface.pause().unwrap();
    wait_until("paused", || !iface.engine.is_playing());
    iface.play().unwrap();
    wait_until("resumed", || iface.engine.is_playing());
}

#[test]
fn pause_is_rejected_while_not_playing() {
    let engine = playing_engine();
    let iface = player_iface(engine);

    iface.pause().unwrap();
    wait_until("paused", || !iface.engine.is_playing());
    assert!(iface.pause().is_err());
}

#[test]
fn transport_commands_require_a_loaded_track() {
    let iface = player_iface(engine_with(Box::new(EchoBackend {
        duration: Duration::from_secs(1),
    })));

    assert!(iface.play().is_err());
    assert!(iface.play_pause().is_err());
    assert!(iface.seek(1).is_err());
    assert!(
        iface
            .set_position(ObjectPath::try_from(TRACK_ID).unwrap(), 1_000_000)
            .is_err()
    );
}

#[test]
fn play_is_rejected_while_loading_or_failed() {
    let engine = engine_with(Box::new(SilentBackend));
    engine.play(URL).unwrap();
    wait_until("stuck loading", || engine.is_loading());
    let iface = player_iface(engine);
    assert!(iface.play().is_err());
    assert!(iface.play_pause().is_err());
    assert!(iface.pause().is_err());

    let engine = engine_with(Box::new(BrokenBackend));
    engine.play(URL).unwrap();
    wait_until("load failure surfaced", || {
        matches!(
            engine.state_snapshot().status,
            PlaybackStatus::Failed(_)
        )
    });
    let iface = player_iface(engine);
    assert!(iface.play().is_err());
    assert!(iface.play_pause().is_err());
}

#[test]
fn next_and_previous_are_not_supported() {
    let iface = player_iface(playing_engine());
    assert!(iface.next().is_err());
    assert!(iface.previous().is_err());
    assert!(!iface.can_go_next());
    assert!(!iface.can_go_previous());
}

#[test]
fn seek_sign_selects_the_skip_direction() {
    let iface = player_iface(playing_engine());

    iface.seek(1).unwrap();
    wait_until("skipped forward", || {
        iface.engine.current_time() == Duration::from_secs(15)
    });

    iface.seek(-1).unwrap();
    wait_until("skipped back", || {
        iface.engine.current_time() == Duration::ZERO
    });
}

#[test]
fn set_position_scrubs_and_ignores_foreign_track_ids() {
    let iface = player_iface(playing_engine());

    iface
        .set_position(ObjectPath::try_from(TRACK_ID).unwrap(), 42_000_000)
        .unwrap();
    wait_until("scrubbed", || {
        iface.engine.current_time() == Duration::from_secs(42)
    });

    iface
        .set_position(
            ObjectPath::try_from("/org/mpris/MediaPlayer2/track/9").unwrap(),
            0,
        )
        .unwrap();
    thread::sleep(Duration::from_millis(50));
    assert_eq!(iface.engine.current_time(), Duration::from_secs(42));
}

#[test]
fn open_uri_rejects_garbage_and_accepts_urls() {
    let iface = player_iface(playing_engine());
    assert!(iface.open_uri("not a url".into()).is_err());
    iface
        .open_uri("https://example.com/show/other.mp3".into())
        .unwrap();
    wait_until("new track loaded", || {
        iface
            .engine
            .state_snapshot()
            .current_track
            .is_some_and(|t| t.source_url.as_str().ends_with("other.mp3"))
    });
}
