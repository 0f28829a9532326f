//! Remote-control surface: the engine's transport exposed over MPRIS.
//!
//! Handlers validate preconditions against a state snapshot and reject
//! commands that do not apply (`Play` while playing, `Pause` while not,
//! `Next`/`Previous` always) instead of silently ignoring them. Accepted
//! commands are forwarded fire-and-forget and immediately re-project the
//! now-playing record so the desktop surface does not lag a sampler tick
//! behind.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use async_io::{Timer, block_on};
use tracing::{debug, warn};
use zbus::{Connection, fdo, interface};
use zvariant::{ObjectPath, OwnedValue, Value};

use crate::engine::{PlaybackEngine, PlaybackStatus};
use crate::nowplaying::{NowPlayingHandle, NowPlayingInfo};

const BUS_NAME: &str = "org.mpris.MediaPlayer2.podbay";
const OBJECT_PATH: &str = "/org/mpris/MediaPlayer2";
/// Single-track player: one well-known track id for the lifetime of the
/// process.
const TRACK_ID: &str = "/org/mpris/MediaPlayer2/track/0";

#[cfg(test)]
mod tests;

struct RootIface {
    engine: Arc<PlaybackEngine>,
}

#[interface(name = "org.mpris.MediaPlayer2")]
impl RootIface {
    fn raise(&self) {
        // Headless; nothing to raise.
    }

    fn quit(&self) {
        self.engine.stop();
    }

    #[zbus(property)]
    fn can_quit(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn can_raise(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn has_track_list(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn identity(&self) -> &str {
        "podbay"
    }

    #[zbus(property)]
    fn supported_uri_schemes(&self) -> Vec<String> {
        vec!["http".into(), "https".into(), "file".into()]
    }

    #[zbus(property)]
    fn supported_mime_types(&self) -> Vec<String> {
        vec!["audio/mpeg".into(), "audio/flac".into(), "audio/ogg".into()]
    }
}

struct PlayerIface {
    engine: Arc<PlaybackEngine>,
    display: NowPlayingHandle,
    skip_seconds: u64,
}

#[interface(name = "org.mpris.MediaPlayer2.Player")]
impl PlayerIface {
    fn next(&self) -> fdo::Result<()> {
        Err(fdo::Error::NotSupported(
            "single-track player has no next track".into(),
        ))
    }

    fn previous(&self) -> fdo::Result<()> {
        Err(fdo::Error::NotSupported(
            "single-track player has no previous track".into(),
        ))
    }

    fn play(&self) -> fdo::Result<()> {
        // Accepted means the engine will actually act on it; states where
        // the transport has nothing to resume are rejected.
        match self.engine.state_snapshot().status {
            PlaybackStatus::Ready | PlaybackStatus::Paused => {
                self.engine.toggle_play_pause();
                self.engine.republish_now_playing();
                Ok(())
            }
            PlaybackStatus::Playing => Err(fdo::Error::Failed("already playing".into())),
            PlaybackStatus::Loading => Err(fdo::Error::Failed("track is still loading".into())),
            PlaybackStatus::Failed(_) => Err(fdo::Error::Failed("track failed to load".into())),
            PlaybackStatus::Idle => Err(fdo::Error::Failed("no track loaded".into())),
        }
    }

    fn pause(&self) -> fdo::Result<()> {
        if !self.engine.is_playing() {
            return Err(fdo::Error::Failed("not playing".into()));
        }
        self.engine.toggle_play_pause();
        self.engine.republish_now_playing();
        Ok(())
    }

    fn play_pause(&self) -> fdo::Result<()> {
        match self.engine.state_snapshot().status {
            PlaybackStatus::Playing | PlaybackStatus::Paused | PlaybackStatus::Ready => {
                self.engine.toggle_play_pause();
                self.engine.republish_now_playing();
                Ok(())
            }
            PlaybackStatus::Loading => Err(fdo::Error::Failed("track is still loading".into())),
            PlaybackStatus::Failed(_) => Err(fdo::Error::Failed("track failed to load".into())),
            PlaybackStatus::Idle => Err(fdo::Error::Failed("no track loaded".into())),
        }
    }

    fn stop(&self) {
        self.engine.stop();
        self.engine.republish_now_playing();
    }

    /// MPRIS `Seek` is a relative offset; this player maps its sign onto the
    /// configured fixed skip interval.
    fn seek(&self, offset_micros: i64) -> fdo::Result<()> {
        if self.engine.state_snapshot().current_track.is_none() {
            return Err(fdo::Error::Failed("no track loaded".into()));
        }
        if offset_micros >= 0 {
            self.engine.skip_forward(self.skip_seconds);
        } else {
            self.engine.skip_backward(self.skip_seconds);
        }
        self.engine.republish_now_playing();
        Ok(())
    }

    fn set_position(&self, track_id: ObjectPath<'_>, position_micros: i64) -> fdo::Result<()> {
        if track_id.as_str() != TRACK_ID {
            debug!(track_id = %track_id, "SetPosition for an unknown track id, ignored");
            return Ok(());
        }
        if self.engine.state_snapshot().current_track.is_none() {
            return Err(fdo::Error::Failed("no track loaded".into()));
        }
        let target = Duration::from_micros(position_micros.max(0) as u64);
        self.engine.seek(target);
        self.engine.republish_now_playing();
        Ok(())
    }

    fn open_uri(&self, uri: String) -> fdo::Result<()> {
        self.engine
            .play(&uri)
            .map_err(|e| fdo::Error::InvalidArgs(e.to_string()))
    }

    #[zbus(property)]
    fn playback_status(&self) -> &str {
        status_label(&self.engine.state_snapshot().status)
    }

    #[zbus(property)]
    fn rate(&self) -> f64 {
        if self.engine.is_playing() { 1.0 } else { 0.0 }
    }

    #[zbus(property)]
    fn minimum_rate(&self) -> f64 {
        1.0
    }

    #[zbus(property)]
    fn maximum_rate(&self) -> f64 {
        1.0
    }

    #[zbus(property)]
    fn position(&self) -> i64 {
        self.engine.current_time().as_micros() as i64
    }

    #[zbus(property)]
    fn metadata(&self) -> HashMap<String, OwnedValue> {
        let info = self.display.lock().ok().and_then(|d| d.clone());
        metadata_map(info.as_ref())
    }

    #[zbus(property)]
    fn can_control(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_play(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_pause(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_seek(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_go_next(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn can_go_previous(&self) -> bool {
        false
    }
}

fn status_label(status: &PlaybackStatus) -> &'static str {
    match status {
        PlaybackStatus::Playing => "Playing",
        PlaybackStatus::Paused | PlaybackStatus::Ready => "Paused",
        _ => "Stopped",
    }
}

fn insert(map: &mut HashMap<String, OwnedValue>, key: &str, value: Value<'_>) {
    match OwnedValue::try_from(value) {
        Ok(v) => {
            map.insert(key.to_string(), v);
        }
        Err(e) => warn!(key, "metadata value conversion failed: {e}"),
    }
}

/// Project a now-playing record into MPRIS metadata. An empty map clears the
/// desktop display.
fn metadata_map(info: Option<&NowPlayingInfo>) -> HashMap<String, OwnedValue> {
    let mut map = HashMap::new();
    let Some(info) = info else {
        return map;
    };

    if let Ok(id) = ObjectPath::try_from(TRACK_ID) {
        insert(&mut map, "mpris:trackid", Value::from(id));
    }
    insert(&mut map, "xesam:title", Value::from(info.title.clone()));
    if let Some(artist) = &info.artist {
        insert(&mut map, "xesam:artist", Value::from(vec![artist.clone()]));
    }
    if let Some(album) = &info.album {
        insert(&mut map, "xesam:album", Value::from(album.clone()));
    }
    insert(&mut map, "xesam:url", Value::from(info.source_url.clone()));
    if let Some(duration) = info.duration {
        insert(
            &mut map,
            "mpris:length",
            Value::from(duration.as_micros() as i64),
        );
    }
    if !info.art_url.is_empty() {
        insert(&mut map, "mpris:artUrl", Value::from(info.art_url.clone()));
    }
    map
}

/// The MPRIS service: a dedicated thread driving a session-bus connection.
pub struct RemoteControlSurface {
    shutdown: Arc<AtomicBool>,
    join: Mutex<Option<JoinHandle<()>>>,
}

impl RemoteControlSurface {
    /// Register `org.mpris.MediaPlayer2.podbay` on the session bus and serve
    /// it until `shutdown()` or drop. Bus failures are logged and leave the
    /// engine fully usable without a remote surface.
    pub fn spawn(engine: Arc<PlaybackEngine>, skip_seconds: u64) -> Self {
        let shutdown = Arc::new(AtomicBool::new(false));
        let flag = shutdown.clone();

        let join = std::thread::spawn(move || {
            block_on(serve(engine, skip_seconds, flag));
        });

        Self {
            shutdown,
            join: Mutex::new(Some(join)),
        }
    }

    /// Release the bus name and stop the service thread. Idempotent.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
        if let Ok(mut j) = self.join.lock() {
            if let Some(h) = j.take() {
                let _ = h.join();
            }
        }
    }
}

impl Drop for RemoteControlSurface {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn serve(engine: Arc<PlaybackEngine>, skip_seconds: u64, shutdown: Arc<AtomicBool>) {
    let connection = match Connection::session().await {
        Ok(c) => c,
        Err(e) => {
            warn!("remote surface: session bus unavailable: {e}");
            return;
        }
    };

    if let Err(e) = connection.request_name(BUS_NAME).await {
        warn!("remote surface: could not acquire {BUS_NAME}: {e}");
        return;
    }

    let server = connection.object_server();
    let display = engine.now_playing_handle();

    if let Err(e) = server
        .at(
            OBJECT_PATH,
            RootIface {
                engine: engine.clone(),
            },
        )
        .await
    {
        warn!("remote surface: root interface registration failed: {e}");
        return;
    }
    if let Err(e) = server
        .at(
            OBJECT_PATH,
            PlayerIface {
                engine,
                display: display.clone(),
                skip_seconds,
            },
        )
        .await
    {
        warn!("remote surface: player interface registration failed: {e}");
        return;
    }

    while !shutdown.load(Ordering::SeqCst) {
        Timer::after(Duration::from_millis(250)).await;
    }

    let _ = server.remove::<PlayerIface, _>(OBJECT_PATH).await;
    let _ = server.remove::<RootIface, _>(OBJECT_PATH).await;
    // The surface is going away; do not leave a frozen record behind it.
    if let Ok(mut d) = display.lock() {
        *d = None;
    }
    if let Err(e) = connection.release_name(BUS_NAME).await {
        debug!("remote surface: release of {BUS_NAME} failed: {e}");
    }
}
