use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::track::Track;

/// Lifecycle status of the current (single) track.
///
/// Transitions are monotonic per load cycle: `Idle -> Loading ->
/// {Ready | Failed}`, then `{Playing <-> Paused}` until `stop()` or a new
/// load returns to `Idle`/`Loading`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackStatus {
    Idle,
    Loading,
    Ready,
    Playing,
    Paused,
    Failed(String),
}

impl Default for PlaybackStatus {
    fn default() -> Self {
        Self::Idle
    }
}

/// The one mutable playback record, owned exclusively by the engine thread.
///
/// Other components get clones of a snapshot or read through the shared
/// handle; only engine-internal transition functions write it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaybackState {
    pub status: PlaybackStatus,
    pub current_track: Option<Track>,
    /// Elapsed time; monotonically non-decreasing except on explicit seek.
    pub position: Duration,
    /// Unknown until the backend signals readiness; set at most once per
    /// load.
    pub duration: Option<Duration>,
    pub last_error: Option<String>,
}

impl PlaybackState {
    /// Full reset at the start of a new load: no partial carry-over from the
    /// previous track.
    pub(crate) fn reset_for_load(&mut self, track: Track) {
        self.status = PlaybackStatus::Loading;
        self.current_track = Some(track);
        self.position = Duration::ZERO;
        self.duration = None;
        self.last_error = None;
    }

    /// Backend reported readiness. Duration is captured only if not already
    /// known for this load.
    pub(crate) fn mark_ready(&mut self, duration: Option<Duration>) {
        if self.duration.is_none() {
            self.duration = duration;
        }
        if self.status == PlaybackStatus::Loading {
            self.status = PlaybackStatus::Ready;
        }
    }

    pub(crate) fn mark_failed(&mut self, reason: &str) {
        self.status = PlaybackStatus::Failed(reason.to_string());
        self.last_error = Some(reason.to_string());
    }

    /// Write `position`, clamped to `[0, duration]` once duration is known.
    pub(crate) fn set_position(&mut self, position: Duration) {
        self.position = match self.duration {
            Some(d) if position > d => d,
            _ => position,
        };
    }

    /// Clamp a requested seek target against the known duration.
    pub(crate) fn clamp_target(&self, target: Duration) -> Duration {
        match self.duration {
            Some(d) if target > d => d,
            _ => target,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.status == PlaybackStatus::Playing
    }

    pub fn is_loading(&self) -> bool {
        self.status == PlaybackStatus::Loading
    }
}

/// Shared snapshot handle; everyone but the engine thread treats it as
/// read-only.
pub type StateHandle = Arc<Mutex<PlaybackState>>;
