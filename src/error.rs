//! Playback error taxonomy.
//!
//! Every load/playback failure terminates at the engine boundary as state
//! (`PlaybackStatus::Failed` + `last_error`); nothing in this crate panics or
//! propagates past the command API. The variants here exist so callers that
//! *do* get a synchronous `Result` (URL validation, session activation) can
//! tell the cases apart.

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PlaybackError {
    /// The source string did not parse as a playable URL. Reported
    /// synchronously; an already-active track is left untouched.
    #[error("invalid source: {0}")]
    InvalidSource(String),

    /// The backend reported a failure while opening or buffering the stream.
    #[error("load failed: {0}")]
    LoadFailure(String),

    /// The host audio session could not be configured. Non-fatal: logged,
    /// playback is attempted anyway.
    #[error("audio session configuration failed: {0}")]
    SessionConfiguration(String),

    /// The backend's rate-control signal arrived with an attached error.
    /// Treated identically to `LoadFailure` at the state level.
    #[error("backend playback error: {0}")]
    Backend(String),
}
