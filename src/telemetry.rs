//! Playback telemetry sink.
//!
//! The engine reports play/pause/seek transitions to a sink as fire-and-forget
//! events: a sink must never block and its failures must never affect a state
//! transition.

use std::time::Duration;

use url::Url;

/// Receiver for playback lifecycle events.
pub trait TelemetrySink: Send + Sync {
    /// A track started (or resumed) rendering audio.
    fn played(&self, url: &Url, duration: Option<Duration>);
    /// Playback paused at `position`.
    fn paused(&self, position: Duration, duration: Option<Duration>);
    /// A seek was issued from `from` towards `to`.
    fn seeked(&self, from: Duration, to: Duration);
}

/// Default sink: structured log events under the `podbay::telemetry` target.
pub struct LogTelemetry;

impl TelemetrySink for LogTelemetry {
    fn played(&self, url: &Url, duration: Option<Duration>) {
        tracing::info!(
            target: "podbay::telemetry",
            url = %url,
            duration_secs = duration.map(|d| d.as_secs_f64()),
            "played"
        );
    }

    fn paused(&self, position: Duration, duration: Option<Duration>) {
        tracing::info!(
            target: "podbay::telemetry",
            position_secs = position.as_secs_f64(),
            duration_secs = duration.map(|d| d.as_secs_f64()),
            "paused"
        );
    }

    fn seeked(&self, from: Duration, to: Duration) {
        tracing::info!(
            target: "podbay::telemetry",
            from_secs = from.as_secs_f64(),
            to_secs = to.as_secs_f64(),
            "seeked"
        );
    }
}
