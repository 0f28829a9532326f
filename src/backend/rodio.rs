//! rodio-based backend player for file-backed sources.
//!
//! Decoding and mixing happen on rodio's own audio thread; the player object
//! lives on the engine thread and only drives the sink. Seeking rebuilds the
//! sink with `Source::skip_duration`, which works for the common formats and
//! keeps the decoder state simple.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use lofty::prelude::*;
use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink, Source};

use crate::track::Track;

use super::types::{Backend, BackendEvent, BackendEventSink, BackendPlayer, BackendStatus};

pub struct RodioBackend;

impl Backend for RodioBackend {
    fn open(&mut self, track: &Track, events: BackendEventSink) -> Box<dyn BackendPlayer> {
        match Live::open(track) {
            Ok((live, duration)) => {
                events(BackendEvent::Status(BackendStatus::ReadyToPlay { duration }));
                Box::new(RodioPlayer {
                    live: Some(live),
                    events,
                })
            }
            Err(reason) => {
                events(BackendEvent::Status(BackendStatus::Failed(reason)));
                Box::new(RodioPlayer { live: None, events })
            }
        }
    }
}

/// Create a paused `Sink` for `path` that starts playback at `start_at`.
fn create_sink_at(stream: &OutputStream, path: &Path, start_at: Duration) -> Result<Sink, String> {
    let file = File::open(path).map_err(|e| format!("failed to open {}: {e}", path.display()))?;

    let source = Decoder::new(BufReader::new(file))
        .map_err(|e| format!("failed to decode {}: {e}", path.display()))?
        // `skip_duration` is our seeking primitive; even Duration::ZERO is fine.
        .skip_duration(start_at);

    let sink = Sink::connect_new(stream.mixer());
    sink.append(source);
    sink.pause();
    Ok(sink)
}

/// Container/tag duration for the file, if either layer knows it.
fn probe_duration(path: &Path, decoded: Option<Duration>) -> Option<Duration> {
    decoded.or_else(|| {
        lofty::read_from_path(path)
            .ok()
            .map(|tagged| tagged.properties().duration())
    })
}

struct Live {
    stream: OutputStream,
    sink: Sink,
    path: PathBuf,
    // Wall-clock start of the current play stretch plus time accumulated
    // across earlier stretches; together they are the playback position.
    started_at: Option<Instant>,
    accumulated: Duration,
    paused: bool,
}

impl Live {
    fn open(track: &Track) -> Result<(Self, Option<Duration>), String> {
        let path = track.local_path().ok_or_else(|| {
            format!(
                "unsupported scheme '{}': this backend plays file-backed sources",
                track.source_url.scheme()
            )
        })?;

        let mut stream = OutputStreamBuilder::open_default_stream()
            .map_err(|e| format!("no audio output device: {e}"))?;
        // rodio logs to stderr when OutputStream is dropped; noisy for a
        // player that tears streams down on every track change.
        stream.log_on_drop(false);

        let file =
            File::open(&path).map_err(|e| format!("failed to open {}: {e}", path.display()))?;
        let source = Decoder::new(BufReader::new(file))
            .map_err(|e| format!("failed to decode {}: {e}", path.display()))?;
        let duration = probe_duration(&path, source.total_duration());

        let sink = Sink::connect_new(stream.mixer());
        sink.append(source);
        sink.pause();

        Ok((
            Self {
                stream,
                sink,
                path,
                started_at: None,
                accumulated: Duration::ZERO,
                paused: true,
            },
            duration,
        ))
    }
}

struct RodioPlayer {
    /// `None` when opening failed; every command is then a no-op and the
    /// failure has already been reported through the sink.
    live: Option<Live>,
    events: BackendEventSink,
}

impl BackendPlayer for RodioPlayer {
    fn play(&mut self) {
        let Some(live) = self.live.as_mut() else {
            return;
        };
        live.sink.play();
        live.started_at = Some(Instant::now());
        live.paused = false;
        (self.events)(BackendEvent::Rate(super::RateSignal::Playing));
    }

    fn pause(&mut self) {
        let Some(live) = self.live.as_mut() else {
            return;
        };
        if let Some(st) = live.started_at.take() {
            live.accumulated += st.elapsed();
        }
        live.sink.pause();
        live.paused = true;
        (self.events)(BackendEvent::Rate(super::RateSignal::Paused));
    }

    fn seek(&mut self, to: Duration) {
        let Some(live) = self.live.as_mut() else {
            return;
        };

        // Stop the old sink and replace with a fresh one skipped to `to`.
        live.sink.stop();
        match create_sink_at(&live.stream, &live.path, to) {
            Ok(sink) => {
                if live.paused {
                    live.started_at = None;
                } else {
                    sink.play();
                    live.started_at = Some(Instant::now());
                }
                live.sink = sink;
                live.accumulated = to;
                (self.events)(BackendEvent::SeekDone { position: to });
            }
            Err(reason) => {
                self.live = None;
                (self.events)(BackendEvent::Status(BackendStatus::Failed(reason)));
            }
        }
    }

    fn position(&self) -> Duration {
        match &self.live {
            Some(live) => {
                live.accumulated + live.started_at.map_or(Duration::ZERO, |st| st.elapsed())
            }
            None => Duration::ZERO,
        }
    }
}
