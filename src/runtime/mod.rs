//! Binary entry point: wire the engine to the real backend, the MPRIS
//! surface and a line-oriented transport on stdin.

use std::env;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::backend::RodioBackend;
use crate::engine::PlaybackEngine;
use crate::remote::RemoteControlSurface;
use crate::session::SystemSession;
use crate::telemetry::LogTelemetry;

mod settings;
mod transport;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();
    let settings = settings::load_settings();

    let engine = Arc::new(PlaybackEngine::new(
        Box::new(RodioBackend),
        Box::new(SystemSession),
        Arc::new(LogTelemetry),
        settings.playback.clone(),
    ));
    let remote = RemoteControlSurface::spawn(engine.clone(), settings.playback.skip_seconds);

    if let Some(source) = env::args().nth(1) {
        if let Err(e) = engine.play(&source) {
            tracing::error!("cannot play {source}: {e}");
        }
    }

    let result = transport::repl(&engine, settings.playback.skip_seconds);

    remote.shutdown();
    engine.shutdown();
    result
}

fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("podbay=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
