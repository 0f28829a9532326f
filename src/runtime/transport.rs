//! Minimal stdin transport so the player can be driven without a desktop
//! shell: one command per line, `help` lists them.

use std::io::{self, BufRead, Write};
use std::time::Duration;

use crate::engine::{PlaybackEngine, PlaybackStatus};

pub fn repl(engine: &PlaybackEngine, skip_seconds: u64) -> Result<(), Box<dyn std::error::Error>> {
    let stdin = io::stdin();
    let mut out = io::stdout();

    writeln!(out, "podbay ready; type 'help' for commands")?;
    for line in stdin.lock().lines() {
        let line = line?;
        let mut parts = line.split_whitespace();
        let Some(cmd) = parts.next() else {
            continue;
        };

        match cmd {
            "play" => {
                let Some(source) = parts.next() else {
                    writeln!(out, "usage: play <url>")?;
                    continue;
                };
                if let Err(e) = engine.play(source) {
                    writeln!(out, "error: {e}")?;
                }
            }
            "p" | "toggle" => engine.toggle_play_pause(),
            "f" => engine.skip_forward(skip_seconds),
            "b" => engine.skip_backward(skip_seconds),
            "seek" => match parts.next().and_then(|s| s.parse::<u64>().ok()) {
                Some(secs) => engine.seek(Duration::from_secs(secs)),
                None => writeln!(out, "usage: seek <seconds>")?,
            },
            "stop" => engine.stop(),
            "s" | "status" => print_status(engine, &mut out)?,
            "q" | "quit" => break,
            "help" => {
                writeln!(
                    out,
                    "commands: play <url> | p | f | b | seek <secs> | stop | s | q"
                )?;
            }
            other => writeln!(out, "unknown command: {other}")?,
        }
    }
    Ok(())
}

fn print_status(engine: &PlaybackEngine, out: &mut impl Write) -> io::Result<()> {
    let st = engine.state_snapshot();
    let status = match &st.status {
        PlaybackStatus::Idle => "idle".to_string(),
        PlaybackStatus::Loading => "loading".to_string(),
        PlaybackStatus::Ready => "ready".to_string(),
        PlaybackStatus::Playing => "playing".to_string(),
        PlaybackStatus::Paused => "paused".to_string(),
        PlaybackStatus::Failed(reason) => format!("failed ({reason})"),
    };
    let track = st
        .current_track
        .as_ref()
        .map(|t| t.display.as_str())
        .unwrap_or("-");
    let duration = st
        .duration
        .map(|d| format!("{}s", d.as_secs()))
        .unwrap_or_else(|| "?".to_string());
    writeln!(
        out,
        "{status} | {track} | {}s / {duration}",
        st.position.as_secs()
    )
}
