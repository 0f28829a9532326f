use serde::Deserialize;

/// Top-level settings loaded from `config.toml`.
///
/// File format: TOML
/// Default path (Linux/XDG): `$XDG_CONFIG_HOME/podbay/config.toml` or
/// `~/.config/podbay/config.toml`
///
/// Precedence (highest wins):
/// 1) Environment variables (prefix `PODBAY__`, `__` as nested separator)
/// 2) Config file (if present)
/// 3) Struct defaults
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub playback: PlaybackSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlaybackSettings {
    /// Seconds applied by the remote surface's skip-forward/skip-backward
    /// commands.
    pub skip_seconds: u64,
    /// How often the position sampler reads the backend position while
    /// playing (milliseconds). The Now Playing display is republished on
    /// every other sample.
    pub sampler_interval_ms: u64,
    /// How long a track may sit in `Loading` before the engine gives up and
    /// reports `Failed` (milliseconds). 0 disables the timeout.
    pub load_timeout_ms: u64,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            skip_seconds: 15,
            sampler_interval_ms: 500,
            load_timeout_ms: 20_000,
        }
    }
}
