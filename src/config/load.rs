use std::env;
use std::path::PathBuf;

use super::schema::Settings;

impl Settings {
    /// Layered load: struct defaults underneath, an optional TOML file over
    /// them, `PODBAY__*` environment variables (with `__` separating nested
    /// keys) on top.
    ///
    /// A missing config file is fine; a malformed one is an error.
    pub fn load() -> Result<Self, ::config::ConfigError> {
        let mut builder = ::config::Config::builder();
        if let Some(path) = config_file_path() {
            builder = builder.add_source(::config::File::from(path.as_path()).required(false));
        }
        builder
            .add_source(
                ::config::Environment::with_prefix("PODBAY")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> Result<(), String> {
        if self.playback.sampler_interval_ms == 0 {
            return Err("playback.sampler_interval_ms must be >= 1".to_string());
        }
        if self.playback.skip_seconds == 0 {
            return Err("playback.skip_seconds must be >= 1".to_string());
        }
        Ok(())
    }
}

/// Where the config file lives: `$PODBAY_CONFIG_PATH` wins, otherwise the
/// XDG location (`$XDG_CONFIG_HOME/podbay/config.toml`, with `~/.config` as
/// the usual fallback).
pub fn config_file_path() -> Option<PathBuf> {
    env::var_os("PODBAY_CONFIG_PATH")
        .map(PathBuf::from)
        .or_else(xdg_config_file)
}

fn xdg_config_file() -> Option<PathBuf> {
    let base = env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))?;
    Some(base.join("podbay").join("config.toml"))
}
