use super::load::config_file_path;
use super::schema::*;
use std::sync::{Mutex, OnceLock};

static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

fn env_lock() -> std::sync::MutexGuard<'static, ()> {
    ENV_LOCK.get_or_init(|| Mutex::new(())).lock().unwrap()
}

struct EnvGuard {
    key: &'static str,
    old: Option<std::ffi::OsString>,
}

impl EnvGuard {
    fn set(key: &'static str, val: &str) -> Self {
        let old = std::env::var_os(key);
        unsafe {
            std::env::set_var(key, val);
        }
        Self { key, old }
    }

    fn remove(key: &'static str) -> Self {
        let old = std::env::var_os(key);
        unsafe {
            std::env::remove_var(key);
        }
        Self { key, old }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        match self.old.take() {
            Some(v) => unsafe {
                std::env::set_var(self.key, v);
            },
            None => unsafe {
                std::env::remove_var(self.key);
            },
        }
    }
}

#[test]
fn defaults_match_documented_values() {
    let s = Settings::default();
    assert_eq!(s.playback.skip_seconds, 15);
    assert_eq!(s.playback.sampler_interval_ms, 500);
    assert_eq!(s.playback.load_timeout_ms, 20_000);
    assert!(s.validate().is_ok());
}

#[test]
fn validate_rejects_zero_intervals() {
    let mut s = Settings::default();
    s.playback.sampler_interval_ms = 0;
    assert!(s.validate().is_err());

    let mut s = Settings::default();
    s.playback.skip_seconds = 0;
    assert!(s.validate().is_err());
}

#[test]
fn config_file_path_prefers_the_explicit_override() {
    let _lock = env_lock();
    let _g1 = EnvGuard::set("PODBAY_CONFIG_PATH", "/tmp/podbay-test-config.toml");
    assert_eq!(
        config_file_path().unwrap(),
        std::path::PathBuf::from("/tmp/podbay-test-config.toml")
    );
}

#[test]
fn config_file_path_falls_back_to_xdg_config_home() {
    let _lock = env_lock();
    let _g0 = EnvGuard::remove("PODBAY_CONFIG_PATH");
    let _g1 = EnvGuard::set("XDG_CONFIG_HOME", "/tmp/xdg-config-home");
    assert_eq!(
        config_file_path().unwrap(),
        std::path::PathBuf::from("/tmp/xdg-config-home/podbay/config.toml")
    );
}

#[test]
fn env_overrides_defaults() {
    let _lock = env_lock();
    let _g0 = EnvGuard::remove("PODBAY_CONFIG_PATH");
    let _g1 = EnvGuard::set("XDG_CONFIG_HOME", "/nonexistent-podbay-test");
    let _g2 = EnvGuard::set("PODBAY__PLAYBACK__SKIP_SECONDS", "30");

    let s = Settings::load().unwrap();
    assert_eq!(s.playback.skip_seconds, 30);
    assert_eq!(s.playback.sampler_interval_ms, 500);
}

#[test]
fn config_file_is_layered_under_env() {
    let _lock = env_lock();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        "[playback]\nskip_seconds = 45\nload_timeout_ms = 5000\n",
    )
    .unwrap();

    let _g0 = EnvGuard::set("PODBAY_CONFIG_PATH", path.to_str().unwrap());

    let s = Settings::load().unwrap();
    assert_eq!(s.playback.skip_seconds, 45);
    assert_eq!(s.playback.load_timeout_ms, 5000);
}
