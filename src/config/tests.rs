use super::load::{default_config_path, default_log_path, resolve_config_path};
use super::schema::*;
use std::sync::{Mutex, OnceLock};

static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

fn env_lock() -> std::sync::MutexGuard<'static, ()> {
    ENV_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
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
fn resolve_config_path_prefers_tuneloop_config_path() {
    let _lock = env_lock();
    let _g1 = EnvGuard::set("TUNELOOP_CONFIG_PATH", "/tmp/tuneloop-test-config.toml");
    assert_eq!(
        resolve_config_path().unwrap(),
        std::path::PathBuf::from("/tmp/tuneloop-test-config.toml")
    );
}

#[test]
fn default_config_path_prefers_xdg_config_home() {
    let _lock = env_lock();
    let _g1 = EnvGuard::set("XDG_CONFIG_HOME", "/tmp/xdg-config-home");
    let _g2 = EnvGuard::set("HOME", "/tmp/home-should-not-win");

    assert_eq!(
        default_config_path().unwrap(),
        std::path::PathBuf::from("/tmp/xdg-config-home")
            .join("tuneloop")
            .join("config.toml")
    );
}

#[test]
fn default_config_path_falls_back_to_home_dot_config() {
    let _lock = env_lock();
    let _g1 = EnvGuard::remove("XDG_CONFIG_HOME");
    let _g2 = EnvGuard::set("HOME", "/tmp/home-dir");

    assert_eq!(
        default_config_path().unwrap(),
        std::path::PathBuf::from("/tmp/home-dir")
            .join(".config")
            .join("tuneloop")
            .join("config.toml")
    );
}

#[test]
fn default_log_path_uses_xdg_state_home() {
    let _lock = env_lock();
    let _g1 = EnvGuard::set("XDG_STATE_HOME", "/tmp/xdg-state");

    assert_eq!(
        default_log_path().unwrap(),
        std::path::PathBuf::from("/tmp/xdg-state")
            .join("tuneloop")
            .join("tuneloop.log")
    );
}

#[test]
fn defaults_match_the_classic_player() {
    let s = Settings::default();
    assert_eq!(s.engine.sample_rate, 48_000);
    assert_eq!(s.engine.channels, 1);
    assert_eq!(s.playback.loop_mode, LoopModeSetting::List);
    assert_eq!(s.playback.volume, 80);
    assert_eq!(s.progress.tick_ms, 1000);
    assert_eq!(s.progress.throttle_ms, 1000);
    assert!((s.progress.end_threshold_secs - 0.1).abs() < f64::EPSILON);
    assert!(!s.library.recursive);
    assert!(s.validate().is_ok());
}

#[test]
fn validate_rejects_zero_channels_and_loud_volume() {
    let mut s = Settings::default();
    s.engine.channels = 0;
    assert!(s.validate().is_err());

    let mut s = Settings::default();
    s.playback.volume = 101;
    assert!(s.validate().is_err());

    let mut s = Settings::default();
    s.progress.end_threshold_secs = f64::NAN;
    assert!(s.validate().is_err());
}

#[test]
fn validate_bounds_timer_intervals() {
    let mut s = Settings::default();
    s.progress.tick_ms = u64::MAX;
    assert!(s.validate().is_err());

    let mut s = Settings::default();
    s.progress.throttle_ms = u64::MAX;
    assert!(s.validate().is_err());

    let mut s = Settings::default();
    s.progress.tick_ms = 60 * 60 * 1000;
    s.progress.throttle_ms = 0;
    assert!(s.validate().is_ok());
}

#[test]
fn settings_load_from_config_file_and_parse_loop_mode_aliases() {
    let _lock = env_lock();

    let dir = tempfile::tempdir().unwrap();
    let cfg_path = dir.path().join("config.toml");
    std::fs::write(
        &cfg_path,
        r#"
[engine]
sample_rate = 44100
channels = 2

[playback]
loop_mode = "repeat-one"
volume = 55

[progress]
tick_ms = 500
throttle_ms = 250
end_threshold_secs = 0.25
step_permille = 20

[library]
music_dir = "/srv/music"
extensions = ["mp3"]
recursive = true
include_hidden = false

[ui]
header_text = "hello"
volume_step = 10

[log]
filter = "debug"
"#,
    )
    .unwrap();

    let _g1 = EnvGuard::set("TUNELOOP_CONFIG_PATH", cfg_path.to_str().unwrap());
    let _g2 = EnvGuard::remove("TUNELOOP__PLAYBACK__VOLUME");

    let s = Settings::load().unwrap();
    assert_eq!(s.engine.sample_rate, 44_100);
    assert_eq!(s.engine.channels, 2);
    assert_eq!(s.playback.loop_mode, LoopModeSetting::Single);
    assert_eq!(s.playback.volume, 55);
    assert_eq!(s.progress.tick_ms, 500);
    assert_eq!(s.progress.throttle_ms, 250);
    assert!((s.progress.end_threshold_secs - 0.25).abs() < f64::EPSILON);
    assert_eq!(s.progress.step_permille, 20);
    assert_eq!(s.progress.drag_step_permille, 10);
    assert_eq!(
        s.library.music_dir,
        Some(std::path::PathBuf::from("/srv/music"))
    );
    assert_eq!(s.library.extensions, vec!["mp3".to_string()]);
    assert!(s.library.recursive);
    assert!(!s.library.include_hidden);
    assert!(s.library.follow_links);
    assert_eq!(s.ui.header_text, "hello");
    assert_eq!(s.ui.volume_step, 10);
    assert_eq!(s.log.filter, "debug");
}

#[test]
fn settings_env_overrides_config_file() {
    let _lock = env_lock();

    let dir = tempfile::tempdir().unwrap();
    let cfg_path = dir.path().join("config.toml");
    std::fs::write(
        &cfg_path,
        r#"
[playback]
volume = 90
loop_mode = "shuffle"
"#,
    )
    .unwrap();

    let _g1 = EnvGuard::set("TUNELOOP_CONFIG_PATH", cfg_path.to_str().unwrap());
    let _g2 = EnvGuard::set("TUNELOOP__PLAYBACK__VOLUME", "30");

    let s = Settings::load().unwrap();
    assert_eq!(s.playback.volume, 30);
    assert_eq!(s.playback.loop_mode, LoopModeSetting::Random);
}
