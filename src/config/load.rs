use std::{env, path::PathBuf};

use super::schema::Settings;

/// Upper bound for timer intervals: one hour.
const MAX_INTERVAL_MS: u64 = 60 * 60 * 1000;

/// Configuration loading helpers.
///
/// `Settings::load` tries environment variables first (prefix `TUNELOOP__`), then an
/// optional config file and falls back to struct defaults.
impl Settings {
    /// Load settings from environment and optional config file.
    pub fn load() -> Result<Self, ::config::ConfigError> {
        let config_path = resolve_config_path();

        let mut builder = ::config::Config::builder();

        if let Some(path) = &config_path {
            builder = builder.add_source(::config::File::from(path.as_path()).required(false));
        }

        builder = builder.add_source(
            ::config::Environment::with_prefix("TUNELOOP")
                .separator("__")
                .try_parsing(true),
        );

        let cfg = builder.build()?;
        let settings: Settings = cfg.try_deserialize()?;
        Ok(settings)
    }

    /// Perform basic validation checks on loaded settings.
    pub fn validate(&self) -> Result<(), String> {
        if self.engine.sample_rate == 0 {
            return Err("engine.sample_rate must be >= 1".to_string());
        }
        if self.engine.channels == 0 {
            return Err("engine.channels must be >= 1".to_string());
        }
        if !(1..=MAX_INTERVAL_MS).contains(&self.progress.tick_ms) {
            return Err(format!("progress.tick_ms must be within 1..={MAX_INTERVAL_MS}"));
        }
        if self.progress.throttle_ms > MAX_INTERVAL_MS {
            return Err(format!("progress.throttle_ms must be at most {MAX_INTERVAL_MS}"));
        }
        if !(self.progress.end_threshold_secs >= 0.0) {
            return Err("progress.end_threshold_secs must be a non-negative number".to_string());
        }
        if self.playback.volume > 100 {
            return Err("playback.volume must be within 0..=100".to_string());
        }
        Ok(())
    }
}

/// Resolve the config path from `TUNELOOP_CONFIG_PATH` or XDG defaults.
pub fn resolve_config_path() -> Option<PathBuf> {
    if let Some(p) = env::var_os("TUNELOOP_CONFIG_PATH") {
        return Some(PathBuf::from(p));
    }
    default_config_path()
}

/// Compute the default config path under `$XDG_CONFIG_HOME/tuneloop/config.toml`
/// or `~/.config/tuneloop/config.toml` when `XDG_CONFIG_HOME` is not set.
pub fn default_config_path() -> Option<PathBuf> {
    xdg_dir("XDG_CONFIG_HOME", ".config").map(|d| d.join("tuneloop").join("config.toml"))
}

/// Compute the default log path under `$XDG_STATE_HOME/tuneloop/tuneloop.log`
/// or `~/.local/state/tuneloop/tuneloop.log`.
pub fn default_log_path() -> Option<PathBuf> {
    xdg_dir("XDG_STATE_HOME", ".local/state").map(|d| d.join("tuneloop").join("tuneloop.log"))
}

fn xdg_dir(var: &str, home_fallback: &str) -> Option<PathBuf> {
    if let Some(xdg) = env::var_os(var) {
        let xdg = PathBuf::from(xdg);
        if !xdg.as_os_str().is_empty() {
            return Some(xdg);
        }
    }
    let home = env::var_os("HOME")?;
    Some(PathBuf::from(home).join(home_fallback))
}
