use std::path::PathBuf;

use serde::Deserialize;

/// Top-level application settings loaded from `config.toml`.
///
/// File format: TOML
/// Default path (Linux/XDG): `$XDG_CONFIG_HOME/tuneloop/config.toml` or `~/.config/tuneloop/config.toml`
///
/// Precedence (highest wins):
/// 1) Environment variables (prefix `TUNELOOP__`, `__` as nested separator)
/// 2) Config file (if present)
/// 3) Struct defaults
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub engine: EngineSettings,
    pub playback: PlaybackSettings,
    pub progress: ProgressSettings,
    pub library: LibrarySettings,
    pub ui: UiSettings,
    pub log: LogSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Output sample rate in Hz.
    pub sample_rate: u32,
    /// Output channel count. Mono keeps mixing independent of the file format.
    pub channels: u16,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            sample_rate: 48_000,
            channels: 1,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlaybackSettings {
    /// Loop mode at startup.
    pub loop_mode: LoopModeSetting,
    /// Volume at startup, in percent.
    pub volume: u8,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            loop_mode: LoopModeSetting::List,
            volume: 80,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LoopModeSetting {
    #[serde(alias = "repeat-one", alias = "loop-one", alias = "loop_one")]
    Single,
    #[serde(
        alias = "loop-all",
        alias = "loop_all",
        alias = "loopall",
        alias = "loop-around"
    )]
    List,
    #[serde(alias = "shuffle")]
    Random,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProgressSettings {
    /// Period of the progress timer (milliseconds).
    pub tick_ms: u64,
    /// Minimum spacing between two progress recomputes (milliseconds).
    pub throttle_ms: u64,
    /// Tolerance used to decide a track has reached its end (seconds).
    pub end_threshold_secs: f64,
    /// Slider nudge for a single seek step, in thousandths of the track.
    pub step_permille: u16,
    /// Slider movement per key press while scrubbing, in thousandths of the track.
    pub drag_step_permille: u16,
}

impl Default for ProgressSettings {
    fn default() -> Self {
        Self {
            tick_ms: 1000,
            throttle_ms: 1000,
            end_threshold_secs: 0.1,
            step_permille: 50,
            drag_step_permille: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LibrarySettings {
    /// Directory to scan. Defaults to `music/` next to the executable.
    pub music_dir: Option<PathBuf>,
    /// File extensions to treat as audio (case-insensitive, without dot).
    pub extensions: Vec<String>,
    /// Whether to recurse into subdirectories.
    pub recursive: bool,
    /// Whether to include hidden files/directories (dotfiles).
    pub include_hidden: bool,
    /// Whether to follow symlinks during scanning.
    pub follow_links: bool,
}

impl Default for LibrarySettings {
    fn default() -> Self {
        Self {
            music_dir: None,
            extensions: vec!["mp3".into(), "wav".into(), "flac".into(), "ogg".into()],
            recursive: false,
            include_hidden: true,
            follow_links: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UiSettings {
    /// Title shown in the header while nothing is playing.
    pub header_text: String,
    /// Volume change per key press, in percent.
    pub volume_step: u8,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            header_text: " ~ tuneloop ~ ".to_string(),
            volume_step: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// Log file. Defaults to `$XDG_STATE_HOME/tuneloop/tuneloop.log`.
    pub file: Option<PathBuf>,
    /// Filter directive used when `RUST_LOG` is not set.
    pub filter: String,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            file: None,
            filter: "info".to_string(),
        }
    }
}
