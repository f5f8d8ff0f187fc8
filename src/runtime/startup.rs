use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::{self, LibrarySettings, LogSettings};
use crate::library::{self, MusicDir, Track};
use crate::player::ReportLevel;

/// Install the file logger. The terminal belongs to the UI, so nothing is
/// written to stdout/stderr. Returns the log path when logging is active.
pub fn init_logging(settings: &LogSettings) -> Option<PathBuf> {
    let path = settings.file.clone().or_else(config::default_log_path)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).ok()?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .ok()?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true)
        .with_env_filter(filter)
        .try_init()
        .ok()?;
    Some(path)
}

/// Music directory: command-line argument, then config, then `music/` next to the binary.
pub fn resolve_music_dir(arg: Option<String>, settings: &LibrarySettings) -> PathBuf {
    arg.map(PathBuf::from)
        .or_else(|| settings.music_dir.clone())
        .unwrap_or_else(library::default_music_dir)
}

/// Prepare and scan `dir`. The message, if any, is shown in the status box.
pub fn load_library(
    dir: &Path,
    settings: &LibrarySettings,
) -> (Vec<Track>, Option<(ReportLevel, String)>) {
    match library::prepare_music_dir(dir) {
        Ok(MusicDir::Ready) => {
            let tracks = library::scan(dir, settings);
            info!(dir = %dir.display(), count = tracks.len(), "library loaded");
            let message = tracks.is_empty().then(|| {
                (
                    ReportLevel::Notice,
                    format!("no audio files in {}", dir.display()),
                )
            });
            (tracks, message)
        }
        Ok(MusicDir::Created) => {
            info!(dir = %dir.display(), "created music directory");
            let message = format!(
                "created {}; put audio files there and press R",
                dir.display()
            );
            (Vec::new(), Some((ReportLevel::Notice, message)))
        }
        Ok(MusicDir::NotADirectory) => {
            warn!(dir = %dir.display(), "music path is not a directory");
            let message = format!("{} is not a directory", dir.display());
            (Vec::new(), Some((ReportLevel::Error, message)))
        }
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "cannot create music directory");
            let message = format!("cannot create {}: {e}", dir.display());
            (Vec::new(), Some((ReportLevel::Error, message)))
        }
    }
}
