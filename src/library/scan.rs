use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::config::LibrarySettings;

use super::model::Track;

/// State of the music directory before scanning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MusicDir {
    /// The directory exists and can be scanned.
    Ready,
    /// The directory did not exist and was created empty.
    Created,
    /// The path exists but is not a directory.
    NotADirectory,
}

/// `music/` next to the running executable, or `./music` when that cannot be resolved.
pub fn default_music_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|p| p.join("music")))
        .unwrap_or_else(|| PathBuf::from("music"))
}

/// Make sure `dir` is usable, creating it when missing.
pub fn prepare_music_dir(dir: &Path) -> io::Result<MusicDir> {
    if !dir.exists() {
        std::fs::create_dir_all(dir)?;
        return Ok(MusicDir::Created);
    }
    if !dir.is_dir() {
        return Ok(MusicDir::NotADirectory);
    }
    Ok(MusicDir::Ready)
}

fn is_audio_file(path: &Path, settings: &LibrarySettings) -> bool {
    let exts: Vec<String> = settings
        .extensions
        .iter()
        .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|e| !e.is_empty())
        .collect();

    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            exts.iter().any(|e| e == &ext)
        })
        .unwrap_or(false)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|s| s.to_str())
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

/// Collect every audio file under `dir`, sorted by file name (case-insensitive).
pub fn scan(dir: &Path, settings: &LibrarySettings) -> Vec<Track> {
    let mut tracks: Vec<Track> = Vec::new();

    // Non-recursive = only the root directory.
    let max_depth = if settings.recursive { usize::MAX } else { 1 };
    let walker = WalkDir::new(dir)
        .follow_links(settings.follow_links)
        .max_depth(max_depth);

    for entry in walker
        .into_iter()
        .filter_entry(|e| settings.include_hidden || e.depth() == 0 || !is_hidden(e.path()))
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "skipping unreadable entry");
                continue;
            }
        };
        let path = entry.path();
        if entry.file_type().is_dir() || !path.is_file() {
            continue;
        }
        if is_audio_file(path, settings) {
            tracks.push(Track::from_path(path));
        }
    }

    tracks.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
    debug!(dir = %dir.display(), count = tracks.len(), "scanned music directory");
    tracks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_audio_file_matches_configured_extensions_case_insensitive() {
        let settings = LibrarySettings::default();
        assert!(is_audio_file(Path::new("/tmp/a.mp3"), &settings));
        assert!(is_audio_file(Path::new("/tmp/a.MP3"), &settings));
        assert!(is_audio_file(Path::new("/tmp/a.flac"), &settings));
        assert!(is_audio_file(Path::new("/tmp/a.wav"), &settings));
        assert!(is_audio_file(Path::new("/tmp/a.ogg"), &settings));
        assert!(!is_audio_file(Path::new("/tmp/a.txt"), &settings));
        assert!(!is_audio_file(Path::new("/tmp/a"), &settings));
    }

    #[test]
    fn extensions_tolerate_leading_dots_and_whitespace() {
        let settings = LibrarySettings {
            extensions: vec![" .Opus ".into(), "".into()],
            ..LibrarySettings::default()
        };
        assert!(is_audio_file(Path::new("/tmp/a.opus"), &settings));
        assert!(!is_audio_file(Path::new("/tmp/a.mp3"), &settings));
    }
}
