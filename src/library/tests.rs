use super::*;
use crate::config::LibrarySettings;
use std::fs;
use tempfile::tempdir;

fn names(tracks: &[Track]) -> Vec<&str> {
    tracks.iter().map(|t| t.name.as_str()).collect()
}

#[test]
fn track_name_is_the_file_name_with_extension() {
    let t = Track::from_path("/music/Some Song.flac");
    assert_eq!(t.name, "Some Song.flac");
}

#[test]
fn scan_filters_non_audio_and_sorts_by_name_case_insensitive() {
    let dir = tempdir().unwrap();

    fs::write(dir.path().join("b.MP3"), b"not a real mp3").unwrap();
    fs::write(dir.path().join("A.ogg"), b"not a real ogg").unwrap();
    fs::write(dir.path().join("c.txt"), b"ignore me").unwrap();

    let tracks = scan(dir.path(), &LibrarySettings::default());
    assert_eq!(names(&tracks), vec!["A.ogg", "b.MP3"]);
}

#[test]
fn scan_is_flat_by_default() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("root.mp3"), b"not real").unwrap();
    let sub = dir.path().join("sub");
    fs::create_dir_all(&sub).unwrap();
    fs::write(sub.join("child.mp3"), b"not real").unwrap();

    let tracks = scan(dir.path(), &LibrarySettings::default());
    assert_eq!(names(&tracks), vec!["root.mp3"]);

    let settings = LibrarySettings {
        recursive: true,
        ..LibrarySettings::default()
    };
    let tracks = scan(dir.path(), &settings);
    assert_eq!(names(&tracks), vec!["child.mp3", "root.mp3"]);
}

#[test]
fn scan_respects_include_hidden_false() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join(".hidden.mp3"), b"not real").unwrap();
    fs::write(dir.path().join("visible.mp3"), b"not real").unwrap();

    let settings = LibrarySettings {
        include_hidden: false,
        ..LibrarySettings::default()
    };
    let tracks = scan(dir.path(), &settings);
    assert_eq!(names(&tracks), vec!["visible.mp3"]);
}

#[test]
fn prepare_music_dir_creates_missing_directory() {
    let dir = tempdir().unwrap();
    let music = dir.path().join("music");

    assert_eq!(prepare_music_dir(&music).unwrap(), MusicDir::Created);
    assert!(music.is_dir());
    assert_eq!(prepare_music_dir(&music).unwrap(), MusicDir::Ready);
}

#[test]
fn prepare_music_dir_flags_regular_files() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("music");
    fs::write(&file, b"oops").unwrap();

    assert_eq!(prepare_music_dir(&file).unwrap(), MusicDir::NotADirectory);
}
