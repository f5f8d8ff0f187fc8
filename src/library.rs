//! Music directory scanning.
//!
//! Produces the ordered list of [`Track`]s the catalog starts from. Tags are
//! not read; a track is known by its file name.

mod model;
mod scan;

pub use model::Track;
pub use scan::{MusicDir, default_music_dir, prepare_music_dir, scan};

#[cfg(test)]
mod tests;
