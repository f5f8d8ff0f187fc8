//! Error types shared by the engine, the playback controller and the session.

use thiserror::Error;

/// Failures reported by an [`AudioEngine`](crate::audio::AudioEngine) implementation.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The output device could not be opened.
    #[error("audio device unavailable: {0}")]
    Device(String),

    /// The file could not be opened.
    #[error("cannot open file: {0}")]
    Open(#[from] std::io::Error),

    /// The file was opened but is not a decodable audio stream.
    #[error("cannot decode audio: {0}")]
    Decode(String),

    /// Seeking inside the loaded track failed.
    #[error("seek failed: {0}")]
    Seek(String),

    /// An operation required a loaded track but none is loaded.
    #[error("no track loaded")]
    NotLoaded,
}

/// Failures surfaced by playback commands.
#[derive(Debug, Error)]
pub enum PlayerError {
    /// The engine failed to start; permanent for the lifetime of the session.
    #[error("audio engine failed to initialize: {0}")]
    EngineInit(String),

    /// A track could not be loaded. Playback state is unchanged.
    #[error("cannot load {name}: {source}")]
    TrackLoad {
        name: String,
        #[source]
        source: EngineError,
    },

    /// The command needs a non-empty visible list.
    #[error("the track list is empty")]
    EmptyCatalog,

    /// `play` was asked for an index outside the visible list.
    #[error("index {index} is outside the visible list ({len} entries)")]
    InvalidIndex { index: usize, len: usize },

    /// Any other engine failure (seek, volume, ...).
    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl PlayerError {
    /// Informational failures are reported as notices rather than errors.
    pub fn is_notice(&self) -> bool {
        matches!(self, Self::EmptyCatalog)
    }
}

pub type Result<T, E = PlayerError> = std::result::Result<T, E>;
