//! The capability surface the player needs from an audio backend.

use std::path::Path;

use crate::error::EngineError;

/// A decode/output engine holding at most one loaded track.
///
/// Implementations are driven exclusively through [`EngineHandle`](super::EngineHandle),
/// which serializes every call behind one lock.
pub trait AudioEngine: Send {
    /// Open and decode `path`, then replace the loaded track with it.
    ///
    /// The previous track is released before the new one becomes loaded. If the
    /// file cannot be opened or decoded, the previous track is left untouched.
    /// A freshly loaded track is paused at zero.
    fn load(&mut self, path: &Path) -> Result<(), EngineError>;

    /// Release the loaded track, if any.
    fn unload(&mut self);

    fn is_loaded(&self) -> bool;

    /// Start or resume the loaded track.
    fn start(&mut self);

    /// Pause the loaded track, keeping its position.
    fn stop(&mut self);

    /// Playback position of the loaded track, in seconds.
    fn elapsed_secs(&self) -> Result<f64, EngineError>;

    /// Total length of the loaded track, when the stream reports one.
    fn duration_secs(&self) -> Option<f64>;

    /// Whether the loaded track has played out.
    fn at_end(&self) -> bool;

    fn seek_to_secs(&mut self, secs: f64) -> Result<(), EngineError>;

    /// Linear gain, `0.0..=1.0`.
    fn set_volume(&mut self, volume: f32);

    /// Restart the loaded track from zero whenever it reaches its end.
    fn set_looping(&mut self, looping: bool);

    /// Release the track and every engine resource.
    fn shutdown(&mut self);
}

/// Builds an engine on the initializer thread.
///
/// `Guard` holds whatever must stay on that thread (e.g. a device stream that
/// is not `Send`). It is dropped on the initializer thread during teardown.
pub trait EngineFactory: Send + 'static {
    type Guard;

    fn open(self) -> Result<(Box<dyn AudioEngine>, Self::Guard), EngineError>;
}
