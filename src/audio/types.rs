//! Small audio-side types shared by the engine and the controller.

use crate::config::LoopModeSetting;

/// How `next`/`prev` pick the following track.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum LoopMode {
    /// Repeat the current track; the engine loops it seamlessly.
    Single,
    /// Walk the visible list and wrap around at both ends.
    #[default]
    List,
    /// Jump to a random visible track other than the current one.
    Random,
}

impl LoopMode {
    /// Whether the engine should loop the loaded track by itself.
    pub fn repeats_track(self) -> bool {
        matches!(self, Self::Single)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::List => "list",
            Self::Random => "random",
        }
    }

    /// Cycle `Single -> List -> Random -> Single`.
    pub fn cycled(self) -> Self {
        match self {
            Self::Single => Self::List,
            Self::List => Self::Random,
            Self::Random => Self::Single,
        }
    }
}

impl From<LoopModeSetting> for LoopMode {
    fn from(setting: LoopModeSetting) -> Self {
        match setting {
            LoopModeSetting::Single => Self::Single,
            LoopModeSetting::List => Self::List,
            LoopModeSetting::Random => Self::Random,
        }
    }
}

/// Elapsed time and end-of-track flag read in one engine call.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Position {
    pub elapsed_secs: f64,
    pub at_end: bool,
}
