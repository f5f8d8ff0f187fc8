//! Playback coordination: the state machine, the progress monitor and the
//! typed events both of them publish.

mod controller;
mod events;
mod monitor;

pub use controller::{PlaybackController, PlayerState};
pub use events::{EventBus, PlayerEvent, ReportLevel};
pub use monitor::{PROGRESS_MAX, ProgressMonitor, ProgressTimer, StepDirection, TickOutcome};
