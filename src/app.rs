//! Application module: exposes the app model used by the TUI and runtime.
//!
//! The `App` model lives in `app::model` and mirrors the player state
//! received through events, plus the cursor and input modes.

mod model;

pub use model::*;
