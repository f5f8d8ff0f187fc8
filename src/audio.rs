//! Audio engine abstraction and its `rodio` backend.
//!
//! The player talks to the engine only through [`EngineHandle`], which keeps
//! the engine behind a single lock. The device is opened on a dedicated
//! thread by [`EngineInitializer`] so startup never blocks the UI.

mod engine;
mod handle;
mod init;
mod sink;
mod types;

#[cfg(test)]
pub mod fake;

pub use engine::{AudioEngine, EngineFactory};
pub use handle::{EngineHandle, EngineStatus};
pub use init::EngineInitializer;
pub use sink::RodioFactory;
pub use types::{LoopMode, Position};
