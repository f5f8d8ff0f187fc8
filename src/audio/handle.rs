//! Shared, lock-protected access to the single audio engine.
//!
//! Every method takes the lock, performs one engine interaction, copies the
//! result out and releases the lock before returning. Callers never hold a
//! guard across two methods, so no call path can re-enter the lock.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info};

use crate::error::{EngineError, PlayerError, Result};
use crate::library::Track;

use super::engine::AudioEngine;
use super::types::Position;

/// Initialization progress of the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineStatus {
    /// The initializer has not reported yet.
    Pending,
    Ready,
    /// Initialization failed; permanent for the process.
    Failed(String),
    /// The engine was released during teardown.
    Closed,
}

#[derive(Default)]
struct EngineSlot {
    engine: Option<Box<dyn AudioEngine>>,
    initialized: bool,
    init_error: Option<String>,
}

impl EngineSlot {
    fn status(&self) -> EngineStatus {
        match (&self.engine, self.initialized, &self.init_error) {
            (_, false, _) => EngineStatus::Pending,
            (_, true, Some(e)) => EngineStatus::Failed(e.clone()),
            (Some(_), true, None) => EngineStatus::Ready,
            (None, true, None) => EngineStatus::Closed,
        }
    }

    fn unavailable(&self) -> PlayerError {
        match self.status() {
            EngineStatus::Failed(e) => PlayerError::EngineInit(e),
            EngineStatus::Pending => PlayerError::EngineInit("still initializing".to_string()),
            EngineStatus::Closed | EngineStatus::Ready => {
                PlayerError::EngineInit("engine has been shut down".to_string())
            }
        }
    }
}

/// What `load` learned about the new track.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LoadedTrack {
    pub duration_secs: Option<f64>,
}

/// Cloneable handle to the engine slot. All clones share one lock.
#[derive(Clone, Default)]
pub struct EngineHandle {
    slot: Arc<Mutex<EngineSlot>>,
}

impl EngineHandle {
    fn lock(&self) -> MutexGuard<'_, EngineSlot> {
        // Engine calls do not panic half-way through a state change, so a
        // poisoned slot is still consistent.
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn with_engine<T>(&self, f: impl FnOnce(&mut dyn AudioEngine) -> T) -> Result<T> {
        let mut slot = self.lock();
        if let Some(engine) = slot.engine.as_deref_mut() {
            return Ok(f(engine));
        }
        Err(slot.unavailable())
    }

    /// Record the initializer's result. Returns whether the engine is usable.
    pub(super) fn complete_init(
        &self,
        result: std::result::Result<Box<dyn AudioEngine>, EngineError>,
    ) -> bool {
        let mut slot = self.lock();
        if slot.initialized {
            return slot.engine.is_some();
        }
        slot.initialized = true;
        match result {
            Ok(engine) => {
                slot.engine = Some(engine);
                slot.init_error = None;
                true
            }
            Err(e) => {
                slot.init_error = Some(e.to_string());
                false
            }
        }
    }

    pub fn status(&self) -> EngineStatus {
        self.lock().status()
    }

    /// `Ok` once the engine initialized successfully and is still open.
    pub fn ready(&self) -> Result<()> {
        let slot = self.lock();
        match slot.status() {
            EngineStatus::Ready => Ok(()),
            _ => Err(slot.unavailable()),
        }
    }

    /// Replace the loaded track with `track` and report its duration.
    pub fn load(&self, track: &Track) -> Result<LoadedTrack> {
        let loaded = self.with_engine(|engine| {
            engine.load(&track.path).map(|()| LoadedTrack {
                duration_secs: engine.duration_secs(),
            })
        })?;
        loaded.map_err(|source| PlayerError::TrackLoad {
            name: track.name.clone(),
            source,
        })
    }

    /// Apply volume and looping to the freshly loaded track and start it.
    pub fn start(&self, volume: f32, looping: bool) -> Result<()> {
        self.with_engine(|engine| {
            engine.set_volume(volume);
            engine.set_looping(looping);
            engine.start();
        })
    }

    pub fn pause(&self) -> Result<()> {
        self.with_engine(|engine| engine.stop())
    }

    pub fn resume(&self) -> Result<()> {
        self.with_engine(|engine| engine.start())
    }

    /// Elapsed seconds and end flag, read under one guard.
    pub fn position(&self) -> Result<Position> {
        self.with_engine(|engine| {
            engine.elapsed_secs().map(|elapsed_secs| Position {
                elapsed_secs,
                at_end: engine.at_end(),
            })
        })?
        .map_err(PlayerError::from)
    }

    pub fn seek(&self, secs: f64) -> Result<()> {
        self.with_engine(|engine| engine.seek_to_secs(secs))?
            .map_err(PlayerError::from)
    }

    /// No-op when nothing is loaded or the engine is unavailable.
    pub fn set_volume(&self, volume: f32) {
        let _ = self.with_engine(|engine| {
            if engine.is_loaded() {
                engine.set_volume(volume);
            }
        });
    }

    /// No-op when nothing is loaded or the engine is unavailable.
    pub fn set_looping(&self, looping: bool) {
        let _ = self.with_engine(|engine| {
            if engine.is_loaded() {
                engine.set_looping(looping);
            }
        });
    }

    pub fn is_loaded(&self) -> bool {
        self.with_engine(|engine| engine.is_loaded()).unwrap_or(false)
    }

    pub fn unload(&self) {
        let _ = self.with_engine(|engine| engine.unload());
    }

    /// Release the engine. Later calls report [`EngineStatus::Closed`].
    pub fn shutdown(&self) {
        let mut slot = self.lock();
        if let Some(mut engine) = slot.engine.take() {
            engine.shutdown();
            info!("audio engine released");
        } else {
            debug!("audio engine already released");
        }
    }
}
