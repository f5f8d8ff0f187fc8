//! In-memory engine used by the controller and session tests.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::EngineError;

use super::engine::{AudioEngine, EngineFactory};

pub const DEFAULT_DURATION: f64 = 180.0;

#[derive(Debug, Default)]
pub struct FakeState {
    pub loads: Vec<PathBuf>,
    /// Every `load` call, failed ones included.
    pub load_attempts: usize,
    pub loaded: Option<PathBuf>,
    pub live_tracks: usize,
    pub max_live_tracks: usize,
    pub playing: bool,
    pub elapsed: f64,
    pub at_end: bool,
    pub volume: f32,
    pub looping: bool,
    pub seeks: Vec<f64>,
    pub fail_seeks: bool,
    pub shut_down: bool,
    /// File names whose load fails with a decode error.
    pub failing: Vec<String>,
    /// Per-file-name duration; `0.0` means the stream reports none.
    pub durations: HashMap<String, f64>,
}

/// Engine whose state is shared with the test through [`FakeEngine::state`].
#[derive(Clone, Default)]
pub struct FakeEngine {
    state: Arc<Mutex<FakeState>>,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_position(&self, elapsed: f64, at_end: bool) {
        let mut state = self.state();
        state.elapsed = elapsed;
        state.at_end = at_end;
    }

    pub fn fail_loading(&self, name: &str) {
        self.state().failing.push(name.to_string());
    }

    pub fn set_duration(&self, name: &str, secs: f64) {
        self.state().durations.insert(name.to_string(), secs);
    }

    pub fn loaded_name(&self) -> Option<String> {
        self.state()
            .loaded
            .as_ref()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
    }

    pub fn factory(&self) -> FakeFactory {
        FakeFactory {
            engine: self.clone(),
            fail_init: None,
        }
    }

    pub fn failing_factory(&self, message: &str) -> FakeFactory {
        FakeFactory {
            engine: self.clone(),
            fail_init: Some(message.to_string()),
        }
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

impl AudioEngine for FakeEngine {
    fn load(&mut self, path: &Path) -> Result<(), EngineError> {
        let mut state = self.state();
        state.load_attempts += 1;
        let name = file_name(path);
        if state.failing.contains(&name) {
            return Err(EngineError::Decode(format!("{name} is not audio")));
        }
        if state.loaded.take().is_some() {
            state.live_tracks -= 1;
        }
        state.loads.push(path.to_path_buf());
        state.loaded = Some(path.to_path_buf());
        state.live_tracks += 1;
        state.max_live_tracks = state.max_live_tracks.max(state.live_tracks);
        state.playing = false;
        state.elapsed = 0.0;
        state.at_end = false;
        Ok(())
    }

    fn unload(&mut self) {
        let mut state = self.state();
        if state.loaded.take().is_some() {
            state.live_tracks -= 1;
        }
        state.playing = false;
    }

    fn is_loaded(&self) -> bool {
        self.state().loaded.is_some()
    }

    fn start(&mut self) {
        let mut state = self.state();
        if state.loaded.is_some() {
            state.playing = true;
        }
    }

    fn stop(&mut self) {
        self.state().playing = false;
    }

    fn elapsed_secs(&self) -> Result<f64, EngineError> {
        let state = self.state();
        match state.loaded {
            Some(_) => Ok(state.elapsed),
            None => Err(EngineError::NotLoaded),
        }
    }

    fn duration_secs(&self) -> Option<f64> {
        let state = self.state();
        let name = file_name(state.loaded.as_ref()?);
        let secs = state
            .durations
            .get(&name)
            .copied()
            .unwrap_or(DEFAULT_DURATION);
        (secs > 0.0).then_some(secs)
    }

    fn at_end(&self) -> bool {
        self.state().at_end
    }

    fn seek_to_secs(&mut self, secs: f64) -> Result<(), EngineError> {
        let mut state = self.state();
        if state.loaded.is_none() {
            return Err(EngineError::NotLoaded);
        }
        if state.fail_seeks {
            return Err(EngineError::Seek("not seekable".to_string()));
        }
        state.seeks.push(secs);
        state.elapsed = secs;
        state.at_end = false;
        Ok(())
    }

    fn set_volume(&mut self, volume: f32) {
        self.state().volume = volume;
    }

    fn set_looping(&mut self, looping: bool) {
        self.state().looping = looping;
    }

    fn shutdown(&mut self) {
        self.unload();
        self.state().shut_down = true;
    }
}

pub struct FakeFactory {
    engine: FakeEngine,
    fail_init: Option<String>,
}

impl EngineFactory for FakeFactory {
    type Guard = ();

    fn open(self) -> Result<(Box<dyn AudioEngine>, ()), EngineError> {
        match self.fail_init {
            Some(message) => Err(EngineError::Device(message)),
            None => Ok((Box::new(self.engine), ())),
        }
    }
}
