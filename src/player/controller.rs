use std::time::Instant;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use crate::audio::{EngineHandle, LoopMode};
use crate::catalog::TrackCatalog;
use crate::error::{PlayerError, Result};
use crate::library::Track;

use super::events::{EventBus, PlayerEvent};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum PlayerState {
    #[default]
    Stopped,
    Playing,
    Paused,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Direction {
    Next,
    Prev,
}

/// Per-track data, alive while a track is loaded.
#[derive(Debug, Clone)]
struct PlaybackSession {
    track: Track,
    /// `None` marks a stream without a usable length.
    duration: Option<f64>,
    last_progress_update: Option<Instant>,
    /// The end of this track was seen and acted on.
    finished: bool,
}

/// The playback state machine. The only caller of the engine's mutating operations.
pub struct PlaybackController {
    engine: EngineHandle,
    events: EventBus,
    state: PlayerState,
    current: Option<usize>,
    loop_mode: LoopMode,
    volume: u8,
    session: Option<PlaybackSession>,
    /// Bumped on every successful load.
    generation: u64,
    rng: StdRng,
}

impl PlaybackController {
    pub fn new(engine: EngineHandle, events: EventBus, loop_mode: LoopMode, volume: u8) -> Self {
        Self {
            engine,
            events,
            state: PlayerState::Stopped,
            current: None,
            loop_mode,
            volume: volume.min(100),
            session: None,
            generation: 0,
            rng: StdRng::from_os_rng(),
        }
    }

    /// Replace the random source, e.g. with a seeded one.
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    pub fn state(&self) -> PlayerState {
        self.state
    }

    pub fn current(&self) -> Option<usize> {
        self.current
    }

    pub fn loop_mode(&self) -> LoopMode {
        self.loop_mode
    }

    pub fn volume(&self) -> u8 {
        self.volume
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn has_track(&self) -> bool {
        self.session.is_some()
    }

    pub fn now_playing(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.track.name.as_str())
    }

    /// Cached length of the loaded track, `None` when unknown or nothing is loaded.
    pub fn duration(&self) -> Option<f64> {
        self.session.as_ref().and_then(|s| s.duration)
    }

    pub fn last_progress_update(&self) -> Option<Instant> {
        self.session.as_ref().and_then(|s| s.last_progress_update)
    }

    pub fn mark_progress(&mut self, now: Instant) {
        if let Some(session) = &mut self.session {
            session.last_progress_update = Some(now);
        }
    }

    /// Whether the end of the loaded track was already handled.
    pub fn end_handled(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.finished)
    }

    /// Record that the loaded track ended. Cleared by a new load, a seek or a resume.
    pub fn mark_finished(&mut self) {
        if let Some(session) = &mut self.session {
            session.finished = true;
        }
    }

    fn gain(&self) -> f32 {
        f32::from(self.volume) / 100.0
    }

    fn set_state(&mut self, state: PlayerState) {
        if self.state != state {
            debug!(from = ?self.state, to = ?state, "player state changed");
        }
        self.state = state;
        self.events.emit(PlayerEvent::StateChanged(state));
    }

    /// Load visible track `index` and start it from zero.
    ///
    /// Always reloads, even when `index` is already playing. On failure the
    /// state, selection and loaded track are left as they were.
    pub fn play(&mut self, catalog: &TrackCatalog, index: usize) -> Result<()> {
        self.engine.ready()?;
        let track = catalog
            .visible_track(index)
            .ok_or(PlayerError::InvalidIndex {
                index,
                len: catalog.visible_len(),
            })?
            .clone();

        let loaded = self.engine.load(&track)?;
        let duration = loaded.duration_secs.filter(|d| d.is_finite() && *d > 0.0);
        if duration.is_none() {
            debug!(track = %track.name, "track has no usable duration; progress disabled");
        }
        self.engine.start(self.gain(), self.loop_mode.repeats_track())?;

        info!(track = %track.name, index, "playing");
        self.generation += 1;
        self.current = Some(index);
        self.events.emit(PlayerEvent::SelectionChanged(Some(index)));
        self.events
            .emit(PlayerEvent::NowPlaying(Some(track.name.clone())));
        self.session = Some(PlaybackSession {
            track,
            duration,
            last_progress_update: None,
            finished: false,
        });
        self.set_state(PlayerState::Playing);
        self.events.emit(PlayerEvent::Progress(0));
        Ok(())
    }

    /// Pause, resume, or start the first visible track when nothing is loaded.
    pub fn toggle_play_pause(&mut self, catalog: &TrackCatalog) -> Result<()> {
        self.engine.ready()?;
        if !self.has_track() || !self.engine.is_loaded() {
            if catalog.is_empty() {
                return Err(PlayerError::EmptyCatalog);
            }
            return self.play(catalog, 0);
        }

        match self.state {
            PlayerState::Playing => {
                self.engine.pause()?;
                if let Some(session) = &mut self.session {
                    session.last_progress_update = None;
                }
                info!("paused");
                self.set_state(PlayerState::Paused);
            }
            PlayerState::Paused | PlayerState::Stopped => {
                self.engine.resume()?;
                self.mark_progress(Instant::now());
                if let Some(session) = &mut self.session {
                    session.finished = false;
                }
                info!("resumed");
                self.set_state(PlayerState::Playing);
            }
        }
        Ok(())
    }

    pub fn next(&mut self, catalog: &TrackCatalog) -> Result<()> {
        self.step(catalog, Direction::Next)
    }

    pub fn prev(&mut self, catalog: &TrackCatalog) -> Result<()> {
        self.step(catalog, Direction::Prev)
    }

    fn step(&mut self, catalog: &TrackCatalog, direction: Direction) -> Result<()> {
        self.engine.ready()?;
        let len = catalog.visible_len();
        if len == 0 {
            return Err(PlayerError::EmptyCatalog);
        }
        let target = self.target_index(len, direction);
        debug!(?direction, mode = self.loop_mode.label(), target, "stepping");
        self.play(catalog, target)
    }

    fn target_index(&mut self, len: usize, direction: Direction) -> usize {
        let current = self.current.filter(|&c| c < len);
        match (self.loop_mode, current) {
            (LoopMode::Random, current) => random_index(&mut self.rng, len, current),
            (LoopMode::Single, Some(c)) => c,
            (LoopMode::Single, None) => 0,
            (LoopMode::List, Some(c)) => match direction {
                Direction::Next => (c + 1) % len,
                Direction::Prev => (c + len - 1) % len,
            },
            (LoopMode::List, None) => match direction {
                Direction::Next => 0,
                Direction::Prev => len - 1,
            },
        }
    }

    /// Seek the playing track to `fraction` of its length.
    ///
    /// Returns `Ok(false)` when seeking is not possible right now (not
    /// playing, or the length is unknown).
    pub fn seek(&mut self, fraction: f64) -> Result<bool> {
        if self.state != PlayerState::Playing {
            return Ok(false);
        }
        let Some(duration) = self.duration() else {
            return Ok(false);
        };
        let secs = (fraction.clamp(0.0, 1.0) * duration).clamp(0.0, duration);
        self.engine.seek(secs)?;
        if let Some(session) = &mut self.session {
            session.last_progress_update = None;
            session.finished = false;
        }
        debug!(secs, "seeked");
        Ok(true)
    }

    pub fn set_volume(&mut self, percent: u8) {
        self.volume = percent.min(100);
        self.engine.set_volume(self.gain());
        debug!(volume = self.volume, "volume changed");
        self.events.emit(PlayerEvent::VolumeChanged(self.volume));
    }

    pub fn set_loop_mode(&mut self, mode: LoopMode) {
        self.loop_mode = mode;
        self.engine.set_looping(mode.repeats_track());
        info!(mode = mode.label(), "loop mode changed");
        self.events.emit(PlayerEvent::LoopModeChanged(mode));
    }

    /// Adopt the selection computed by the catalog after a list change.
    pub fn reconcile_selection(&mut self, selection: Option<usize>) {
        self.current = selection;
        self.events.emit(PlayerEvent::SelectionChanged(selection));
    }

    /// Unload the current track and go idle.
    pub fn release_track(&mut self) {
        self.engine.unload();
        if self.session.take().is_some() {
            debug!("track released");
        }
        self.set_state(PlayerState::Stopped);
        self.events.emit(PlayerEvent::NowPlaying(None));
    }
}

/// Uniform pick from `0..len` excluding `exclude`, without rejection sampling.
fn random_index(rng: &mut impl Rng, len: usize, exclude: Option<usize>) -> usize {
    if len <= 1 {
        return 0;
    }
    match exclude {
        Some(current) if current < len => {
            let pick = rng.random_range(0..len - 1);
            if pick >= current { pick + 1 } else { pick }
        }
        _ => rng.random_range(0..len),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_index_never_returns_the_excluded_index() {
        let mut rng = StdRng::seed_from_u64(7);
        for current in 0..5 {
            for _ in 0..200 {
                let pick = random_index(&mut rng, 5, Some(current));
                assert!(pick < 5);
                assert_ne!(pick, current);
            }
        }
    }

    #[test]
    fn random_index_with_one_track_is_zero() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(random_index(&mut rng, 1, Some(0)), 0);
        assert_eq!(random_index(&mut rng, 1, None), 0);
    }

    #[test]
    fn random_index_reaches_every_other_track() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut seen = [false; 4];
        for _ in 0..500 {
            seen[random_index(&mut rng, 4, Some(2))] = true;
        }
        assert_eq!(seen, [true, true, false, true]);
    }
}
