//! One playback session: created when the UI opens, consumed when it closes.
//!
//! The session owns the engine handle, the initializer thread, the catalog,
//! the controller and the progress monitor. Front-ends drive it with
//! [`Command`]s and timer polls and listen to [`PlayerEvent`]s.

use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use crate::audio::{EngineFactory, EngineHandle, EngineInitializer, LoopMode};
use crate::catalog::TrackCatalog;
use crate::config::Settings;
use crate::error::{PlayerError, Result};
use crate::library::Track;
use crate::player::{
    EventBus, PlaybackController, PlayerEvent, PlayerState, ProgressMonitor, ProgressTimer,
    ReportLevel, StepDirection, TickOutcome,
};

/// User intents accepted by [`PlayerSession::dispatch`].
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Play the visible track at this index.
    Play(usize),
    TogglePlayPause,
    Next,
    Prev,
    /// Volume in percent; values above 100 are clamped.
    SetVolume(u8),
    SeekBegin,
    /// Slider position while dragging, `0..=1000`.
    SeekMove(u16),
    SeekEnd,
    SeekStep(StepDirection),
    SetLoopMode(LoopMode),
    Search(String),
    /// Replace the scanned tracks, keeping the keyword.
    Rescan(Vec<Track>),
}

/// A session whose engine may still be initializing. Call [`wait`](Self::wait)
/// before sending commands.
pub struct PendingSession {
    session: PlayerSession,
}

impl PendingSession {
    /// Block until the engine initializer has finished.
    ///
    /// An initialization failure is reported once here; the session is still
    /// returned and every later playback command reports it again.
    pub fn wait(self) -> PlayerSession {
        let mut session = self.session;
        let outcome = session.initializer.wait();
        session.announce();
        match outcome {
            Ok(()) => info!(
                engine = ?session.engine.status(),
                subscribers = session.events.subscriber_count(),
                "player session ready"
            ),
            Err(e) => session.report(&e),
        }
        session
    }
}

pub struct PlayerSession {
    engine: EngineHandle,
    initializer: EngineInitializer,
    events: EventBus,
    catalog: TrackCatalog,
    controller: PlaybackController,
    monitor: ProgressMonitor,
    timer: ProgressTimer,
    last_generation: u64,
}

impl PlayerSession {
    /// Spawn the engine initializer and build the session around it.
    pub fn start<F: EngineFactory>(
        factory: F,
        tracks: Vec<Track>,
        events: EventBus,
        settings: &Settings,
    ) -> PendingSession {
        let engine = EngineHandle::default();
        let initializer = EngineInitializer::spawn(engine.clone(), factory);
        let controller = PlaybackController::new(
            engine.clone(),
            events.clone(),
            settings.playback.loop_mode.into(),
            settings.playback.volume,
        );
        let monitor = ProgressMonitor::new(engine.clone(), events.clone(), &settings.progress);
        let timer = ProgressTimer::new(Duration::from_millis(settings.progress.tick_ms.max(1)));
        debug!(tracks = tracks.len(), "starting player session");

        PendingSession {
            session: Self {
                engine,
                initializer,
                events,
                catalog: TrackCatalog::new(tracks),
                controller,
                monitor,
                timer,
                last_generation: 0,
            },
        }
    }

    pub fn state(&self) -> PlayerState {
        self.controller.state()
    }

    pub fn selection(&self) -> Option<usize> {
        self.controller.current()
    }

    pub fn catalog(&self) -> &TrackCatalog {
        &self.catalog
    }

    // Full snapshot for a freshly attached front-end.
    fn announce(&self) {
        self.events
            .emit(PlayerEvent::ListChanged(self.catalog.visible_names()));
        self.events
            .emit(PlayerEvent::SelectionChanged(self.controller.current()));
        self.events
            .emit(PlayerEvent::StateChanged(self.controller.state()));
        self.events.emit(PlayerEvent::NowPlaying(
            self.controller.now_playing().map(str::to_string),
        ));
        self.events
            .emit(PlayerEvent::VolumeChanged(self.controller.volume()));
        self.events
            .emit(PlayerEvent::LoopModeChanged(self.controller.loop_mode()));
        self.events.emit(PlayerEvent::Progress(0));
    }

    /// Run one command. Failures are reported, never returned.
    pub fn dispatch(&mut self, command: Command, now: Instant) {
        let result = self.apply(command, now);
        if let Err(e) = result {
            self.report(&e);
        }
        self.sync_timer(now);
    }

    fn apply(&mut self, command: Command, now: Instant) -> Result<()> {
        match command {
            Command::Play(index) => self.controller.play(&self.catalog, index),
            Command::TogglePlayPause => self.controller.toggle_play_pause(&self.catalog),
            Command::Next => self.controller.next(&self.catalog),
            Command::Prev => self.controller.prev(&self.catalog),
            Command::SetVolume(percent) => {
                self.controller.set_volume(percent);
                Ok(())
            }
            Command::SeekBegin => {
                self.monitor.seek_begin();
                Ok(())
            }
            Command::SeekMove(position) => {
                self.monitor.seek_move(position);
                Ok(())
            }
            Command::SeekEnd => self
                .monitor
                .seek_end(&mut self.controller, &self.catalog, now),
            Command::SeekStep(direction) => {
                self.monitor
                    .seek_step(direction, &mut self.controller, &self.catalog, now)
            }
            Command::SetLoopMode(mode) => {
                self.controller.set_loop_mode(mode);
                Ok(())
            }
            Command::Search(keyword) => {
                let selection = self.catalog.search(&keyword, self.controller.current());
                info!(
                    keyword = %self.catalog.keyword(),
                    visible = self.catalog.visible_len(),
                    "search applied"
                );
                self.list_changed(selection);
                Ok(())
            }
            Command::Rescan(tracks) => {
                let selection = self.catalog.replace(tracks, self.controller.current());
                info!(
                    total = self.catalog.all().len(),
                    visible = self.catalog.visible_len(),
                    "library rescanned"
                );
                self.list_changed(selection);
                Ok(())
            }
        }
    }

    fn list_changed(&mut self, selection: Option<usize>) {
        self.events
            .emit(PlayerEvent::ListChanged(self.catalog.visible_names()));
        self.controller.reconcile_selection(selection);
    }

    // Every successful load (re)arms the progress timer.
    fn sync_timer(&mut self, now: Instant) {
        let generation = self.controller.generation();
        if generation != self.last_generation {
            self.last_generation = generation;
            self.timer.start(now);
        }
    }

    /// Run the progress tick if the timer is due.
    pub fn poll_timer(&mut self, now: Instant) -> Option<TickOutcome> {
        if !self.timer.poll(now) {
            return None;
        }
        Some(self.tick(now))
    }

    /// Run the progress tick unconditionally.
    pub fn tick(&mut self, now: Instant) -> TickOutcome {
        let outcome = self
            .monitor
            .tick(&mut self.controller, &self.catalog, now)
            .unwrap_or_else(|e| {
                self.report(&e);
                TickOutcome::Skipped
            });
        self.sync_timer(now);
        outcome
    }

    /// How long the event loop may sleep before the next tick is due.
    pub fn next_tick_in(&self, now: Instant) -> Option<Duration> {
        self.timer.time_until_due(now)
    }

    fn report(&self, err: &PlayerError) {
        let level = match err {
            PlayerError::InvalidIndex { .. } => {
                debug!(error = %err, "ignoring play request");
                return;
            }
            err if err.is_notice() => {
                info!(error = %err, "notice");
                ReportLevel::Notice
            }
            PlayerError::EngineInit(_) => {
                error!(error = %err, "audio engine unavailable");
                ReportLevel::Error
            }
            _ => {
                warn!(error = %err, "command failed");
                ReportLevel::Error
            }
        };
        self.events.emit(PlayerEvent::Report {
            level,
            message: err.to_string(),
        });
    }

    /// Tear down in order: timer, loaded track, output stream, engine.
    pub fn close(mut self) {
        self.timer.stop();
        self.controller.release_track();
        self.initializer.release_and_join();
        self.engine.shutdown();
        info!("player session closed");
    }
}
