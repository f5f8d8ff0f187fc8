use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::audio::EngineHandle;
use crate::catalog::TrackCatalog;
use crate::config::ProgressSettings;
use crate::error::Result;

use super::controller::{PlaybackController, PlayerState};
use super::events::{EventBus, PlayerEvent};

/// Slider resolution.
pub const PROGRESS_MAX: u16 = 1000;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// A guard or the throttle held the tick back.
    Skipped,
    Updated,
    /// The track ended and the controller moved on.
    Advanced,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum StepDirection {
    Back,
    Forward,
}

/// Turns timer ticks into progress updates and end-of-track advances, and
/// owns the slider while the user drags it.
pub struct ProgressMonitor {
    engine: EngineHandle,
    events: EventBus,
    dragging: bool,
    /// Where the slider is drawn, possibly mid-drag.
    position: u16,
    /// Last position derived from the engine.
    reported: u16,
    generation: u64,
    throttle: Duration,
    end_threshold: f64,
    step: u16,
}

impl ProgressMonitor {
    pub fn new(engine: EngineHandle, events: EventBus, settings: &ProgressSettings) -> Self {
        Self {
            engine,
            events,
            dragging: false,
            position: 0,
            reported: 0,
            generation: 0,
            throttle: Duration::from_millis(settings.throttle_ms),
            end_threshold: settings.end_threshold_secs,
            step: settings.step_permille.min(PROGRESS_MAX),
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn position(&self) -> u16 {
        self.position
    }

    // A new track starts at zero; forget the old slider.
    fn follow(&mut self, controller: &PlaybackController) {
        if controller.generation() != self.generation {
            self.generation = controller.generation();
            self.reported = 0;
            if !self.dragging {
                self.position = 0;
            }
        }
    }

    fn report(&mut self, position: u16) {
        self.reported = position;
        self.position = position;
        self.events.emit(PlayerEvent::Progress(position));
    }

    /// Handle one timer tick.
    pub fn tick(
        &mut self,
        controller: &mut PlaybackController,
        catalog: &TrackCatalog,
        now: Instant,
    ) -> Result<TickOutcome> {
        self.follow(controller);
        if self.dragging || controller.state() != PlayerState::Playing {
            return Ok(TickOutcome::Skipped);
        }
        let Some(duration) = controller.duration() else {
            return Ok(TickOutcome::Skipped);
        };
        if self.engine.ready().is_err() || !self.engine.is_loaded() {
            return Ok(TickOutcome::Skipped);
        }
        if let Some(last) = controller.last_progress_update()
            && now.saturating_duration_since(last) < self.throttle
        {
            return Ok(TickOutcome::Skipped);
        }
        controller.mark_progress(now);
        self.recompute(controller, catalog, duration)
    }

    fn recompute(
        &mut self,
        controller: &mut PlaybackController,
        catalog: &TrackCatalog,
        duration: f64,
    ) -> Result<TickOutcome> {
        // The lock is released when `position` returns.
        let position = self.engine.position()?;
        let elapsed = position.elapsed_secs.clamp(0.0, duration);
        self.report(to_permille(elapsed, duration));

        if elapsed >= duration - self.end_threshold && position.at_end {
            // A failed advance is not retried; the user moves on by hand.
            if controller.end_handled() {
                return Ok(TickOutcome::Updated);
            }
            info!(elapsed, duration, "track finished");
            controller.mark_finished();
            controller.next(catalog)?;
            self.follow(controller);
            return Ok(TickOutcome::Advanced);
        }
        Ok(TickOutcome::Updated)
    }

    pub fn seek_begin(&mut self) {
        self.dragging = true;
        self.position = self.reported;
    }

    /// Move the slider during a drag. Ignored when no drag is active.
    pub fn seek_move(&mut self, position: u16) {
        if !self.dragging {
            return;
        }
        self.position = position.min(PROGRESS_MAX);
        self.events.emit(PlayerEvent::Progress(self.position));
    }

    /// Finish the drag and seek to the slider position.
    pub fn seek_end(
        &mut self,
        controller: &mut PlaybackController,
        catalog: &TrackCatalog,
        now: Instant,
    ) -> Result<()> {
        if !self.dragging {
            return Ok(());
        }
        self.dragging = false;
        self.apply_seek(controller, catalog, now)
    }

    /// Nudge the slider by one step and seek. Ignored mid-drag.
    pub fn seek_step(
        &mut self,
        direction: StepDirection,
        controller: &mut PlaybackController,
        catalog: &TrackCatalog,
        now: Instant,
    ) -> Result<()> {
        if self.dragging {
            return Ok(());
        }
        self.follow(controller);
        self.position = match direction {
            StepDirection::Back => self.reported.saturating_sub(self.step),
            StepDirection::Forward => (self.reported + self.step).min(PROGRESS_MAX),
        };
        self.apply_seek(controller, catalog, now)
    }

    fn apply_seek(
        &mut self,
        controller: &mut PlaybackController,
        catalog: &TrackCatalog,
        now: Instant,
    ) -> Result<()> {
        let fraction = f64::from(self.position) / f64::from(PROGRESS_MAX);
        match controller.seek(fraction) {
            Ok(true) => {
                self.report(self.position);
                // Recompute once right away, regardless of the throttle.
                controller.mark_progress(now);
                if let Some(duration) = controller.duration() {
                    self.recompute(controller, catalog, duration)?;
                }
                Ok(())
            }
            Ok(false) => {
                debug!("seek ignored; nothing seekable is playing");
                self.snap_back();
                Ok(())
            }
            Err(e) => {
                self.snap_back();
                Err(e)
            }
        }
    }

    fn snap_back(&mut self) {
        let reported = self.reported;
        self.report(reported);
    }
}

fn to_permille(elapsed: f64, duration: f64) -> u16 {
    if duration <= 0.0 {
        return 0;
    }
    let permille = (elapsed / duration * f64::from(PROGRESS_MAX)).round();
    permille.clamp(0.0, f64::from(PROGRESS_MAX)) as u16
}

/// Fixed-period tick source polled from the event loop.
#[derive(Debug)]
pub struct ProgressTimer {
    period: Duration,
    next_due: Option<Instant>,
}

impl ProgressTimer {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            next_due: None,
        }
    }

    /// Arm the timer, restarting the period if it was already running.
    /// A period too long to represent leaves the timer stopped.
    pub fn start(&mut self, now: Instant) {
        self.next_due = now.checked_add(self.period);
    }

    pub fn stop(&mut self) {
        self.next_due = None;
    }

    pub fn is_running(&self) -> bool {
        self.next_due.is_some()
    }

    /// Whether a tick is due at `now`. Late ticks collapse into one.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.next_due {
            Some(due) if now >= due => {
                self.next_due = due
                    .checked_add(self.period)
                    .filter(|next| *next > now)
                    .or_else(|| now.checked_add(self.period));
                true
            }
            _ => false,
        }
    }

    pub fn time_until_due(&self, now: Instant) -> Option<Duration> {
        self.next_due.map(|due| due.saturating_duration_since(now))
    }
}
