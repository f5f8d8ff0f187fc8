use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, PoisonError};

use crate::audio::LoopMode;

use super::controller::PlayerState;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ReportLevel {
    Notice,
    Error,
}

/// Everything the front-end needs to redraw, pushed as it changes.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerEvent {
    StateChanged(PlayerState),
    /// Slider position, `0..=1000`.
    Progress(u16),
    /// Display names of the visible tracks, in order.
    ListChanged(Vec<String>),
    SelectionChanged(Option<usize>),
    /// Name of the loaded track, `None` when idle.
    NowPlaying(Option<String>),
    VolumeChanged(u8),
    LoopModeChanged(LoopMode),
    Report { level: ReportLevel, message: String },
}

/// Fan-out of [`PlayerEvent`]s to `mpsc` subscribers.
///
/// Clones share one subscriber list. Subscribers whose receiver is gone are
/// dropped on the next emit.
#[derive(Clone, Default)]
pub struct EventBus {
    subscribers: Arc<Mutex<Vec<Sender<PlayerEvent>>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> Receiver<PlayerEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers().push(tx);
        rx
    }

    pub fn emit(&self, event: PlayerEvent) {
        self.subscribers()
            .retain(|subscriber| subscriber.send(event.clone()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers().len()
    }

    fn subscribers(&self) -> std::sync::MutexGuard<'_, Vec<Sender<PlayerEvent>>> {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
