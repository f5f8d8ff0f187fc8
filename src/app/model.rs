//! Application model: the front-end's copy of the player state.
//!
//! `App` is rebuilt purely from [`PlayerEvent`]s plus local input state
//! (cursor, search line, scrub mode). It never talks to the engine.

use crate::audio::LoopMode;
use crate::player::{PROGRESS_MAX, PlayerEvent, PlayerState, ReportLevel};

/// What keystrokes currently edit.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum InputMode {
    #[default]
    Normal,
    /// Typing a search keyword.
    Search,
    /// Dragging the progress slider.
    Scrub,
}

/// The main application model.
#[derive(Debug, Default)]
pub struct App {
    pub names: Vec<String>,
    /// Highlighted row, moved freely by the user.
    pub cursor: usize,
    /// Row of the loaded track, as reported by the player.
    pub selection: Option<usize>,
    pub state: PlayerState,
    /// Slider position, `0..=1000`.
    pub progress: u16,
    pub volume: u8,
    pub loop_mode: LoopMode,
    pub now_playing: Option<String>,
    pub header_text: String,
    pub mode: InputMode,
    pub search_input: String,
    /// Keyword of the last submitted search.
    pub active_keyword: String,
    pub message: Option<(ReportLevel, String)>,
    pub music_dir: Option<String>,
}

impl App {
    pub fn new(header_text: impl Into<String>) -> Self {
        Self {
            header_text: header_text.into(),
            ..Self::default()
        }
    }

    pub fn set_music_dir(&mut self, dir: String) {
        self.music_dir = Some(dir);
    }

    pub fn set_message(&mut self, level: ReportLevel, message: impl Into<String>) {
        self.message = Some((level, message.into()));
    }

    /// Fold one player event into the model.
    pub fn apply(&mut self, event: PlayerEvent) {
        match event {
            PlayerEvent::StateChanged(state) => self.state = state,
            PlayerEvent::Progress(position) => self.progress = position.min(PROGRESS_MAX),
            PlayerEvent::ListChanged(names) => {
                self.names = names;
                self.clamp_cursor();
            }
            PlayerEvent::SelectionChanged(selection) => {
                self.selection = selection;
                if let Some(i) = selection {
                    self.cursor = i;
                }
            }
            PlayerEvent::NowPlaying(name) => self.now_playing = name,
            PlayerEvent::VolumeChanged(volume) => self.volume = volume,
            PlayerEvent::LoopModeChanged(mode) => self.loop_mode = mode,
            PlayerEvent::Report { level, message } => self.message = Some((level, message)),
        }
    }

    /// Header text: the loaded track while one is loaded, the idle text otherwise.
    pub fn title(&self) -> String {
        match &self.now_playing {
            Some(name) => format!("playing: {name}"),
            None => self.header_text.clone(),
        }
    }

    pub fn state_label(&self) -> &'static str {
        match self.state {
            PlayerState::Stopped => "stopped",
            PlayerState::Playing => "playing",
            PlayerState::Paused => "paused",
        }
    }

    fn clamp_cursor(&mut self) {
        if self.cursor >= self.names.len() {
            self.cursor = self.names.len().saturating_sub(1);
        }
    }

    pub fn has_rows(&self) -> bool {
        !self.names.is_empty()
    }

    /// Move the cursor down one row, stopping at the bottom.
    pub fn cursor_down(&mut self) {
        if self.cursor + 1 < self.names.len() {
            self.cursor += 1;
        }
    }

    pub fn cursor_up(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn cursor_top(&mut self) {
        self.cursor = 0;
    }

    pub fn cursor_bottom(&mut self) {
        self.cursor = self.names.len().saturating_sub(1);
    }

    pub fn volume_up(&self, step: u8) -> u8 {
        self.volume.saturating_add(step).min(100)
    }

    pub fn volume_down(&self, step: u8) -> u8 {
        self.volume.saturating_sub(step)
    }

    /// Open the search line, pre-filled with the active keyword.
    pub fn begin_search(&mut self) {
        self.mode = InputMode::Search;
        self.search_input = self.active_keyword.clone();
    }

    pub fn push_search_char(&mut self, c: char) {
        self.search_input.push(c);
    }

    pub fn pop_search_char(&mut self) {
        self.search_input.pop();
    }

    /// Leave the search line without applying it.
    pub fn cancel_search(&mut self) {
        self.mode = InputMode::Normal;
        self.search_input.clear();
    }

    /// Leave the search line and return the keyword to apply.
    pub fn submit_search(&mut self) -> String {
        self.mode = InputMode::Normal;
        self.active_keyword = std::mem::take(&mut self.search_input);
        self.active_keyword.clone()
    }

    pub fn begin_scrub(&mut self) {
        self.mode = InputMode::Scrub;
    }

    /// Slider position after moving `delta` thousandths from the current one.
    pub fn scrub_target(&self, delta: i32) -> u16 {
        let target = i32::from(self.progress) + delta;
        target.clamp(0, i32::from(PROGRESS_MAX)) as u16
    }

    pub fn end_scrub(&mut self) {
        self.mode = InputMode::Normal;
    }
}
