use std::path::Path;
use std::sync::mpsc::Receiver;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::debug;

use crate::app::{App, InputMode};
use crate::audio::LoopMode;
use crate::config;
use crate::library;
use crate::player::{PlayerEvent, StepDirection};
use crate::session::{Command, PlayerSession};
use crate::ui;

/// Upper bound on how long one iteration waits for input.
const INPUT_POLL: Duration = Duration::from_millis(50);

/// Main terminal event loop: drains player events, redraws, handles input
/// and drives the progress timer. Returns `Ok(())` when the user quits.
pub fn run(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    settings: &config::Settings,
    app: &mut App,
    session: &mut PlayerSession,
    events: &Receiver<PlayerEvent>,
    music_dir: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        while let Ok(event) = events.try_recv() {
            app.apply(event);
        }

        terminal.draw(|f| ui::draw(f, app))?;

        let timeout = session
            .next_tick_in(Instant::now())
            .map_or(INPUT_POLL, |due| due.min(INPUT_POLL));
        if event::poll(timeout)?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
            && handle_key_event(key, settings, app, session, music_dir)
        {
            break;
        }

        session.poll_timer(Instant::now());
    }

    Ok(())
}

/// Handle one key press. Returns `true` when the user asked to quit.
fn handle_key_event(
    key: KeyEvent,
    settings: &config::Settings,
    app: &mut App,
    session: &mut PlayerSession,
    music_dir: &Path,
) -> bool {
    match app.mode {
        InputMode::Search => {
            handle_search_key(key, app, session);
            false
        }
        InputMode::Scrub => {
            handle_scrub_key(key, settings, app, session);
            false
        }
        InputMode::Normal => handle_normal_key(key, settings, app, session, music_dir),
    }
}

fn handle_search_key(key: KeyEvent, app: &mut App, session: &mut PlayerSession) {
    match key.code {
        KeyCode::Esc => app.cancel_search(),
        KeyCode::Backspace => app.pop_search_char(),
        KeyCode::Enter => {
            let keyword = app.submit_search();
            session.dispatch(Command::Search(keyword), Instant::now());
        }
        KeyCode::Char(c) if !c.is_control() => app.push_search_char(c),
        _ => {}
    }
}

fn handle_scrub_key(
    key: KeyEvent,
    settings: &config::Settings,
    app: &mut App,
    session: &mut PlayerSession,
) {
    let step = i32::from(settings.progress.drag_step_permille);
    match key.code {
        KeyCode::Char('h') | KeyCode::Left => {
            session.dispatch(Command::SeekMove(app.scrub_target(-step)), Instant::now());
        }
        KeyCode::Char('l') | KeyCode::Right => {
            session.dispatch(Command::SeekMove(app.scrub_target(step)), Instant::now());
        }
        KeyCode::Enter | KeyCode::Esc | KeyCode::Char('s') => {
            app.end_scrub();
            session.dispatch(Command::SeekEnd, Instant::now());
        }
        _ => {}
    }
}

fn handle_normal_key(
    key: KeyEvent,
    settings: &config::Settings,
    app: &mut App,
    session: &mut PlayerSession,
    music_dir: &Path,
) -> bool {
    let now = Instant::now();
    let command = match key.code {
        KeyCode::Char('q') => return true,
        KeyCode::Char('j') | KeyCode::Down => {
            app.cursor_down();
            None
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.cursor_up();
            None
        }
        KeyCode::Char('g') | KeyCode::Home => {
            app.cursor_top();
            None
        }
        KeyCode::Char('G') | KeyCode::End => {
            app.cursor_bottom();
            None
        }
        KeyCode::Enter => app.has_rows().then_some(Command::Play(app.cursor)),
        KeyCode::Char(' ') | KeyCode::Char('p') => Some(Command::TogglePlayPause),
        KeyCode::Char('l') => Some(Command::Next),
        KeyCode::Char('h') => Some(Command::Prev),
        KeyCode::Char('+') | KeyCode::Char('=') => {
            Some(Command::SetVolume(app.volume_up(settings.ui.volume_step)))
        }
        KeyCode::Char('-') => Some(Command::SetVolume(app.volume_down(settings.ui.volume_step))),
        KeyCode::Char(']') => Some(Command::SeekStep(StepDirection::Forward)),
        KeyCode::Char('[') => Some(Command::SeekStep(StepDirection::Back)),
        KeyCode::Char('s') => {
            app.begin_scrub();
            Some(Command::SeekBegin)
        }
        KeyCode::Char('1') => Some(Command::SetLoopMode(LoopMode::Single)),
        KeyCode::Char('2') => Some(Command::SetLoopMode(LoopMode::List)),
        KeyCode::Char('3') => Some(Command::SetLoopMode(LoopMode::Random)),
        KeyCode::Char('m') => Some(Command::SetLoopMode(app.loop_mode.cycled())),
        KeyCode::Char('R') => {
            debug!(dir = %music_dir.display(), "rescanning");
            Some(Command::Rescan(library::scan(music_dir, &settings.library)))
        }
        KeyCode::Char('/') => {
            app.begin_search();
            None
        }
        _ => None,
    };

    if let Some(command) = command {
        session.dispatch(command, now);
    }
    false
}
