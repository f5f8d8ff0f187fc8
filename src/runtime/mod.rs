use std::env;

use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::info;

use crate::app::App;
use crate::audio::RodioFactory;
use crate::player::EventBus;
use crate::session::PlayerSession;
use crate::ui;

mod event_loop;
mod settings;
mod startup;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let settings = settings::load_settings();
    let log_path = startup::init_logging(&settings.log);
    info!(log = ?log_path, "tuneloop starting");

    let music_dir = startup::resolve_music_dir(env::args().nth(1), &settings.library);
    let (tracks, startup_message) = startup::load_library(&music_dir, &settings.library);

    // The device opens in the background while the terminal is set up.
    let bus = EventBus::new();
    let events = bus.subscribe();
    let pending = PlayerSession::start(
        RodioFactory::new(settings.engine.clone()),
        tracks,
        bus,
        &settings,
    );

    let mut app = App::new(settings.ui.header_text.clone());
    app.set_music_dir(music_dir.display().to_string());
    if let Some((level, message)) = startup_message {
        app.set_message(level, message);
    }

    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let run_result: Result<(), Box<dyn std::error::Error>> = (|| {
        terminal.draw(|f| ui::draw(f, &app))?;
        let mut session = pending.wait();
        let result = event_loop::run(
            &mut terminal,
            &settings,
            &mut app,
            &mut session,
            &events,
            &music_dir,
        );
        session.close();
        result
    })();

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    info!("tuneloop exiting");
    run_result
}
