//! UI rendering helpers for the terminal user interface.
//!
//! This module contains functions to render the TUI using `ratatui`.

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Modifier, Style},
    widgets::{Block, Borders, Gauge, List, ListItem, ListState, Padding, Paragraph, Wrap},
};

use crate::app::{App, InputMode};
use crate::player::{PROGRESS_MAX, ReportLevel};

const CONTROLS: &[(&str, &str)] = &[
    ("j/k", "up/down"),
    ("g/G", "top/bottom"),
    ("enter", "play"),
    ("space/p", "play/pause"),
    ("h/l", "prev/next"),
    ("[/]", "seek -/+"),
    ("s", "scrub"),
    ("+/-", "volume"),
    ("1/2/3/m", "loop mode"),
    ("/", "search"),
    ("R", "rescan"),
    ("q", "quit"),
];

fn controls_text(mode: InputMode) -> String {
    match mode {
        InputMode::Normal => CONTROLS
            .iter()
            .map(|(k, v)| format!("[{k}] {v}"))
            .collect::<Vec<String>>()
            .join(" | "),
        InputMode::Search => "type a keyword | [enter] apply | [esc] cancel".to_string(),
        InputMode::Scrub => "[h/l] move | [enter/s/esc] release and seek".to_string(),
    }
}

fn status_text(app: &App) -> String {
    let mut parts: Vec<String> = vec![
        format!("STATE: {}", app.state_label()),
        format!("VOLUME: {}%", app.volume),
        format!("LOOP: {}", app.loop_mode.label()),
    ];

    match app.mode {
        InputMode::Search => parts.push(format!("SEARCH: {}_", app.search_input)),
        _ if !app.active_keyword.is_empty() => {
            parts.push(format!("SEARCH: {}", app.active_keyword))
        }
        _ => {}
    }

    if let Some(dir) = &app.music_dir {
        parts.push(format!("DIR: {dir}"));
    }

    parts.join(" • ")
}

/// Render the entire UI into the provided `frame`.
pub fn draw(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(4),
            Constraint::Min(1),
            Constraint::Length(3),
            Constraint::Length(4),
        ])
        .split(frame.area());

    let header = Paragraph::new(app.title())
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" tuneloop ")
                .title_alignment(Alignment::Center),
        );
    frame.render_widget(header, chunks[0]);

    let mut status_lines = vec![status_text(app)];
    if let Some((level, message)) = &app.message {
        let prefix = match level {
            ReportLevel::Notice => "note",
            ReportLevel::Error => "error",
        };
        status_lines.push(format!("{prefix}: {message}"));
    }
    let status = Paragraph::new(status_lines.join("\n"))
        .block(
            Block::bordered()
                .padding(Padding {
                    left: 1,
                    right: 0,
                    top: 0,
                    bottom: 0,
                })
                .title(" status "),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(status, chunks[1]);

    // Only the rows around the cursor are turned into ListItems.
    {
        let total = app.names.len();
        let list_height = chunks[2].height.saturating_sub(2) as usize;
        let (start, end) = if total <= list_height || list_height == 0 {
            (0, total)
        } else {
            let half = list_height / 2;
            let mut start = app.cursor.saturating_sub(half);
            if start + list_height > total {
                start = total - list_height;
            }
            (start, start + list_height)
        };

        let items: Vec<ListItem> = app.names[start..end]
            .iter()
            .enumerate()
            .map(|(offset, name)| {
                let item = ListItem::new(name.as_str());
                if app.selection == Some(start + offset) {
                    item.style(Style::default().add_modifier(Modifier::BOLD))
                } else {
                    item
                }
            })
            .collect();

        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title(" tracks "))
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
            .highlight_symbol("> ");
        let mut state = ListState::default();
        if total > 0 {
            state.select(Some(app.cursor.min(total - 1) - start));
        }
        frame.render_stateful_widget(list, chunks[2], &mut state);
    }

    let title = match app.mode {
        InputMode::Scrub => " progress (scrubbing) ",
        _ => " progress ",
    };
    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title(title))
        .ratio(f64::from(app.progress.min(PROGRESS_MAX)) / f64::from(PROGRESS_MAX));
    frame.render_widget(gauge, chunks[3]);

    let footer = Paragraph::new(controls_text(app.mode))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" controls ")
                .padding(Padding {
                    left: 1,
                    right: 0,
                    top: 0,
                    bottom: 0,
                }),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(footer, chunks[4]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::PlayerEvent;
    use ratatui::{Terminal, backend::TestBackend};

    #[test]
    fn status_shows_state_volume_loop_and_keyword() {
        let mut app = App::new("idle");
        app.apply(PlayerEvent::VolumeChanged(70));
        app.active_keyword = "mix".into();
        let text = status_text(&app);
        assert!(text.contains("STATE: stopped"));
        assert!(text.contains("VOLUME: 70%"));
        assert!(text.contains("LOOP: list"));
        assert!(text.contains("SEARCH: mix"));
    }

    #[test]
    fn draw_renders_title_and_rows() {
        let mut app = App::new("idle");
        app.apply(PlayerEvent::ListChanged(vec!["one.mp3".into(), "two.mp3".into()]));
        app.apply(PlayerEvent::NowPlaying(Some("two.mp3".into())));

        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        terminal.draw(|f| draw(f, &app)).unwrap();

        let buffer = terminal.backend().buffer();
        let rendered: String = buffer.content.iter().map(|c| c.symbol()).collect();
        assert!(rendered.contains("playing: two.mp3"));
        assert!(rendered.contains("one.mp3"));
    }
}
