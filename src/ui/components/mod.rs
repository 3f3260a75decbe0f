pub mod note_panel;
pub mod status_bar;

use crate::app::AppState;
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
};

pub fn render(f: &mut Frame, state: &AppState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(1),    // Panels
            Constraint::Length(1), // Status bar
        ])
        .split(f.area());

    match state.views() {
        Some((main, None)) => {
            note_panel::render(f, &main, &state.theme, centered_rect(50, 80, chunks[0]));
        }
        Some((main, Some(page))) => {
            let columns = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
                .split(chunks[0]);
            note_panel::render(f, &main, &state.theme, columns[0]);
            note_panel::render(f, &page, &state.theme, columns[1]);
        }
        None => render_scanner(f, state, chunks[0]),
    }

    status_bar::render(f, state, chunks[1]);

    if state.show_help {
        render_help_overlay(f, state);
    }
}

/// Nothing detected yet: list the markers that can be "shown" to the camera.
fn render_scanner(f: &mut Frame, state: &AppState, area: Rect) {
    let dim = Style::default().fg(Color::DarkGray);
    let key_style = Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD);

    let mut lines = vec![
        Line::from(Span::styled("No marker in view", dim)),
        Line::from(""),
    ];
    for marker in &state.config.markers {
        let name = if marker.name.is_empty() {
            marker.note_id.to_string()
        } else {
            marker.name.clone()
        };
        lines.push(Line::from(vec![
            Span::styled(format!("  {}  ", marker.key), key_style),
            Span::styled(
                format!("{name} ({}, {})", marker.note_id, marker.kind),
                Style::default().fg(state.theme.foreground),
            ),
        ]));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" ar-notes ")
        .style(Style::default().bg(state.theme.background));
    let paragraph = Paragraph::new(lines).block(block).alignment(Alignment::Left);
    f.render_widget(paragraph, centered_rect(50, 60, area));
}

fn render_help_overlay(f: &mut Frame, state: &AppState) {
    let key_style = Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD);
    let desc_style = Style::default().fg(state.theme.foreground);
    let section_style = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);

    let sections: [(&str, &[(&str, &str)]); 3] = [
        (
            "Scanning",
            &[
                ("1-9", "Detect marker"),
                ("x / Esc", "Close panel"),
                ("e", "Edit shopping list"),
                ("j / k", "Move selection"),
                ("Enter", "Open to-do item"),
                ("c", "Next list colour (to-do)"),
            ],
        ),
        (
            "Editing",
            &[
                ("a / r / d", "Add, rename, delete item"),
                ("+ / -", "Change quantity"),
                ("Space", "Toggle done"),
                ("v", "Toggle visibility"),
                ("i / t / n", "Important, title, note (to-do)"),
                ("c", "Next colour"),
                ("s / Enter", "Save"),
                ("Esc", "Cancel"),
            ],
        ),
        ("General", &[("?", "Toggle help"), ("q", "Quit")]),
    ];

    let mut lines: Vec<Line> = vec![];
    for (title, keys) in sections {
        lines.push(Line::from(Span::styled(format!("  ── {title} ──"), section_style)));
        for (key, desc) in keys {
            lines.push(Line::from(vec![
                Span::styled(format!("    {key:<14}"), key_style),
                Span::styled(*desc, desc_style),
            ]));
        }
        lines.push(Line::from(""));
    }

    let area = centered_rect(60, 70, f.area());
    let help = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Help ")
            .style(Style::default().bg(state.theme.background)),
    );

    f.render_widget(Clear, area);
    f.render_widget(help, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
