use crate::app::AppState;
use crate::app::mode::Mode;
use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};

const VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn render(f: &mut Frame, state: &AppState, area: Rect) {
    if let Some(input) = &state.input {
        render_input(f, state, &format!(" {}: {}_", input.purpose.prompt(), input.buffer), area);
        return;
    }

    if let Some((message, time)) = &state.status_message
        && time.elapsed().as_secs() <= 3
    {
        render_status_message(f, message, area);
        return;
    }

    let mode = state.mode();
    let panel_label = match state.board.active_id() {
        Some(id) => format!("{id}"),
        None => "no marker".to_string(),
    };
    let hint = match mode {
        Mode::Scan if state.board.active_id().is_some() => "x close  e edit  ? help  q quit",
        Mode::Scan => "1-9 marker  ? help  q quit",
        Mode::Loading => "Esc cancel",
        Mode::Edit | Mode::Detail => "s save  Esc cancel  ? help",
        Mode::Input => "Enter ok  Esc abort",
    };

    let left_content = format!(" {mode} | {panel_label} | {hint}");
    let version_text = format!("v{VERSION}");
    let padding = area
        .width
        .saturating_sub(left_content.len() as u16 + version_text.len() as u16 + 1);

    let style = Style::default()
        .fg(state.theme.status_bar_fg)
        .bg(state.theme.status_bar_bg);
    let status_line = format!(
        "{}{:padding$}{} ",
        left_content,
        "",
        version_text,
        padding = padding as usize
    );

    f.render_widget(Paragraph::new(Line::from(vec![Span::styled(status_line, style)])), area);
}

fn render_input(f: &mut Frame, state: &AppState, prompt: &str, area: Rect) {
    let style = Style::default()
        .fg(state.theme.status_bar_fg)
        .bg(state.theme.selected_bg)
        .add_modifier(Modifier::BOLD);
    let padding = area.width.saturating_sub(prompt.len() as u16);
    let line = format!("{prompt}{:padding$}", "", padding = padding as usize);
    f.render_widget(Paragraph::new(Line::from(vec![Span::styled(line, style)])), area);
}

fn render_status_message(f: &mut Frame, message: &str, area: Rect) {
    let display_message = format!(" {message} ");

    let style = Style::default()
        .fg(ratatui::style::Color::White)
        .bg(ratatui::style::Color::Rgb(0, 100, 0))
        .add_modifier(Modifier::BOLD);

    let padding = area.width.saturating_sub(display_message.len() as u16);
    let status_line = format!(
        "{}{:padding$}",
        display_message,
        "",
        padding = padding as usize
    );

    f.render_widget(Paragraph::new(Line::from(vec![Span::styled(status_line, style)])), area);
}
