use crate::ui::theme::{Theme, note_color};
use ar_notes::board::PanelView;
use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::Line,
    widgets::{Block, Borders, List, ListItem},
};

/// Draw one panel as a bordered box in the note's colour.
pub fn render(f: &mut Frame, view: &PanelView, theme: &Theme, area: Rect) {
    let accent = note_color(view.color);

    let items: Vec<ListItem> = if view.lines.is_empty() {
        vec![ListItem::new(Line::styled(
            "(empty)",
            Style::default().fg(theme.hidden).add_modifier(Modifier::ITALIC),
        ))]
    } else {
        view.lines
            .iter()
            .map(|line| {
                ListItem::new(Line::styled(line.text.clone(), theme.line_style(line.style)))
            })
            .collect()
    };

    let mut block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(accent))
        .title(Line::styled(
            format!(" {} ", view.title),
            Style::default().fg(accent).add_modifier(Modifier::BOLD),
        ))
        .style(Style::default().bg(theme.background));
    if let Some(footer) = &view.footer {
        block = block.title_bottom(Line::styled(
            format!(" {footer} "),
            Style::default().fg(accent),
        ));
    }

    f.render_widget(List::new(items).block(block), area);
}
