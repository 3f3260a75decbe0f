//! Toolkit-independent rendering model for panels.

use crate::note::{Note, NoteColor, TodoDetail, TodoList};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStyle {
    Undone,
    Done,
    /// Item exists but is hidden from the main panel.
    Hidden,
    Important,
    Selected,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewLine {
    pub text: String,
    pub style: LineStyle,
}

impl ViewLine {
    fn new(text: impl Into<String>, style: LineStyle) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelView {
    pub title: String,
    pub color: NoteColor,
    pub lines: Vec<ViewLine>,
    pub footer: Option<String>,
}

fn pick(selected: bool, fallback: LineStyle) -> LineStyle {
    if selected { LineStyle::Selected } else { fallback }
}

/// Main shopping panel: visible items only.
pub fn shopping_view(note: &Note) -> PanelView {
    let lines = note
        .visible_items()
        .map(|item| {
            let style = if item.done { LineStyle::Done } else { LineStyle::Undone };
            ViewLine::new(item.label(), style)
        })
        .collect();

    PanelView {
        title: note.id.to_string(),
        color: note.color,
        lines,
        footer: None,
    }
}

/// Edit panel: every item, hidden ones dimmed.
pub fn shopping_edit_view(draft: &Note, selected: Option<usize>) -> PanelView {
    let lines = draft
        .items
        .iter()
        .enumerate()
        .map(|(idx, item)| {
            let base = if !item.visible {
                LineStyle::Hidden
            } else if item.done {
                LineStyle::Done
            } else {
                LineStyle::Undone
            };
            ViewLine::new(item.label(), pick(selected == Some(idx), base))
        })
        .collect();

    PanelView {
        title: format!("{} (editing)", draft.id),
        color: draft.color,
        lines,
        footer: Some(format!("{} items", draft.items.len())),
    }
}

pub fn todo_view(list: &TodoList, selected: Option<usize>) -> PanelView {
    let lines = list
        .items
        .iter()
        .enumerate()
        .map(|(idx, item)| {
            let check = if item.done { "[x]" } else { "[ ]" };
            let flag = if item.important { " !" } else { "" };
            let base = if item.done {
                LineStyle::Done
            } else if item.important {
                LineStyle::Important
            } else {
                LineStyle::Undone
            };
            ViewLine::new(
                format!("{check} {}{flag}", item.title),
                pick(selected == Some(idx), base),
            )
        })
        .collect();

    PanelView {
        title: list.id.to_string(),
        color: list.color,
        lines,
        footer: Some(format!("{} open", list.pending_count())),
    }
}

pub fn todo_detail_view(detail: &TodoDetail) -> PanelView {
    let item = &detail.item;
    let mut lines = vec![ViewLine::new(
        item.title.clone(),
        if item.important { LineStyle::Important } else { LineStyle::Undone },
    )];
    if !item.note.is_empty() {
        lines.push(ViewLine::new(item.note.clone(), LineStyle::Undone));
    }
    lines.push(ViewLine::new(
        format!("done: {}", if item.done { "yes" } else { "no" }),
        if item.done { LineStyle::Done } else { LineStyle::Undone },
    ));
    lines.push(ViewLine::new(
        format!("important: {}", if item.important { "yes" } else { "no" }),
        LineStyle::Undone,
    ));

    PanelView {
        title: format!("{} #{}", detail.list.id, detail.index + 1),
        color: detail.list.color,
        lines,
        footer: None,
    }
}
