use super::mode::Mode;
use crate::ui::theme::Theme;
use ar_notes::board::{Board, PanelSlot, PanelView, ShowOutcome};
use ar_notes::config::Config;
use ar_notes::error::{NoteError, NoteResult};
use ar_notes::note::Palette;
use std::time::Instant;
use tracing::debug;

/// What the input line is collecting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputPurpose {
    AddItem,
    RenameItem { from: String },
    DetailTitle,
    DetailNote,
}

impl InputPurpose {
    pub fn prompt(&self) -> &'static str {
        match self {
            InputPurpose::AddItem => "New item",
            InputPurpose::RenameItem { .. } => "Rename to",
            InputPurpose::DetailTitle => "Title",
            InputPurpose::DetailNote => "Note",
        }
    }
}

#[derive(Debug, Clone)]
pub struct InputState {
    pub purpose: InputPurpose,
    pub buffer: String,
}

pub struct AppState {
    pub board: Board,
    pub config: Config,
    pub theme: Theme,
    pub cursor_position: usize,
    pub input: Option<InputState>,
    pub should_quit: bool,
    pub show_help: bool,
    pub status_message: Option<(String, Instant)>,
}

impl AppState {
    pub fn new(board: Board, config: Config, theme: Theme) -> Self {
        Self {
            board,
            config,
            theme,
            cursor_position: 0,
            input: None,
            should_quit: false,
            show_help: false,
            status_message: None,
        }
    }

    pub fn mode(&self) -> Mode {
        if self.input.is_some() {
            return Mode::Input;
        }
        match self.board.active_panel() {
            Some(PanelSlot::Shopping(panel)) if panel.is_edit_visible() => Mode::Edit,
            Some(PanelSlot::Todo(panel)) if panel.is_detail_visible() => Mode::Detail,
            Some(slot) if slot.is_busy() => Mode::Loading,
            _ => Mode::Scan,
        }
    }

    pub fn set_status_message(&mut self, message: String) {
        self.status_message = Some((message, Instant::now()));
    }

    pub fn clear_expired_status_message(&mut self) {
        if let Some((_, time)) = &self.status_message
            && time.elapsed().as_secs() > 3
        {
            self.status_message = None;
        }
    }

    /// Show an error from a board operation on the status line.
    pub fn report<T>(&mut self, result: NoteResult<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                debug!("Board operation rejected: {}", err);
                self.set_status_message(err.to_string());
                None
            }
        }
    }

    /// Apply finished store work. Called once per frame.
    pub fn tick(&mut self) {
        if self.board.poll_store() > 0 {
            self.clamp_cursor();
        }
        if let Some(err) = self.board.take_errors().pop() {
            self.set_status_message(describe(&err));
        }
        self.clear_expired_status_message();
    }

    /// Digit key pressed: pretend its marker was detected.
    pub fn marker_detected(&mut self, key: u8) {
        let Some(marker) = self.config.marker_for_key(key) else {
            self.set_status_message(format!("No marker bound to {key}"));
            return;
        };
        let note_id = marker.note_id.clone();
        let label = if marker.name.is_empty() {
            note_id.to_string()
        } else {
            marker.name.clone()
        };

        match self.board.on_target_found(&note_id) {
            Ok(ShowOutcome::Shown) => {
                self.cursor_position = 0;
                self.set_status_message(format!("Found {label}"));
            }
            Ok(ShowOutcome::AlreadyActive) => {}
            Ok(ShowOutcome::Rejected { active }) => {
                self.set_status_message(format!("{active} is showing, close it first (x)"));
            }
            Err(err) => {
                self.set_status_message(err.to_string());
            }
        }
    }

    pub fn close_panel(&mut self) {
        if self.board.close_active() {
            self.cursor_position = 0;
        }
    }

    /// Number of selectable lines in whatever currently takes the cursor.
    pub fn selectable_len(&self) -> usize {
        match self.board.active_panel() {
            Some(PanelSlot::Shopping(panel)) => panel.draft().map_or(0, |d| d.items.len()),
            Some(PanelSlot::Todo(panel)) => panel.list().items.len(),
            None => 0,
        }
    }

    pub fn move_cursor_up(&mut self) {
        self.cursor_position = self.cursor_position.saturating_sub(1);
    }

    pub fn move_cursor_down(&mut self) {
        if self.cursor_position + 1 < self.selectable_len() {
            self.cursor_position += 1;
        }
    }

    pub fn clamp_cursor(&mut self) {
        let len = self.selectable_len();
        if self.cursor_position >= len {
            self.cursor_position = len.saturating_sub(1);
        }
    }

    /// Name of the draft item under the cursor.
    pub fn selected_item_name(&self) -> Option<String> {
        match self.board.active_panel() {
            Some(PanelSlot::Shopping(panel)) => panel
                .draft()
                .and_then(|d| d.items.get(self.cursor_position))
                .map(|item| item.name.clone()),
            _ => None,
        }
    }

    /// Colour the picker moves to next for the active panel.
    pub fn next_palette(&self) -> Option<Palette> {
        match self.board.active_panel()? {
            PanelSlot::Shopping(panel) => panel.draft().map(|d| Palette::after(d.color)),
            PanelSlot::Todo(panel) => Some(Palette::after(panel.list().color)),
        }
    }

    pub fn begin_input(&mut self, purpose: InputPurpose, initial: String) {
        self.input = Some(InputState {
            purpose,
            buffer: initial,
        });
    }

    /// Views to draw: the main panel and, if open, its edit or detail page.
    pub fn views(&self) -> Option<(PanelView, Option<PanelView>)> {
        match self.board.active_panel()? {
            PanelSlot::Shopping(panel) => {
                Some((panel.view(), panel.edit_view(Some(self.cursor_position))))
            }
            PanelSlot::Todo(panel) => {
                let selected = (!panel.is_detail_visible()).then_some(self.cursor_position);
                Some((panel.view(selected), panel.detail_view()))
            }
        }
    }
}

fn describe(err: &NoteError) -> String {
    match err {
        NoteError::Store { .. } => format!("Store unavailable: {err}"),
        _ => err.to_string(),
    }
}
