use super::mode::Mode;
use super::state::{AppState, InputPurpose};
use anyhow::Result;
use ar_notes::board::PanelSlot;
use crossterm::event::{KeyCode, KeyEvent};

pub fn handle_key_event(key: KeyEvent, state: &mut AppState) -> Result<()> {
    if state.show_help {
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
            state.show_help = false;
        }
        return Ok(());
    }

    match state.mode() {
        Mode::Scan => handle_scan_mode(key, state),
        Mode::Loading => handle_loading_mode(key, state),
        Mode::Edit => handle_edit_mode(key, state),
        Mode::Detail => handle_detail_mode(key, state),
        Mode::Input => handle_input_mode(key, state),
    }
    Ok(())
}

fn handle_scan_mode(key: KeyEvent, state: &mut AppState) {
    match key.code {
        KeyCode::Char(c @ '1'..='9') => {
            let digit = c as u8 - b'0';
            state.marker_detected(digit);
        }
        KeyCode::Char('q') => state.should_quit = true,
        KeyCode::Char('?') => state.show_help = true,
        KeyCode::Char('x') | KeyCode::Esc => state.close_panel(),
        KeyCode::Char('j') | KeyCode::Down => state.move_cursor_down(),
        KeyCode::Char('k') | KeyCode::Up => state.move_cursor_up(),
        KeyCode::Char('e') => {
            let result = state.board.open_edit();
            if state.report(result).is_some() {
                state.cursor_position = 0;
            }
        }
        KeyCode::Enter => {
            let index = state.cursor_position;
            let result = state.board.open_detail(index);
            state.report(result);
        }
        KeyCode::Char('c') => {
            if let Some(palette) = state.next_palette() {
                let result = state.board.select_color(palette);
                state.report(result);
            }
        }
        _ => {}
    }
}

fn handle_loading_mode(key: KeyEvent, state: &mut AppState) {
    if key.code == KeyCode::Esc {
        cancel_active(state);
    }
}

fn cancel_active(state: &mut AppState) {
    let result = match state.board.active_panel() {
        Some(PanelSlot::Shopping(_)) => state.board.cancel_edit(),
        Some(PanelSlot::Todo(_)) => state.board.cancel_detail(),
        None => return,
    };
    state.report(result);
    state.clamp_cursor();
}

fn handle_edit_mode(key: KeyEvent, state: &mut AppState) {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => state.move_cursor_down(),
        KeyCode::Char('k') | KeyCode::Up => state.move_cursor_up(),
        KeyCode::Char('a') => state.begin_input(InputPurpose::AddItem, String::new()),
        KeyCode::Char('r') => {
            if let Some(name) = state.selected_item_name() {
                state.begin_input(InputPurpose::RenameItem { from: name.clone() }, name);
            }
        }
        KeyCode::Char('+') | KeyCode::Char('=') => adjust_selected(state, 1),
        KeyCode::Char('-') => adjust_selected(state, -1),
        KeyCode::Char(' ') => edit_selected(state, |draft, name| draft.toggle_done(name)),
        KeyCode::Char('v') => edit_selected(state, |draft, name| draft.toggle_visible(name)),
        KeyCode::Char('d') => {
            edit_selected(state, |draft, name| draft.remove_item(name).map(|_| ()));
            state.clamp_cursor();
        }
        KeyCode::Char('c') => {
            if let Some(palette) = state.next_palette() {
                let result = state.board.edit_draft(|draft| {
                    draft.set_color(palette.color());
                    Ok(())
                });
                state.report(result);
            }
        }
        KeyCode::Char('s') | KeyCode::Enter => {
            let result = state.board.save_edit();
            if state.report(result).is_some() {
                state.set_status_message("Saved".to_string());
            }
        }
        KeyCode::Esc => cancel_active(state),
        _ => {}
    }
}

fn adjust_selected(state: &mut AppState, delta: i64) {
    edit_selected(state, |draft, name| draft.adjust_quantity(name, delta));
}

fn edit_selected(
    state: &mut AppState,
    apply: impl FnOnce(&mut ar_notes::note::Note, &str) -> ar_notes::error::NoteResult<()>,
) {
    let Some(name) = state.selected_item_name() else {
        return;
    };
    let result = state.board.edit_draft(|draft| apply(draft, &name));
    state.report(result);
}

fn handle_detail_mode(key: KeyEvent, state: &mut AppState) {
    match key.code {
        KeyCode::Char(' ') => {
            let result = state.board.edit_detail(|item| item.done = !item.done);
            state.report(result);
        }
        KeyCode::Char('i') => {
            let result = state.board.edit_detail(|item| item.important = !item.important);
            state.report(result);
        }
        KeyCode::Char('t') => {
            let current = state.board.edit_detail(|item| item.title.clone()).unwrap_or_default();
            state.begin_input(InputPurpose::DetailTitle, current);
        }
        KeyCode::Char('n') => {
            let current = state.board.edit_detail(|item| item.note.clone()).unwrap_or_default();
            state.begin_input(InputPurpose::DetailNote, current);
        }
        KeyCode::Char('c') => {
            if let Some(palette) = state.next_palette() {
                let result = state.board.select_color(palette);
                state.report(result);
            }
        }
        KeyCode::Char('s') | KeyCode::Enter => {
            let result = state.board.save_detail();
            if state.report(result).is_some() {
                state.set_status_message("Saved".to_string());
            }
        }
        KeyCode::Esc => cancel_active(state),
        _ => {}
    }
}

fn handle_input_mode(key: KeyEvent, state: &mut AppState) {
    let Some(input) = state.input.as_mut() else {
        return;
    };

    match key.code {
        KeyCode::Char(c) => input.buffer.push(c),
        KeyCode::Backspace => {
            input.buffer.pop();
        }
        KeyCode::Esc => state.input = None,
        KeyCode::Enter => {
            if let Some(input) = state.input.take() {
                submit_input(state, input.purpose, input.buffer);
            }
        }
        _ => {}
    }
}

fn submit_input(state: &mut AppState, purpose: InputPurpose, text: String) {
    let text = text.trim().to_string();
    match purpose {
        InputPurpose::AddItem => {
            let result = state.board.edit_draft(|draft| draft.add_item(&text, 1));
            if state.report(result).is_some() {
                state.cursor_position = state.selectable_len().saturating_sub(1);
            }
        }
        InputPurpose::RenameItem { from } => {
            let result = state.board.edit_draft(|draft| draft.rename_item(&from, &text));
            state.report(result);
        }
        InputPurpose::DetailTitle => {
            let result = state.board.edit_detail(|item| item.title = text);
            state.report(result);
        }
        InputPurpose::DetailNote => {
            let result = state.board.edit_detail(|item| item.note = text);
            state.report(result);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::theme::Theme;
    use ar_notes::board::Board;
    use ar_notes::config::Config;
    use ar_notes::note::{NoteId, Palette};
    use ar_notes::store::{Dispatch, MemoryStore, RemoteStore, StoreClient, StorePath};
    use crossterm::event::KeyModifiers;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Arc;

    fn press(state: &mut AppState, code: KeyCode) {
        handle_key_event(KeyEvent::new(code, KeyModifiers::NONE), state).unwrap();
        state.tick();
    }

    fn type_text(state: &mut AppState, text: &str) {
        for c in text.chars() {
            press(state, KeyCode::Char(c));
        }
    }

    fn create_test_state() -> (AppState, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::with_root(json!({
            "notes": {
                "note1": { "colorHex": "#D20A2E", "items": [{ "name": "milk", "quantity": 2 }] },
                "note2": { "items": [{ "title": "Call plumber" }] }
            }
        })));
        let client = StoreClient::new(store.clone(), Dispatch::Inline);
        let config = Config::default();
        let markers = config.markers.iter().map(|m| (m.note_id.clone(), m.kind));
        let board = Board::with_markers(client, Palette::Red.color(), markers).unwrap();
        (AppState::new(board, config, Theme::default()), store)
    }

    #[test]
    fn test_add_item_and_save() {
        let (mut state, store) = create_test_state();
        press(&mut state, KeyCode::Char('1'));
        press(&mut state, KeyCode::Char('e'));
        assert_eq!(state.mode(), Mode::Edit);

        press(&mut state, KeyCode::Char('a'));
        assert_eq!(state.mode(), Mode::Input);
        type_text(&mut state, "eggs");
        press(&mut state, KeyCode::Enter);
        press(&mut state, KeyCode::Char('+'));
        press(&mut state, KeyCode::Char('s'));

        assert_eq!(state.mode(), Mode::Scan);
        let stored = store
            .get(&StorePath::note(&NoteId::new("note1")).unwrap())
            .unwrap()
            .unwrap();
        assert_eq!(
            stored["items"][1],
            json!({ "name": "eggs", "quantity": 2, "done": false, "isVisible": true })
        );
    }

    #[test]
    fn test_escape_cancels_edit_without_writing() {
        let (mut state, store) = create_test_state();
        let path = StorePath::note(&NoteId::new("note1")).unwrap();
        let before = store.get(&path).unwrap();

        press(&mut state, KeyCode::Char('1'));
        press(&mut state, KeyCode::Char('e'));
        press(&mut state, KeyCode::Char(' '));
        press(&mut state, KeyCode::Char('c'));
        press(&mut state, KeyCode::Esc);

        assert_eq!(state.mode(), Mode::Scan);
        assert_eq!(store.get(&path).unwrap(), before);
    }

    #[test]
    fn test_close_then_switch_marker() {
        let (mut state, _store) = create_test_state();
        press(&mut state, KeyCode::Char('1'));
        press(&mut state, KeyCode::Char('2'));
        assert_eq!(state.board.active_id(), Some(&NoteId::new("note1")));

        press(&mut state, KeyCode::Char('x'));
        press(&mut state, KeyCode::Char('2'));
        assert_eq!(state.board.active_id(), Some(&NoteId::new("note2")));
    }

    #[test]
    fn test_detail_toggle_important() {
        let (mut state, store) = create_test_state();
        press(&mut state, KeyCode::Char('2'));
        press(&mut state, KeyCode::Enter);
        assert_eq!(state.mode(), Mode::Detail);

        press(&mut state, KeyCode::Char('i'));
        press(&mut state, KeyCode::Enter);

        let stored = store
            .get(&StorePath::note(&NoteId::new("note2")).unwrap())
            .unwrap()
            .unwrap();
        assert_eq!(stored["items"][0]["important"], json!(true));
    }

    #[test]
    fn test_quit() {
        let (mut state, _store) = create_test_state();
        press(&mut state, KeyCode::Char('q'));
        assert!(state.should_quit);
    }
}
