use serde::{Deserialize, Serialize};

use super::{NoteColor, NoteId};

/// One entry of a to-do list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoItem {
    pub title: String,
    pub note: String,
    pub done: bool,
    pub important: bool,
    /// Per-item colour, kept as the raw string the client wrote.
    pub color_hex: Option<String>,
}

impl TodoItem {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }
}

/// A to-do list document. Shares the `notes/` namespace with shopping notes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoList {
    pub id: NoteId,
    pub color: NoteColor,
    pub items: Vec<TodoItem>,
}

impl TodoList {
    pub fn new(id: NoteId, color: NoteColor) -> Self {
        Self {
            id,
            color,
            items: Vec::new(),
        }
    }

    pub fn with_items(id: NoteId, color: NoteColor, items: Vec<TodoItem>) -> Self {
        Self { id, color, items }
    }

    pub fn add_item(&mut self, title: impl Into<String>) {
        self.items.push(TodoItem::new(title));
    }

    pub fn pending_count(&self) -> usize {
        self.items.iter().filter(|item| !item.done).count()
    }
}

/// Working copy for the detail page: the fetched list plus the item being
/// edited. The item is written back into the list on save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoDetail {
    pub list: TodoList,
    pub index: usize,
    pub item: TodoItem,
}

impl TodoDetail {
    pub fn open(list: TodoList, index: usize) -> Option<Self> {
        let item = list.items.get(index)?.clone();
        Some(Self { list, index, item })
    }

    /// The full list with the edited item in place.
    pub fn merged(&self) -> TodoList {
        let mut list = self.list.clone();
        if let Some(slot) = list.items.get_mut(self.index) {
            *slot = self.item.clone();
        }
        list
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::note::Palette;

    fn create_test_list() -> TodoList {
        let mut list = TodoList::new(NoteId::new("note2"), Palette::Red.color());
        list.add_item("Call plumber");
        list.add_item("Book flights");
        list
    }

    #[test]
    fn test_pending_count() {
        let mut list = create_test_list();
        assert_eq!(list.pending_count(), 2);
        list.items[0].done = true;
        assert_eq!(list.pending_count(), 1);
    }

    #[test]
    fn test_detail_open_out_of_range() {
        assert!(TodoDetail::open(create_test_list(), 5).is_none());
    }

    #[test]
    fn test_detail_merged_replaces_only_selected_item() {
        let list = create_test_list();
        let mut detail = TodoDetail::open(list.clone(), 1).unwrap();
        detail.item.note = "window seat".to_string();
        detail.item.important = true;

        let merged = detail.merged();
        assert_eq!(merged.items[0], list.items[0]);
        assert_eq!(merged.items[1].note, "window seat");
        assert!(merged.items[1].important);
        assert_eq!(merged.color, list.color);
    }
}
