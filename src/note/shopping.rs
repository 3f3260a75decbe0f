use super::{LineItem, NoteColor, NoteId};
use crate::error::{NoteError, NoteResult};

/// A shopping-list note: the unit of storage and of subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    pub id: NoteId,
    pub color: NoteColor,
    pub items: Vec<LineItem>,
}

impl Note {
    pub fn new(id: NoteId, color: NoteColor) -> Self {
        Self {
            id,
            color,
            items: Vec::new(),
        }
    }

    pub fn with_items(id: NoteId, color: NoteColor, items: Vec<LineItem>) -> Self {
        Self { id, color, items }
    }

    /// First item with this name.
    pub fn find(&self, name: &str) -> Option<&LineItem> {
        self.items.iter().find(|item| item.name == name)
    }

    pub fn find_mut(&mut self, name: &str) -> Option<&mut LineItem> {
        self.items.iter_mut().find(|item| item.name == name)
    }

    fn require_mut(&mut self, name: &str) -> NoteResult<&mut LineItem> {
        let id = self.id.clone();
        self.find_mut(name)
            .ok_or_else(|| NoteError::conflict(format!("no item named '{name}' in note {id}")))
    }

    pub fn add_item(&mut self, name: &str, quantity: u32) -> NoteResult<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(NoteError::conflict("item name must not be empty"));
        }
        if self.find(name).is_some() {
            return Err(NoteError::conflict(format!(
                "item '{name}' already exists in note {}",
                self.id
            )));
        }
        self.items.push(LineItem::new(name, quantity));
        Ok(())
    }

    pub fn remove_item(&mut self, name: &str) -> NoteResult<LineItem> {
        let idx = self
            .items
            .iter()
            .position(|item| item.name == name)
            .ok_or_else(|| {
                NoteError::conflict(format!("no item named '{name}' in note {}", self.id))
            })?;
        Ok(self.items.remove(idx))
    }

    pub fn rename_item(&mut self, name: &str, new_name: &str) -> NoteResult<()> {
        let new_name = new_name.trim();
        if new_name.is_empty() {
            return Err(NoteError::conflict("item name must not be empty"));
        }
        if new_name != name && self.find(new_name).is_some() {
            return Err(NoteError::conflict(format!(
                "item '{new_name}' already exists in note {}",
                self.id
            )));
        }
        self.require_mut(name)?.name = new_name.to_string();
        Ok(())
    }

    pub fn set_quantity(&mut self, name: &str, quantity: u32) -> NoteResult<()> {
        self.require_mut(name)?.quantity = quantity;
        Ok(())
    }

    pub fn adjust_quantity(&mut self, name: &str, delta: i64) -> NoteResult<()> {
        self.require_mut(name)?.adjust_quantity(delta);
        Ok(())
    }

    pub fn toggle_done(&mut self, name: &str) -> NoteResult<()> {
        self.require_mut(name)?.toggle_done();
        Ok(())
    }

    pub fn toggle_visible(&mut self, name: &str) -> NoteResult<()> {
        self.require_mut(name)?.toggle_visible();
        Ok(())
    }

    pub fn set_color(&mut self, color: NoteColor) {
        self.color = color;
    }

    pub fn visible_items(&self) -> impl Iterator<Item = &LineItem> {
        self.items.iter().filter(|item| item.visible)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::note::Palette;

    fn create_test_note() -> Note {
        let mut note = Note::new(NoteId::new("note1"), Palette::Green.color());
        note.add_item("eggs", 12).unwrap();
        note.add_item("milk", 2).unwrap();
        note
    }

    #[test]
    fn test_add_item() {
        let note = create_test_note();
        assert_eq!(note.items.len(), 2);
        assert_eq!(note.items[0].name, "eggs");
        assert_eq!(note.items[1].quantity, 2);
    }

    #[test]
    fn test_add_item_rejects_empty_and_duplicate() {
        let mut note = create_test_note();
        assert!(note.add_item("   ", 1).is_err());
        assert!(note.add_item("eggs", 1).is_err());
        assert_eq!(note.items.len(), 2);
    }

    #[test]
    fn test_find_returns_first_match() {
        let mut note = create_test_note();
        note.items.push(LineItem::new("eggs", 99));
        assert_eq!(note.find("eggs").unwrap().quantity, 12);
        note.set_quantity("eggs", 6).unwrap();
        assert_eq!(note.items[0].quantity, 6);
        assert_eq!(note.items[2].quantity, 99);
    }

    #[test]
    fn test_remove_item() {
        let mut note = create_test_note();
        let removed = note.remove_item("eggs").unwrap();
        assert_eq!(removed.name, "eggs");
        assert_eq!(note.items.len(), 1);
        assert!(note.remove_item("eggs").is_err());
    }

    #[test]
    fn test_rename_item() {
        let mut note = create_test_note();
        note.rename_item("milk", "oat milk").unwrap();
        assert!(note.find("milk").is_none());
        assert_eq!(note.find("oat milk").unwrap().quantity, 2);
        assert!(note.rename_item("oat milk", "eggs").is_err());
        note.rename_item("eggs", "eggs").unwrap();
    }

    #[test]
    fn test_visible_items() {
        let mut note = create_test_note();
        note.toggle_visible("milk").unwrap();
        let names: Vec<&str> = note.visible_items().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["eggs"]);
    }

    #[test]
    fn test_unknown_item_is_conflict() {
        let mut note = create_test_note();
        let err = note.toggle_done("bread").unwrap_err();
        assert!(matches!(err, NoteError::StateConflict { .. }));
    }
}
