use serde::{Deserialize, Serialize};

/// One shopping entry. `name` is the identity key within its note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub name: String,
    pub quantity: u32,
    pub done: bool,
    pub visible: bool,
}

impl LineItem {
    pub fn new(name: impl Into<String>, quantity: u32) -> Self {
        Self {
            name: name.into(),
            quantity,
            done: false,
            visible: true,
        }
    }

    pub fn toggle_done(&mut self) {
        self.done = !self.done;
    }

    pub fn toggle_visible(&mut self) {
        self.visible = !self.visible;
    }

    /// Apply a signed change to the quantity, clamping at zero.
    pub fn adjust_quantity(&mut self, delta: i64) {
        let next = i64::from(self.quantity).saturating_add(delta);
        self.quantity = next.clamp(0, i64::from(u32::MAX)) as u32;
    }

    pub fn label(&self) -> String {
        format!("{} x {}", self.name, self.quantity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_defaults() {
        let item = LineItem::new("milk", 2);
        assert!(!item.done);
        assert!(item.visible);
        assert_eq!(item.label(), "milk x 2");
    }

    #[test]
    fn test_adjust_quantity_clamps_at_zero() {
        let mut item = LineItem::new("eggs", 2);
        item.adjust_quantity(-5);
        assert_eq!(item.quantity, 0);
        item.adjust_quantity(3);
        assert_eq!(item.quantity, 3);
    }

    #[test]
    fn test_toggles() {
        let mut item = LineItem::new("bread", 1);
        item.toggle_done();
        item.toggle_visible();
        assert!(item.done);
        assert!(!item.visible);
        item.toggle_done();
        assert!(!item.done);
    }
}
