use crate::note::NoteId;

/// A marker-anchored panel as seen by the coordinator.
pub trait Panel {
    fn id(&self) -> &NoteId;
    fn show(&mut self);
    fn hide(&mut self);
    /// Hide the edit sub-panel, dropping any edit in progress.
    fn hide_edit(&mut self);
    fn is_visible(&self) -> bool;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShowOutcome {
    Shown,
    AlreadyActive,
    /// Another panel holds the slot. First detected wins; nothing is queued.
    Rejected { active: NoteId },
}

/// Keeps at most one panel visible at a time.
///
/// Works like a non-blocking try-lock over the screen: `request_show` either
/// takes the slot or is turned away immediately, and only the holder can
/// release it.
#[derive(Debug, Default)]
pub struct PanelCoordinator {
    active: Option<NoteId>,
}

impl PanelCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Option<&NoteId> {
        self.active.as_ref()
    }

    pub fn is_active(&self, id: &NoteId) -> bool {
        self.active.as_ref() == Some(id)
    }

    pub fn request_show(&mut self, panel: &mut dyn Panel) -> ShowOutcome {
        match &self.active {
            None => {
                self.active = Some(panel.id().clone());
                panel.show();
                panel.hide_edit();
                tracing::info!(note = %panel.id(), "Showing panel");
                ShowOutcome::Shown
            }
            Some(active) if active == panel.id() => {
                tracing::debug!(note = %panel.id(), "Panel already active");
                ShowOutcome::AlreadyActive
            }
            Some(active) => {
                tracing::warn!(
                    active = %active,
                    requested = %panel.id(),
                    "Another panel is already active, ignoring"
                );
                ShowOutcome::Rejected {
                    active: active.clone(),
                }
            }
        }
    }

    /// Returns whether the panel was the active one and is now hidden.
    pub fn request_hide(&mut self, panel: &mut dyn Panel) -> bool {
        if !self.is_active(panel.id()) {
            tracing::debug!(note = %panel.id(), "Hide ignored, panel is not active");
            return false;
        }

        panel.hide();
        panel.hide_edit();
        self.active = None;
        tracing::info!(note = %panel.id(), "Panel closed");
        true
    }
}
