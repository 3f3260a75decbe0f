use serde_json::Value;

use super::coordinator::Panel;
use super::reconcile::Reconciler;
use super::session::{Continuation, EditSession};
use super::view::{self, PanelView};
use crate::error::{NoteError, NoteResult};
use crate::note::{Note, NoteColor, NoteId, decode_note, encode_note};
use crate::store::{Purpose, StoreClient, StorePath, SubscriptionId, Ticket};

/// Panel bound to a shopping-list note.
#[derive(Debug)]
pub struct ShoppingPanel {
    id: NoteId,
    path: StorePath,
    fallback: NoteColor,
    visible: bool,
    edit_visible: bool,
    reconciler: Reconciler<Note>,
    session: EditSession<Note>,
    subscription: Option<SubscriptionId>,
}

impl ShoppingPanel {
    pub fn new(id: NoteId, fallback: NoteColor) -> NoteResult<Self> {
        let path = StorePath::note(&id)?;
        let empty = Note::new(id.clone(), fallback);
        Ok(Self {
            id,
            path,
            fallback,
            visible: false,
            edit_visible: false,
            reconciler: Reconciler::new(empty),
            session: EditSession::new(),
            subscription: None,
        })
    }

    pub fn path(&self) -> &StorePath {
        &self.path
    }

    pub fn subscription(&self) -> Option<SubscriptionId> {
        self.subscription
    }

    pub fn set_subscription(&mut self, id: SubscriptionId) {
        self.subscription = Some(id);
    }

    /// The note currently rendered on the main panel.
    pub fn note(&self) -> &Note {
        self.reconciler.shown()
    }

    pub fn confirmed(&self) -> &Note {
        self.reconciler.confirmed()
    }

    pub fn session(&self) -> &EditSession<Note> {
        &self.session
    }

    pub fn draft(&self) -> Option<&Note> {
        self.session.draft()
    }

    pub fn is_edit_visible(&self) -> bool {
        self.edit_visible
    }

    fn decode(&self, value: Option<Value>) -> NoteResult<Note> {
        match value {
            Some(document) => {
                let decoded = decode_note(&self.id, &document, self.fallback)?;
                decoded.log_warnings(&self.path.to_string());
                Ok(decoded.value)
            }
            None => {
                tracing::warn!(path = %self.path, "Note does not exist, showing an empty one");
                Ok(Note::new(self.id.clone(), self.fallback))
            }
        }
    }

    /// Subscription notification. A document that cannot be decoded leaves
    /// the current rendering alone.
    pub fn apply_remote(&mut self, value: Option<Value>) -> NoteResult<bool> {
        let note = self.decode(value).inspect_err(|e| {
            tracing::warn!(path = %self.path, "Ignoring remote update: {}", e);
        })?;

        let rendered = self.reconciler.receive(note, self.session.is_idle());
        if !rendered {
            tracing::debug!(
                note = %self.id,
                state = self.session.state().name(),
                "Buffered remote update"
            );
        }
        Ok(rendered)
    }

    pub fn open_edit(&mut self, client: &StoreClient) -> NoteResult<()> {
        let generation = self.session.begin_fetch()?;
        client.get(
            self.path.clone(),
            Ticket::new(self.id.clone(), generation, Purpose::EditFetch),
        );
        Ok(())
    }

    pub fn on_fetched(
        &mut self,
        generation: u64,
        result: NoteResult<Option<Value>>,
    ) -> NoteResult<()> {
        let draft = result.and_then(|value| self.decode(value));
        match self.session.on_fetched(generation, draft) {
            Continuation::Stale => {
                tracing::debug!(note = %self.id, generation, "Dropping stale fetch result");
                Ok(())
            }
            Continuation::Applied(Ok(())) => {
                self.edit_visible = true;
                tracing::debug!(note = %self.id, "Edit panel opened");
                Ok(())
            }
            Continuation::Applied(Err(err)) => {
                self.reconciler.settle();
                Err(err)
            }
        }
    }

    /// Mutate the draft. Only valid while editing.
    pub fn edit<R>(&mut self, apply: impl FnOnce(&mut Note) -> NoteResult<R>) -> NoteResult<R> {
        let state = self.session.state().name();
        let draft = self
            .session
            .draft_mut()
            .ok_or_else(|| NoteError::conflict(format!("nothing to edit while {state}")))?;
        apply(draft)
    }

    /// Write the draft as a full replace and show it straight away.
    pub fn save(&mut self, client: &StoreClient) -> NoteResult<()> {
        let (generation, committed) = self.session.begin_commit()?;
        self.edit_visible = false;

        let document = encode_note(&committed);
        self.reconciler.show_provisional(committed);
        tracing::info!(note = %self.id, "Saving note");
        client.set(
            self.path.clone(),
            document,
            Ticket::new(self.id.clone(), generation, Purpose::Commit),
        );
        Ok(())
    }

    pub fn on_written(&mut self, generation: u64, result: NoteResult<()>) -> NoteResult<()> {
        match self.session.on_committed(generation, result) {
            Continuation::Stale => {
                tracing::debug!(note = %self.id, generation, "Dropping stale write ack");
                Ok(())
            }
            Continuation::Applied((committed, Ok(()))) => {
                self.reconciler.settle_committed(committed);
                Ok(())
            }
            Continuation::Applied((_, Err(err))) => {
                self.reconciler.settle();
                Err(err)
            }
        }
    }

    /// Drop the draft and show the last confirmed note again.
    pub fn cancel(&mut self) -> bool {
        self.edit_visible = false;
        let cancelled = self.session.cancel();
        if cancelled {
            self.reconciler.settle();
            tracing::debug!(note = %self.id, "Edit cancelled");
        }
        cancelled
    }

    pub fn view(&self) -> PanelView {
        view::shopping_view(self.note())
    }

    pub fn edit_view(&self, selected: Option<usize>) -> Option<PanelView> {
        if !self.edit_visible {
            return None;
        }
        self.draft().map(|draft| view::shopping_edit_view(draft, selected))
    }
}

impl Panel for ShoppingPanel {
    fn id(&self) -> &NoteId {
        &self.id
    }

    fn show(&mut self) {
        self.visible = true;
    }

    fn hide(&mut self) {
        self.visible = false;
    }

    fn hide_edit(&mut self) {
        self.cancel();
    }

    fn is_visible(&self) -> bool {
        self.visible
    }
}
