use serde_json::{Value, json};

use super::coordinator::Panel;
use super::reconcile::Reconciler;
use super::session::{Continuation, EditSession};
use super::view::{self, PanelView};
use crate::error::{NoteError, NoteResult};
use crate::note::{
    NoteColor,
    NoteId,
    Palette,
    TodoDetail,
    TodoItem,
    TodoList,
    decode_todo_list,
    encode_todo_list,
};
use crate::store::{Purpose, StoreClient, StorePath, SubscriptionId, Ticket};

/// Panel bound to a to-do list. Editing happens one item at a time on a
/// detail page; the list colour is written on its own.
#[derive(Debug)]
pub struct TodoPanel {
    id: NoteId,
    path: StorePath,
    color_path: StorePath,
    fallback: NoteColor,
    visible: bool,
    detail_visible: bool,
    reconciler: Reconciler<TodoList>,
    session: EditSession<TodoDetail>,
    detail_index: Option<usize>,
    /// Colour picked while a detail session is open. The fetched or
    /// committed list may predate it, so it is re-applied on both.
    pending_color: Option<NoteColor>,
    color_writes: u64,
    /// Colour shown before the latest colour write, restored if it fails.
    color_before: Option<NoteColor>,
    subscription: Option<SubscriptionId>,
}

impl TodoPanel {
    pub fn new(id: NoteId, fallback: NoteColor) -> NoteResult<Self> {
        let path = StorePath::note(&id)?;
        let color_path = StorePath::note_color(&id)?;
        let empty = TodoList::new(id.clone(), fallback);
        Ok(Self {
            id,
            path,
            color_path,
            fallback,
            visible: false,
            detail_visible: false,
            reconciler: Reconciler::new(empty),
            session: EditSession::new(),
            detail_index: None,
            pending_color: None,
            color_writes: 0,
            color_before: None,
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

    pub fn list(&self) -> &TodoList {
        self.reconciler.shown()
    }

    pub fn session(&self) -> &EditSession<TodoDetail> {
        &self.session
    }

    pub fn detail(&self) -> Option<&TodoDetail> {
        self.session.draft()
    }

    pub fn is_detail_visible(&self) -> bool {
        self.detail_visible
    }

    fn decode(&self, value: Option<Value>) -> NoteResult<TodoList> {
        match value {
            Some(document) => {
                let decoded = decode_todo_list(&self.id, &document, self.fallback)?;
                decoded.log_warnings(&self.path.to_string());
                Ok(decoded.value)
            }
            None => {
                tracing::warn!(
                    path = %self.path,
                    "To-do list does not exist, showing an empty one"
                );
                Ok(TodoList::new(self.id.clone(), self.fallback))
            }
        }
    }

    pub fn apply_remote(&mut self, value: Option<Value>) -> NoteResult<bool> {
        let list = self.decode(value).inspect_err(|e| {
            tracing::warn!(path = %self.path, "Ignoring remote update: {}", e);
        })?;
        Ok(self.reconciler.receive(list, self.session.is_idle()))
    }

    /// Change the shared list colour and write just that field.
    pub fn select_color(&mut self, palette: Palette, client: &StoreClient) {
        let color = palette.color();
        self.color_before = Some(self.list().color);
        self.apply_color(color);

        self.color_writes += 1;
        tracing::info!(note = %self.id, color = palette.name(), "Writing list colour");
        client.set(
            self.color_path.clone(),
            json!(color.to_hex()),
            Ticket::new(self.id.clone(), self.color_writes, Purpose::ColorWrite),
        );
    }

    fn apply_color(&mut self, color: NoteColor) {
        self.reconciler.update_all(|list| list.color = color);
        if let Some(detail) = self.session.draft_mut() {
            detail.list.color = color;
        }
        if !self.session.is_idle() {
            self.pending_color = Some(color);
        }
    }

    fn apply_pending_color(&mut self) {
        if let Some(color) = self.pending_color
            && let Some(detail) = self.session.draft_mut()
        {
            detail.list.color = color;
        }
    }

    /// A failed write of the latest colour puts the previous one back.
    pub fn on_color_written(&mut self, generation: u64, result: NoteResult<()>) -> NoteResult<()> {
        if generation != self.color_writes {
            return result;
        }
        let previous = self.color_before.take();
        if result.is_err()
            && let Some(color) = previous
        {
            tracing::warn!(
                note = %self.id,
                color = %color.to_hex(),
                "Colour write failed, reverting"
            );
            self.apply_color(color);
        }
        result
    }

    pub fn open_detail(&mut self, index: usize, client: &StoreClient) -> NoteResult<()> {
        if index >= self.list().items.len() {
            return Err(NoteError::conflict(format!(
                "no item #{} in list {}",
                index + 1,
                self.id
            )));
        }
        let generation = self.session.begin_fetch()?;
        self.detail_index = Some(index);
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
        let index = self.detail_index.unwrap_or_default();
        let detail = result.and_then(|value| self.decode(value)).and_then(|list| {
            let id = list.id.clone();
            TodoDetail::open(list, index).ok_or_else(|| {
                NoteError::conflict(format!("item #{} of list {id} is gone", index + 1))
            })
        });

        match self.session.on_fetched(generation, detail) {
            Continuation::Stale => {
                tracing::debug!(note = %self.id, generation, "Dropping stale fetch result");
                Ok(())
            }
            Continuation::Applied(Ok(())) => {
                self.apply_pending_color();
                self.detail_visible = true;
                Ok(())
            }
            Continuation::Applied(Err(err)) => {
                self.detail_index = None;
                self.pending_color = None;
                self.reconciler.settle();
                Err(err)
            }
        }
    }

    pub fn edit_detail<R>(&mut self, apply: impl FnOnce(&mut TodoItem) -> R) -> NoteResult<R> {
        let state = self.session.state().name();
        let detail = self
            .session
            .draft_mut()
            .ok_or_else(|| NoteError::conflict(format!("no open item while {state}")))?;
        Ok(apply(&mut detail.item))
    }

    /// Write the whole list, shared colour included.
    pub fn save_detail(&mut self, client: &StoreClient) -> NoteResult<()> {
        self.apply_pending_color();
        let (generation, detail) = self.session.begin_commit()?;
        self.detail_visible = false;
        self.detail_index = None;

        let merged = detail.merged();
        let document = encode_todo_list(&merged);
        self.reconciler.show_provisional(merged);
        tracing::info!(note = %self.id, item = detail.index, "Saving to-do item");
        client.set(
            self.path.clone(),
            document,
            Ticket::new(self.id.clone(), generation, Purpose::Commit),
        );
        Ok(())
    }

    pub fn on_written(&mut self, generation: u64, result: NoteResult<()>) -> NoteResult<()> {
        match self.session.on_committed(generation, result) {
            Continuation::Stale => Ok(()),
            Continuation::Applied((detail, Ok(()))) => {
                let mut committed = detail.merged();
                if let Some(color) = self.pending_color.take() {
                    committed.color = color;
                }
                self.reconciler.settle_committed(committed);
                Ok(())
            }
            Continuation::Applied((_, Err(err))) => {
                self.pending_color = None;
                self.reconciler.settle();
                Err(err)
            }
        }
    }

    /// Back to the list view with the shared colour re-applied.
    pub fn cancel_detail(&mut self) -> bool {
        self.detail_visible = false;
        self.detail_index = None;
        let cancelled = self.session.cancel();
        self.pending_color = None;
        if cancelled {
            self.reconciler.settle();
        }
        cancelled
    }

    pub fn view(&self, selected: Option<usize>) -> PanelView {
        view::todo_view(self.list(), selected)
    }

    pub fn detail_view(&self) -> Option<PanelView> {
        if !self.detail_visible {
            return None;
        }
        self.detail().map(view::todo_detail_view)
    }
}

impl Panel for TodoPanel {
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
        self.cancel_detail();
    }

    fn is_visible(&self) -> bool {
        self.visible
    }
}
