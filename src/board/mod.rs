//! The panel board: every marker-bound panel, the coordinator that keeps one
//! of them on screen, and the routing of store results back to panels.
//!
//! Everything here runs on the UI thread. Store work happens elsewhere and
//! comes back through [`Board::poll_store`].

pub mod coordinator;
pub mod reconcile;
pub mod session;
pub mod shopping;
pub mod todo;
pub mod view;

use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

use crate::error::{NoteError, NoteResult};
use crate::note::{Note, NoteColor, NoteId, NoteKind, Palette, TodoItem};
use crate::store::{Purpose, StoreClient, StoreEvent, StorePath, SubscriptionId};

pub use coordinator::{Panel, PanelCoordinator, ShowOutcome};
pub use session::{Continuation, EditSession, SessionState};
pub use shopping::ShoppingPanel;
pub use todo::TodoPanel;
pub use view::{LineStyle, PanelView, ViewLine};

#[derive(Debug)]
pub enum PanelSlot {
    Shopping(ShoppingPanel),
    Todo(TodoPanel),
}

impl PanelSlot {
    pub fn kind(&self) -> NoteKind {
        match self {
            PanelSlot::Shopping(_) => NoteKind::Shopping,
            PanelSlot::Todo(_) => NoteKind::Todo,
        }
    }

    pub fn as_panel(&self) -> &dyn Panel {
        match self {
            PanelSlot::Shopping(p) => p,
            PanelSlot::Todo(p) => p,
        }
    }

    pub fn as_panel_mut(&mut self) -> &mut dyn Panel {
        match self {
            PanelSlot::Shopping(p) => p,
            PanelSlot::Todo(p) => p,
        }
    }

    fn path(&self) -> &StorePath {
        match self {
            PanelSlot::Shopping(p) => p.path(),
            PanelSlot::Todo(p) => p.path(),
        }
    }

    fn subscription(&self) -> Option<SubscriptionId> {
        match self {
            PanelSlot::Shopping(p) => p.subscription(),
            PanelSlot::Todo(p) => p.subscription(),
        }
    }

    fn set_subscription(&mut self, id: SubscriptionId) {
        match self {
            PanelSlot::Shopping(p) => p.set_subscription(id),
            PanelSlot::Todo(p) => p.set_subscription(id),
        }
    }

    /// Whether an edit or detail session is in progress.
    pub fn is_busy(&self) -> bool {
        match self {
            PanelSlot::Shopping(p) => !p.session().is_idle(),
            PanelSlot::Todo(p) => !p.session().is_idle(),
        }
    }

    fn apply_remote(&mut self, value: Option<Value>) -> NoteResult<bool> {
        match self {
            PanelSlot::Shopping(p) => p.apply_remote(value),
            PanelSlot::Todo(p) => p.apply_remote(value),
        }
    }

    fn on_fetched(&mut self, generation: u64, result: NoteResult<Option<Value>>) -> NoteResult<()> {
        match self {
            PanelSlot::Shopping(p) => p.on_fetched(generation, result),
            PanelSlot::Todo(p) => p.on_fetched(generation, result),
        }
    }

    fn on_written(
        &mut self,
        purpose: Purpose,
        generation: u64,
        result: NoteResult<()>,
    ) -> NoteResult<()> {
        match (self, purpose) {
            (PanelSlot::Todo(p), Purpose::ColorWrite) => p.on_color_written(generation, result),
            (PanelSlot::Shopping(p), _) => p.on_written(generation, result),
            (PanelSlot::Todo(p), _) => p.on_written(generation, result),
        }
    }
}

pub struct Board {
    client: StoreClient,
    fallback: NoteColor,
    coordinator: PanelCoordinator,
    panels: BTreeMap<NoteId, PanelSlot>,
    subscriptions: HashMap<SubscriptionId, NoteId>,
    errors: Vec<NoteError>,
}

impl Board {
    pub fn new(client: StoreClient, fallback: NoteColor) -> Self {
        Self {
            client,
            fallback,
            coordinator: PanelCoordinator::new(),
            panels: BTreeMap::new(),
            subscriptions: HashMap::new(),
            errors: Vec::new(),
        }
    }

    /// Board with one panel per marker binding.
    pub fn with_markers<I>(client: StoreClient, fallback: NoteColor, markers: I) -> NoteResult<Self>
    where
        I: IntoIterator<Item = (NoteId, NoteKind)>,
    {
        let mut board = Self::new(client, fallback);
        for (id, kind) in markers {
            board.register(id, kind)?;
        }
        Ok(board)
    }

    pub fn client(&self) -> &StoreClient {
        &self.client
    }

    pub fn fallback(&self) -> NoteColor {
        self.fallback
    }

    /// Register a panel. Registering an id again with the same kind is a
    /// no-op; with another kind it is rejected.
    pub fn register(&mut self, id: NoteId, kind: NoteKind) -> NoteResult<()> {
        if let Some(existing) = self.panels.get(&id) {
            if existing.kind() == kind {
                return Ok(());
            }
            return Err(NoteError::conflict(format!(
                "note {id} is already a {} note, cannot bind it as {kind}",
                existing.kind()
            )));
        }

        let slot = match kind {
            NoteKind::Shopping => {
                PanelSlot::Shopping(ShoppingPanel::new(id.clone(), self.fallback)?)
            }
            NoteKind::Todo => PanelSlot::Todo(TodoPanel::new(id.clone(), self.fallback)?),
        };
        tracing::debug!(note = %id, kind = %kind, "Registered panel");
        self.panels.insert(id, slot);
        Ok(())
    }

    pub fn register_shopping(&mut self, id: NoteId) -> NoteResult<()> {
        self.register(id, NoteKind::Shopping)
    }

    pub fn register_todo(&mut self, id: NoteId) -> NoteResult<()> {
        self.register(id, NoteKind::Todo)
    }

    pub fn panel(&self, id: &NoteId) -> Option<&PanelSlot> {
        self.panels.get(id)
    }

    pub fn panels(&self) -> impl Iterator<Item = &PanelSlot> {
        self.panels.values()
    }

    pub fn active_id(&self) -> Option<&NoteId> {
        self.coordinator.active()
    }

    pub fn active_panel(&self) -> Option<&PanelSlot> {
        self.coordinator.active().and_then(|id| self.panels.get(id))
    }

    /// Marker detected. The only way a panel gets on screen.
    pub fn on_target_found(&mut self, id: &NoteId) -> NoteResult<ShowOutcome> {
        let slot = self
            .panels
            .get_mut(id)
            .ok_or_else(|| NoteError::conflict(format!("no panel bound to note {id}")))?;

        let outcome = self.coordinator.request_show(slot.as_panel_mut());
        if matches!(outcome, ShowOutcome::Shown | ShowOutcome::AlreadyActive)
            && slot.subscription().is_none()
        {
            match self.client.subscribe(slot.path()) {
                Ok(subscription) => {
                    slot.set_subscription(subscription);
                    self.subscriptions.insert(subscription, id.clone());
                }
                Err(err) => {
                    tracing::error!(note = %id, "Subscribe failed: {}", err);
                    self.errors.push(err);
                }
            }
        }
        Ok(outcome)
    }

    /// Hide the active panel, dropping any edit in progress.
    pub fn close_active(&mut self) -> bool {
        let Some(id) = self.coordinator.active().cloned() else {
            return false;
        };
        match self.panels.get_mut(&id) {
            Some(slot) => self.coordinator.request_hide(slot.as_panel_mut()),
            None => false,
        }
    }

    fn active_shopping(&mut self) -> NoteResult<&mut ShoppingPanel> {
        match self.coordinator.active().and_then(|id| self.panels.get_mut(id)) {
            Some(PanelSlot::Shopping(panel)) => Ok(panel),
            Some(PanelSlot::Todo(_)) => {
                Err(NoteError::conflict("the active panel is a to-do list"))
            }
            None => Err(NoteError::conflict("no panel is active")),
        }
    }

    fn active_todo(&mut self) -> NoteResult<&mut TodoPanel> {
        match self.coordinator.active().and_then(|id| self.panels.get_mut(id)) {
            Some(PanelSlot::Todo(panel)) => Ok(panel),
            Some(PanelSlot::Shopping(_)) => {
                Err(NoteError::conflict("the active panel is a shopping list"))
            }
            None => Err(NoteError::conflict("no panel is active")),
        }
    }

    pub fn open_edit(&mut self) -> NoteResult<()> {
        let panel = match self.coordinator.active().and_then(|id| self.panels.get_mut(id)) {
            Some(PanelSlot::Shopping(panel)) => panel,
            _ => return Err(NoteError::conflict("no shopping panel is active")),
        };
        panel.open_edit(&self.client)
    }

    pub fn edit_draft<R>(
        &mut self,
        apply: impl FnOnce(&mut Note) -> NoteResult<R>,
    ) -> NoteResult<R> {
        self.active_shopping()?.edit(apply)
    }

    pub fn save_edit(&mut self) -> NoteResult<()> {
        let panel = match self.coordinator.active().and_then(|id| self.panels.get_mut(id)) {
            Some(PanelSlot::Shopping(panel)) => panel,
            _ => return Err(NoteError::conflict("no shopping panel is active")),
        };
        panel.save(&self.client)
    }

    pub fn cancel_edit(&mut self) -> NoteResult<bool> {
        Ok(self.active_shopping()?.cancel())
    }

    pub fn select_color(&mut self, palette: Palette) -> NoteResult<()> {
        let panel = match self.coordinator.active().and_then(|id| self.panels.get_mut(id)) {
            Some(PanelSlot::Todo(panel)) => panel,
            _ => return Err(NoteError::conflict("no to-do panel is active")),
        };
        panel.select_color(palette, &self.client);
        Ok(())
    }

    pub fn open_detail(&mut self, index: usize) -> NoteResult<()> {
        let panel = match self.coordinator.active().and_then(|id| self.panels.get_mut(id)) {
            Some(PanelSlot::Todo(panel)) => panel,
            _ => return Err(NoteError::conflict("no to-do panel is active")),
        };
        panel.open_detail(index, &self.client)
    }

    pub fn edit_detail<R>(&mut self, apply: impl FnOnce(&mut TodoItem) -> R) -> NoteResult<R> {
        self.active_todo()?.edit_detail(apply)
    }

    pub fn save_detail(&mut self) -> NoteResult<()> {
        let panel = match self.coordinator.active().and_then(|id| self.panels.get_mut(id)) {
            Some(PanelSlot::Todo(panel)) => panel,
            _ => return Err(NoteError::conflict("no to-do panel is active")),
        };
        panel.save_detail(&self.client)
    }

    pub fn cancel_detail(&mut self) -> NoteResult<bool> {
        Ok(self.active_todo()?.cancel_detail())
    }

    /// Drain store results and route them to their panels. Returns the
    /// number of events handled.
    pub fn poll_store(&mut self) -> usize {
        let events = self.client.poll();
        let count = events.len();
        for event in events {
            if let Err(err) = self.route(event) {
                if err.is_store() {
                    tracing::error!("{}", err);
                } else {
                    tracing::warn!("{}", err);
                }
                self.errors.push(err);
            }
        }
        count
    }

    fn route(&mut self, event: StoreEvent) -> NoteResult<()> {
        match event {
            StoreEvent::Changed {
                subscription, value, ..
            } => {
                let Some(slot) = self
                    .subscriptions
                    .get(&subscription)
                    .and_then(|id| self.panels.get_mut(id))
                else {
                    tracing::debug!(
                        subscription = %subscription,
                        "Update for unknown subscription"
                    );
                    return Ok(());
                };
                slot.apply_remote(value).map(|_| ())
            }
            StoreEvent::SubscriptionFailed { error, .. } => Err(error),
            StoreEvent::Fetched { ticket, result, .. } => match self.panels.get_mut(&ticket.note) {
                Some(slot) => slot.on_fetched(ticket.generation, result),
                None => Ok(()),
            },
            StoreEvent::Written { ticket, result, .. } => match self.panels.get_mut(&ticket.note) {
                Some(slot) => slot.on_written(ticket.purpose, ticket.generation, result),
                None => Ok(()),
            },
        }
    }

    /// Errors collected since the last call, oldest first.
    pub fn take_errors(&mut self) -> Vec<NoteError> {
        std::mem::take(&mut self.errors)
    }

    /// Drop every subscription and edit in progress.
    pub fn shutdown(&mut self) {
        for (subscription, _) in self.subscriptions.drain() {
            self.client.unsubscribe(subscription);
        }
        for slot in self.panels.values_mut() {
            slot.as_panel_mut().hide_edit();
        }
        tracing::info!("Board shut down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Dispatch, MemoryStore, RemoteStore};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Arc;

    fn create_test_board(root: Value) -> (Board, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::with_root(root));
        let client = StoreClient::new(store.clone(), Dispatch::Inline);
        let board = Board::with_markers(
            client,
            Palette::Red.color(),
            [
                (NoteId::new("note1"), NoteKind::Shopping),
                (NoteId::new("note2"), NoteKind::Todo),
                (NoteId::new("note3"), NoteKind::Shopping),
            ],
        )
        .unwrap();
        (board, store)
    }

    fn eggs() -> Value {
        json!({
            "notes": {
                "note1": {
                    "colorHex": "#4CAF50",
                    "items": [
                        { "name": "green eggs", "quantity": 12, "done": false, "isVisible": true }
                    ]
                },
                "note2": { "items": [{ "title": "Call plumber" }] }
            }
        })
    }

    fn shopping<'a>(board: &'a Board, id: &str) -> &'a ShoppingPanel {
        match board.panel(&NoteId::new(id)) {
            Some(PanelSlot::Shopping(panel)) => panel,
            other => panic!("not a shopping panel: {other:?}"),
        }
    }

    #[test]
    fn test_marker_shows_note_contents() {
        let (mut board, _store) = create_test_board(eggs());

        let outcome = board.on_target_found(&NoteId::new("note1")).unwrap();
        assert_eq!(outcome, ShowOutcome::Shown);
        board.poll_store();

        let view = shopping(&board, "note1").view();
        assert_eq!(
            view.lines,
            vec![ViewLine {
                text: "green eggs x 12".into(),
                style: LineStyle::Undone
            }]
        );
        assert_eq!(view.color, NoteColor::from_hex("#4CAF50").unwrap());
        assert!(board.take_errors().is_empty());
    }

    #[test]
    fn test_edit_then_cancel_leaves_store_and_panel_alone() {
        let (mut board, store) = create_test_board(eggs());
        let note1 = NoteId::new("note1");
        board.on_target_found(&note1).unwrap();
        board.poll_store();
        let before_panel = shopping(&board, "note1").note().clone();
        let before_store = store.get(&StorePath::note(&note1).unwrap()).unwrap();

        board.open_edit().unwrap();
        board.poll_store();
        board
            .edit_draft(|draft| {
                draft.add_item("ham", 1)?;
                draft.set_color(Palette::Purple.color());
                draft.toggle_done("green eggs")
            })
            .unwrap();
        assert!(board.cancel_edit().unwrap());
        board.poll_store();

        assert_eq!(shopping(&board, "note1").note(), &before_panel);
        assert_eq!(store.get(&StorePath::note(&note1).unwrap()).unwrap(), before_store);
    }

    #[test]
    fn test_first_marker_wins_until_closed() {
        let (mut board, _store) = create_test_board(eggs());
        let a = NoteId::new("note1");
        let b = NoteId::new("note3");

        assert_eq!(board.on_target_found(&a).unwrap(), ShowOutcome::Shown);
        assert_eq!(
            board.on_target_found(&b).unwrap(),
            ShowOutcome::Rejected { active: a.clone() }
        );
        assert!(!board.panel(&b).unwrap().as_panel().is_visible());

        assert!(board.close_active());
        assert_eq!(board.on_target_found(&b).unwrap(), ShowOutcome::Shown);
        assert!(!board.panel(&a).unwrap().as_panel().is_visible());
        assert_eq!(board.active_id(), Some(&b));
    }

    #[test]
    fn test_marker_twice_subscribes_once() {
        let (mut board, store) = create_test_board(eggs());
        let a = NoteId::new("note1");

        board.on_target_found(&a).unwrap();
        assert_eq!(board.on_target_found(&a).unwrap(), ShowOutcome::AlreadyActive);
        assert_eq!(store.subscriber_count(), 1);

        board.close_active();
        board.on_target_found(&a).unwrap();
        assert_eq!(store.subscriber_count(), 1);
    }

    #[test]
    fn test_rejected_marker_does_not_subscribe() {
        let (mut board, store) = create_test_board(eggs());
        board.on_target_found(&NoteId::new("note1")).unwrap();
        board.on_target_found(&NoteId::new("note2")).unwrap();
        assert_eq!(store.subscriber_count(), 1);
    }

    #[test]
    fn test_remote_change_during_edit_shows_after_save() {
        let (mut board, store) = create_test_board(eggs());
        let note1 = NoteId::new("note1");
        board.on_target_found(&note1).unwrap();
        board.poll_store();
        board.open_edit().unwrap();
        board.poll_store();

        store
            .set(
                &StorePath::note_color(&note1).unwrap(),
                json!("#FFEB3B"),
            )
            .unwrap();
        board.poll_store();

        let panel = shopping(&board, "note1");
        assert_eq!(panel.draft().unwrap().color, NoteColor::from_hex("#4CAF50").unwrap());
        assert_eq!(panel.note().color, NoteColor::from_hex("#4CAF50").unwrap());

        // Full-document save: last writer wins.
        board.save_edit().unwrap();
        board.poll_store();
        let panel = shopping(&board, "note1");
        assert!(panel.session().is_idle());
        assert_eq!(panel.note().color, NoteColor::from_hex("#4CAF50").unwrap());
    }

    #[test]
    fn test_close_during_fetch_ignores_late_result() {
        let (mut board, _store) = create_test_board(eggs());
        board.on_target_found(&NoteId::new("note1")).unwrap();
        board.open_edit().unwrap();
        board.close_active();

        board.poll_store();
        let panel = shopping(&board, "note1");
        assert!(panel.session().is_idle());
        assert!(panel.edit_view(None).is_none());
        assert!(board.take_errors().is_empty());
    }

    #[test]
    fn test_register_rejects_kind_change() {
        let (mut board, _store) = create_test_board(eggs());
        assert!(board.register_shopping(NoteId::new("note1")).is_ok());
        assert!(matches!(
            board.register_todo(NoteId::new("note1")),
            Err(NoteError::StateConflict { .. })
        ));
    }

    #[test]
    fn test_operations_need_matching_active_panel() {
        let (mut board, _store) = create_test_board(eggs());
        assert!(board.open_edit().is_err());

        board.on_target_found(&NoteId::new("note2")).unwrap();
        assert!(board.open_edit().is_err());
        assert!(board.select_color(Palette::Blue).is_ok());
        assert!(board.on_target_found(&NoteId::new("missing")).is_err());
    }

    #[test]
    fn test_todo_detail_round_trip() {
        let (mut board, store) = create_test_board(eggs());
        let note2 = NoteId::new("note2");
        board.on_target_found(&note2).unwrap();
        board.poll_store();

        board.open_detail(0).unwrap();
        board.poll_store();
        board.edit_detail(|item| item.important = true).unwrap();
        board.save_detail().unwrap();
        board.poll_store();

        let stored = store.get(&StorePath::note(&note2).unwrap()).unwrap().unwrap();
        assert_eq!(stored["items"][0]["important"], json!(true));
        assert_eq!(stored["colorHex"], json!(Palette::Red.color().to_hex()));
        assert!(board.take_errors().is_empty());
    }

    #[test]
    fn test_undecodable_note_is_reported() {
        let (mut board, _store) = create_test_board(json!({
            "notes": { "note1": "not a note" }
        }));
        board.on_target_found(&NoteId::new("note1")).unwrap();
        board.poll_store();

        let errors = board.take_errors();
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], NoteError::Schema { .. }));
        assert!(shopping(&board, "note1").note().items.is_empty());
    }

    #[test]
    fn test_shutdown_unsubscribes() {
        let (mut board, store) = create_test_board(eggs());
        board.on_target_found(&NoteId::new("note1")).unwrap();
        board.close_active();
        board.on_target_found(&NoteId::new("note2")).unwrap();
        assert_eq!(store.subscriber_count(), 2);

        board.shutdown();
        assert_eq!(store.subscriber_count(), 0);
    }
}
