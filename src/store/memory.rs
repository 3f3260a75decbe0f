use serde_json::{Map, Value};
use std::sync::mpsc::Sender;
use std::sync::{Mutex, MutexGuard};

use super::tree::{get_at, set_at};
use super::{RemoteStore, StoreEvent, StorePath, Subscribers, SubscriptionId};
use crate::error::{NoteError, NoteResult};

/// Process-local store over a single JSON tree. Used by tests and by the
/// client when no persistent backend is configured.
pub struct MemoryStore {
    root: Mutex<Value>,
    subscribers: Subscribers,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_root(Value::Object(Map::new()))
    }

    pub fn with_root(root: Value) -> Self {
        Self {
            root: Mutex::new(root),
            subscribers: Subscribers::new(),
        }
    }

    fn lock(&self, path: &StorePath) -> NoteResult<MutexGuard<'_, Value>> {
        self.root
            .lock()
            .map_err(|_| NoteError::store(path, "store lock poisoned"))
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

impl RemoteStore for MemoryStore {
    fn get(&self, path: &StorePath) -> NoteResult<Option<Value>> {
        let root = self.lock(path)?;
        Ok(get_at(&root, path.segments()).cloned())
    }

    fn set(&self, path: &StorePath, value: Value) -> NoteResult<()> {
        let mut root = self.lock(path)?;
        set_at(&mut root, path.segments(), value);
        tracing::debug!(path = %path, "Memory store write");
        self.subscribers
            .notify(path, |p| get_at(&root, p.segments()).cloned());
        Ok(())
    }

    fn subscribe(&self, path: &StorePath, tx: Sender<StoreEvent>) -> NoteResult<SubscriptionId> {
        let root = self.lock(path)?;
        let current = get_at(&root, path.segments()).cloned();
        Ok(self.subscribers.add(path, tx, current))
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.subscribers.remove(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::mpsc;

    fn path(raw: &str) -> StorePath {
        StorePath::parse(raw).unwrap()
    }

    fn changed_value(event: StoreEvent) -> Option<Value> {
        match event {
            StoreEvent::Changed { value, .. } => value,
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_get_missing_is_none() {
        let store = MemoryStore::new();
        assert_eq!(store.get(&path("notes/none")).unwrap(), None);
    }

    #[test]
    fn test_null_child_write_leaves_document_missing() {
        let store = MemoryStore::with_root(json!({ "notes": {} }));
        store.set(&path("notes/x/colorHex"), Value::Null).unwrap();
        assert_eq!(store.get(&path("notes/x")).unwrap(), None);
    }

    #[test]
    fn test_set_then_get() {
        let store = MemoryStore::new();
        store.set(&path("notes/a"), json!({ "items": [] })).unwrap();
        assert_eq!(store.get(&path("notes/a")).unwrap(), Some(json!({ "items": [] })));
    }

    #[test]
    fn test_child_write_notifies_document_subscriber() {
        let store = MemoryStore::new();
        store
            .set(&path("notes/a"), json!({ "colorHex": "#D20A2E", "items": [] }))
            .unwrap();

        let (tx, rx) = mpsc::channel();
        store.subscribe(&path("notes/a"), tx).unwrap();
        let initial = changed_value(rx.try_recv().unwrap()).unwrap();
        assert_eq!(initial["colorHex"], "#D20A2E");

        store.set(&path("notes/a/colorHex"), json!("#00BB77")).unwrap();
        let updated = changed_value(rx.try_recv().unwrap()).unwrap();
        assert_eq!(updated, json!({ "colorHex": "#00BB77", "items": [] }));
    }

    #[test]
    fn test_notifications_follow_write_order() {
        let store = MemoryStore::new();
        let (tx, rx) = mpsc::channel();
        store.subscribe(&path("notes/a"), tx).unwrap();
        assert_eq!(changed_value(rx.try_recv().unwrap()), None);

        for n in 0..5 {
            store.set(&path("notes/a"), json!({ "n": n })).unwrap();
        }

        let seen: Vec<Value> = rx
            .try_iter()
            .filter_map(changed_value)
            .map(|v| v["n"].clone())
            .collect();
        assert_eq!(seen, vec![json!(0), json!(1), json!(2), json!(3), json!(4)]);
    }

    #[test]
    fn test_unsubscribe_stops_notifications() {
        let store = MemoryStore::new();
        let (tx, rx) = mpsc::channel();
        let id = store.subscribe(&path("notes/a"), tx).unwrap();
        rx.try_recv().unwrap();

        store.unsubscribe(id);
        store.set(&path("notes/a"), json!({})).unwrap();
        assert!(rx.try_recv().is_err());
        assert_eq!(store.subscriber_count(), 0);
    }
}
