use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};
use serde_json::{Map, Value};
use std::path::Path;
use std::sync::mpsc::Sender;
use std::sync::{Mutex, MutexGuard};

use super::tree::{get_at, set_at};
use super::{RemoteStore, StoreEvent, StorePath, Subscribers, SubscriptionId};
use crate::error::{NoteError, NoteResult};

/// Persistent local store. Each top-level document (`notes/{id}`) is one
/// row holding its JSON body; deeper writes rewrite the owning row.
pub struct SqliteStore {
    conn: Mutex<Connection>,
    subscribers: Subscribers,
}

impl SqliteStore {
    pub fn open(db_path: &Path) -> NoteResult<Self> {
        let conn = Connection::open(db_path).map_err(|e| {
            NoteError::store(db_path.display(), format!("failed to open database: {e}"))
        })?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> NoteResult<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| NoteError::store(":memory:", e))?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> NoteResult<Self> {
        init_schema(&conn).map_err(|e| NoteError::store("documents", e))?;
        Ok(Self {
            conn: Mutex::new(conn),
            subscribers: Subscribers::new(),
        })
    }

    fn lock(&self, path: &StorePath) -> NoteResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| NoteError::store(path, "database lock poisoned"))
    }
}

fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS documents (
            path TEXT PRIMARY KEY,
            body TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;
    Ok(())
}

fn document_of(path: &StorePath) -> NoteResult<StorePath> {
    path.document().ok_or_else(|| NoteError::InvalidPath {
        path: path.to_string(),
    })
}

fn load_document(conn: &Connection, doc: &StorePath) -> NoteResult<Option<Value>> {
    let body: Option<String> = conn
        .query_row(
            "SELECT body FROM documents WHERE path = ?1",
            [doc.to_string()],
            |row| row.get(0),
        )
        .optional()
        .map_err(|e| NoteError::store(doc, e))?;

    body.map(|raw| {
        serde_json::from_str(&raw)
            .map_err(|e| NoteError::store(doc, format!("corrupt document: {e}")))
    })
    .transpose()
}

fn store_document(conn: &Connection, doc: &StorePath, body: &Value) -> NoteResult<()> {
    if body.is_null() {
        conn.execute("DELETE FROM documents WHERE path = ?1", [doc.to_string()])
            .map_err(|e| NoteError::store(doc, e))?;
        return Ok(());
    }

    let raw = serde_json::to_string(body).map_err(|e| NoteError::store(doc, e))?;
    conn.execute(
        "INSERT INTO documents (path, body, updated_at) VALUES (?1, ?2, ?3)
         ON CONFLICT(path) DO UPDATE SET body = excluded.body, updated_at = excluded.updated_at",
        params![doc.to_string(), raw, Utc::now().to_rfc3339()],
    )
    .map_err(|e| NoteError::store(doc, e))?;
    Ok(())
}

fn read_path(conn: &Connection, path: &StorePath) -> NoteResult<Option<Value>> {
    let doc = document_of(path)?;
    Ok(load_document(conn, &doc)?.and_then(|body| get_at(&body, path.within_document()).cloned()))
}

impl RemoteStore for SqliteStore {
    fn get(&self, path: &StorePath) -> NoteResult<Option<Value>> {
        let conn = self.lock(path)?;
        read_path(&conn, path)
    }

    fn set(&self, path: &StorePath, value: Value) -> NoteResult<()> {
        let doc = document_of(path)?;
        let conn = self.lock(path)?;

        let body = if path.within_document().is_empty() {
            value
        } else {
            match load_document(&conn, &doc)? {
                Some(mut body) => {
                    set_at(&mut body, path.within_document(), value);
                    body
                }
                // Deleting below a missing document leaves it missing.
                None if value.is_null() => return Ok(()),
                None => {
                    let mut body = Value::Object(Map::new());
                    set_at(&mut body, path.within_document(), value);
                    body
                }
            }
        };

        store_document(&conn, &doc, &body)?;
        tracing::debug!(path = %path, "Document written");

        self.subscribers.notify(path, |p| match read_path(&conn, p) {
            Ok(value) => value,
            Err(e) => {
                tracing::error!(path = %p, "Failed to read back for subscriber: {}", e);
                None
            }
        });
        Ok(())
    }

    fn subscribe(&self, path: &StorePath, tx: Sender<StoreEvent>) -> NoteResult<SubscriptionId> {
        let conn = self.lock(path)?;
        let current = read_path(&conn, path)?;
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
    use tempfile::TempDir;

    fn path(raw: &str) -> StorePath {
        StorePath::parse(raw).unwrap()
    }

    #[test]
    fn test_set_and_get_document() {
        let store = SqliteStore::open_in_memory().unwrap();
        let doc = json!({ "colorHex": "#00BB77", "items": [{ "name": "eggs", "quantity": 12 }] });

        store.set(&path("notes/note1"), doc.clone()).unwrap();

        assert_eq!(store.get(&path("notes/note1")).unwrap(), Some(doc));
        assert_eq!(
            store.get(&path("notes/note1/colorHex")).unwrap(),
            Some(json!("#00BB77"))
        );
        assert_eq!(store.get(&path("notes/missing")).unwrap(), None);
    }

    #[test]
    fn test_child_write_rewrites_document() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .set(&path("notes/note2"), json!({ "items": [{ "title": "Pay rent" }] }))
            .unwrap();

        store.set(&path("notes/note2/colorHex"), json!("#FF964F")).unwrap();

        let doc = store.get(&path("notes/note2")).unwrap().unwrap();
        assert_eq!(doc["colorHex"], "#FF964F");
        assert_eq!(doc["items"][0]["title"], "Pay rent");
    }

    #[test]
    fn test_child_write_creates_document() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.set(&path("notes/fresh/colorHex"), json!("#FFDD3C")).unwrap();
        assert_eq!(
            store.get(&path("notes/fresh")).unwrap(),
            Some(json!({ "colorHex": "#FFDD3C" }))
        );
    }

    #[test]
    fn test_null_deletes_document() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.set(&path("notes/gone"), json!({ "items": [] })).unwrap();
        store.set(&path("notes/gone"), Value::Null).unwrap();
        assert_eq!(store.get(&path("notes/gone")).unwrap(), None);
        assert_eq!(store.get(&path("notes/gone/items")).unwrap(), None);
    }

    #[test]
    fn test_null_child_write_on_missing_document() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.set(&path("notes/x/colorHex"), Value::Null).unwrap();
        assert_eq!(store.get(&path("notes/x")).unwrap(), None);
    }

    #[test]
    fn test_shallow_paths_are_rejected() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert!(matches!(
            store.get(&path("notes")),
            Err(NoteError::InvalidPath { .. })
        ));
        assert!(store.set(&path("notes"), json!({})).is_err());
    }

    #[test]
    fn test_survives_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("notes.db");

        {
            let store = SqliteStore::open(&db_path).unwrap();
            store.set(&path("notes/note1"), json!({ "items": [] })).unwrap();
        }

        let store = SqliteStore::open(&db_path).unwrap();
        assert_eq!(store.get(&path("notes/note1")).unwrap(), Some(json!({ "items": [] })));
    }

    #[test]
    fn test_subscriber_sees_child_write() {
        let store = SqliteStore::open_in_memory().unwrap();
        let (tx, rx) = mpsc::channel();
        store.subscribe(&path("notes/note1"), tx).unwrap();
        assert!(matches!(
            rx.try_recv().unwrap(),
            StoreEvent::Changed { value: None, .. }
        ));

        store.set(&path("notes/note1/colorHex"), json!("#A8B5E0")).unwrap();

        match rx.try_recv().unwrap() {
            StoreEvent::Changed { value: Some(value), .. } => {
                assert_eq!(value, json!({ "colorHex": "#A8B5E0" }));
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }
}
