//! Remote document store abstraction.
//!
//! A store holds one JSON tree addressed by [`StorePath`]. Calls on a
//! [`RemoteStore`] block; [`StoreClient`] is the non-blocking facade the UI
//! thread uses, delivering results as [`StoreEvent`]s on a channel.

pub mod client;
pub mod http;
pub mod memory;
pub mod path;
pub mod sqlite;
pub mod tree;

use serde_json::Value;
use std::fmt;
use std::sync::Mutex;
use std::sync::mpsc::Sender;
use uuid::Uuid;

use crate::error::NoteResult;
use crate::note::NoteId;

pub use client::{Dispatch, StoreClient};
pub use http::HttpStore;
pub use memory::MemoryStore;
pub use path::{NOTES_ROOT, StorePath};
pub use sqlite::SqliteStore;

pub trait RemoteStore: Send + Sync {
    /// One-shot read. `None` when nothing is stored at the path.
    fn get(&self, path: &StorePath) -> NoteResult<Option<Value>>;

    /// Full replace at the path. Writing `null` deletes.
    fn set(&self, path: &StorePath, value: Value) -> NoteResult<()>;

    /// Long-lived subscription. The current value is delivered first, then
    /// one [`StoreEvent::Changed`] per write at, above or below the path.
    fn subscribe(&self, path: &StorePath, tx: Sender<StoreEvent>) -> NoteResult<SubscriptionId>;

    fn unsubscribe(&self, id: SubscriptionId);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SubscriptionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What a one-shot request was issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Purpose {
    EditFetch,
    Commit,
    ColorWrite,
}

/// Identifies the request a one-shot result belongs to, so that a result
/// arriving after its requester moved on can be recognised and dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    pub note: NoteId,
    pub generation: u64,
    pub purpose: Purpose,
}

impl Ticket {
    pub fn new(note: NoteId, generation: u64, purpose: Purpose) -> Self {
        Self {
            note,
            generation,
            purpose,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    Fetched {
        ticket: Ticket,
        path: StorePath,
        result: NoteResult<Option<Value>>,
    },
    Written {
        ticket: Ticket,
        path: StorePath,
        result: NoteResult<()>,
    },
    Changed {
        subscription: SubscriptionId,
        path: StorePath,
        value: Option<Value>,
    },
    /// A subscription could not refresh its value (remote stores only).
    SubscriptionFailed {
        subscription: SubscriptionId,
        path: StorePath,
        error: crate::error::NoteError,
    },
}

struct Subscriber {
    id: SubscriptionId,
    path: StorePath,
    tx: Sender<StoreEvent>,
}

/// Subscriber bookkeeping shared by the local stores.
///
/// Stores call [`Subscribers::notify`] while still holding their write lock,
/// which keeps notifications for a path in write order.
#[derive(Default)]
pub struct Subscribers {
    entries: Mutex<Vec<Subscriber>>,
}

impl Subscribers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(
        &self,
        path: &StorePath,
        tx: Sender<StoreEvent>,
        current: Option<Value>,
    ) -> SubscriptionId {
        let id = SubscriptionId::new();
        let _ = tx.send(StoreEvent::Changed {
            subscription: id,
            path: path.clone(),
            value: current,
        });

        if let Ok(mut entries) = self.entries.lock() {
            entries.push(Subscriber {
                id,
                path: path.clone(),
                tx,
            });
        }
        tracing::debug!(path = %path, subscription = %id, "Subscribed");
        id
    }

    pub fn remove(&self, id: SubscriptionId) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.retain(|s| s.id != id);
        }
    }

    /// Send the new value to every subscriber whose path overlaps `changed`.
    /// Subscribers whose receiver is gone are dropped.
    pub fn notify(&self, changed: &StorePath, read: impl Fn(&StorePath) -> Option<Value>) {
        let Ok(mut entries) = self.entries.lock() else {
            return;
        };

        entries.retain(|s| {
            if !s.path.overlaps(changed) {
                return true;
            }
            let delivered = s
                .tx
                .send(StoreEvent::Changed {
                    subscription: s.id,
                    path: s.path.clone(),
                    value: read(&s.path),
                })
                .is_ok();
            if !delivered {
                tracing::debug!(path = %s.path, subscription = %s.id, "Dropping closed subscriber");
            }
            delivered
        });
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::mpsc;

    #[test]
    fn test_add_sends_current_value() {
        let subs = Subscribers::new();
        let (tx, rx) = mpsc::channel();
        let path = StorePath::parse("notes/a").unwrap();

        let id = subs.add(&path, tx, Some(json!({ "items": [] })));

        match rx.try_recv().unwrap() {
            StoreEvent::Changed { subscription, value, .. } => {
                assert_eq!(subscription, id);
                assert_eq!(value, Some(json!({ "items": [] })));
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_notify_only_overlapping() {
        let subs = Subscribers::new();
        let (tx_a, rx_a) = mpsc::channel();
        let (tx_b, rx_b) = mpsc::channel();
        subs.add(&StorePath::parse("notes/a").unwrap(), tx_a, None);
        subs.add(&StorePath::parse("notes/b").unwrap(), tx_b, None);
        rx_a.try_recv().unwrap();
        rx_b.try_recv().unwrap();

        subs.notify(&StorePath::parse("notes/a/colorHex").unwrap(), |_| Some(json!(1)));

        assert!(rx_a.try_recv().is_ok());
        assert!(rx_b.try_recv().is_err());
    }

    #[test]
    fn test_closed_receivers_are_dropped() {
        let subs = Subscribers::new();
        let (tx, rx) = mpsc::channel();
        subs.add(&StorePath::parse("notes/a").unwrap(), tx, None);
        drop(rx);

        subs.notify(&StorePath::parse("notes/a").unwrap(), |_| None);
        assert!(subs.is_empty());
    }

    #[test]
    fn test_remove() {
        let subs = Subscribers::new();
        let (tx, _rx) = mpsc::channel();
        let id = subs.add(&StorePath::parse("notes/a").unwrap(), tx, None);
        assert_eq!(subs.len(), 1);
        subs.remove(id);
        assert!(subs.is_empty());
    }
}
