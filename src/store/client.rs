use serde_json::Value;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use super::{RemoteStore, StoreEvent, StorePath, SubscriptionId, Ticket};
use crate::error::NoteResult;

/// Where blocking store calls run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// On one worker thread owned by the client, in issue order. Used by
    /// the interactive client.
    Background,
    /// On the calling thread. The result is still queued and only applied
    /// on the next [`StoreClient::poll`], so callers observe the same
    /// ordering as with `Background`, deterministically.
    Inline,
}

/// Non-blocking facade over a [`RemoteStore`].
///
/// Requests return immediately; their results, and every subscription
/// notification, arrive on one channel that the UI thread drains with
/// [`StoreClient::poll`].
pub struct StoreClient {
    store: Arc<dyn RemoteStore>,
    worker: Option<Sender<Job>>,
    tx: Sender<StoreEvent>,
    rx: Receiver<StoreEvent>,
}

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Calls run one at a time so a later write never lands before an earlier
/// one. The thread exits once the client is dropped.
fn spawn_worker() -> Sender<Job> {
    let (jobs_tx, jobs_rx) = mpsc::channel::<Job>();
    thread::spawn(move || {
        for job in jobs_rx {
            job();
        }
        tracing::debug!("Store worker stopped");
    });
    jobs_tx
}

impl StoreClient {
    pub fn new(store: Arc<dyn RemoteStore>, dispatch: Dispatch) -> Self {
        let (tx, rx) = mpsc::channel();
        let worker = match dispatch {
            Dispatch::Background => Some(spawn_worker()),
            Dispatch::Inline => None,
        };
        Self {
            store,
            worker,
            tx,
            rx,
        }
    }

    pub fn store(&self) -> &Arc<dyn RemoteStore> {
        &self.store
    }

    fn run(&self, job: impl FnOnce() + Send + 'static) {
        match &self.worker {
            None => job(),
            Some(worker) => {
                if worker.send(Box::new(job)).is_err() {
                    tracing::error!("Store worker is gone, dropping request");
                }
            }
        }
    }

    pub fn get(&self, path: StorePath, ticket: Ticket) {
        tracing::debug!(path = %path, generation = ticket.generation, "Fetch requested");
        let store = Arc::clone(&self.store);
        let tx = self.tx.clone();
        self.run(move || {
            let result = store.get(&path);
            let _ = tx.send(StoreEvent::Fetched { ticket, path, result });
        });
    }

    pub fn set(&self, path: StorePath, value: Value, ticket: Ticket) {
        tracing::debug!(path = %path, generation = ticket.generation, "Write requested");
        let store = Arc::clone(&self.store);
        let tx = self.tx.clone();
        self.run(move || {
            let result = store.set(&path, value);
            let _ = tx.send(StoreEvent::Written { ticket, path, result });
        });
    }

    /// Registration itself is synchronous; values arrive through [`poll`].
    ///
    /// [`poll`]: StoreClient::poll
    pub fn subscribe(&self, path: &StorePath) -> NoteResult<SubscriptionId> {
        self.store.subscribe(path, self.tx.clone())
    }

    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.store.unsubscribe(id);
    }

    /// Drain every event that has arrived so far (non-blocking).
    pub fn poll(&self) -> Vec<StoreEvent> {
        self.rx.try_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::note::NoteId;
    use crate::store::{MemoryStore, Purpose};
    use serde_json::json;
    use std::time::{Duration, Instant};

    fn ticket(generation: u64) -> Ticket {
        Ticket::new(NoteId::new("note1"), generation, Purpose::EditFetch)
    }

    #[test]
    fn test_inline_results_wait_for_poll() {
        let client = StoreClient::new(Arc::new(MemoryStore::new()), Dispatch::Inline);
        let path = StorePath::parse("notes/note1").unwrap();

        client.set(path.clone(), json!({ "items": [] }), ticket(1));
        client.get(path.clone(), ticket(2));

        let events = client.poll();
        assert_eq!(events.len(), 2);
        assert!(matches!(&events[0], StoreEvent::Written { result: Ok(()), .. }));
        match &events[1] {
            StoreEvent::Fetched { ticket, result, .. } => {
                assert_eq!(ticket.generation, 2);
                assert_eq!(result, &Ok(Some(json!({ "items": [] }))));
            }
            other => panic!("unexpected event: {other:?}"),
        }
        assert!(client.poll().is_empty());
    }

    #[test]
    fn test_background_results_arrive() {
        let store = Arc::new(MemoryStore::new());
        let client = StoreClient::new(store, Dispatch::Background);
        let path = StorePath::parse("notes/note1").unwrap();

        client.get(path, ticket(7));

        let deadline = Instant::now() + Duration::from_secs(5);
        let mut events = Vec::new();
        while events.is_empty() && Instant::now() < deadline {
            events = client.poll();
            std::thread::sleep(Duration::from_millis(5));
        }

        assert!(matches!(
            &events[..],
            [StoreEvent::Fetched { result: Ok(None), .. }]
        ));
    }

    #[test]
    fn test_subscription_events_share_the_channel() {
        let client = StoreClient::new(Arc::new(MemoryStore::new()), Dispatch::Inline);
        let path = StorePath::parse("notes/note1").unwrap();

        let id = client.subscribe(&path).unwrap();
        client.set(path.clone(), json!({ "colorHex": "#00BB77" }), ticket(1));

        let events = client.poll();
        assert_eq!(events.len(), 3);
        assert!(matches!(
            &events[0],
            StoreEvent::Changed { subscription, value: None, .. } if *subscription == id
        ));
        assert!(matches!(&events[1], StoreEvent::Changed { value: Some(_), .. }));
        assert!(matches!(&events[2], StoreEvent::Written { .. }));
    }

    #[test]
    fn test_background_writes_keep_issue_order() {
        let store = Arc::new(MemoryStore::new());
        let client = StoreClient::new(store.clone(), Dispatch::Background);
        let doc = StorePath::parse("notes/note2").unwrap();
        let color = StorePath::parse("notes/note2/colorHex").unwrap();

        for i in 0..20 {
            let hex = format!("#0000{i:02X}");
            client.set(color.clone(), json!(hex), ticket(i * 2));
            let full = json!({ "colorHex": "#FFFFFF", "round": i });
            client.set(doc.clone(), full, ticket(i * 2 + 1));
        }
        client.set(color.clone(), json!("#B19CD9"), ticket(100));

        let deadline = Instant::now() + Duration::from_secs(5);
        let mut generations = Vec::new();
        while generations.len() < 41 && Instant::now() < deadline {
            for event in client.poll() {
                if let StoreEvent::Written { ticket, .. } = event {
                    generations.push(ticket.generation);
                }
            }
            std::thread::sleep(Duration::from_millis(5));
        }

        let expected: Vec<u64> = (0..40).chain([100]).collect();
        assert_eq!(generations, expected);
        assert_eq!(
            store.get(&doc).unwrap(),
            Some(json!({ "colorHex": "#B19CD9", "round": 19 }))
        );
    }
}
