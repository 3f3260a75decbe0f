use axum::{Router, routing::get};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use ar_notes::store::RemoteStore;

use super::handlers;

async fn health_check() -> &'static str {
    "ok"
}

pub fn create_router(store: Arc<dyn RemoteStore>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(health_check))
        .route(
            "/api/store/{*path}",
            get(handlers::get_document).put(handlers::put_document),
        )
        .with_state(store)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

#[cfg(test)]
mod tests {
    use super::create_router;
    use ar_notes::error::NoteError;
    use ar_notes::store::{HttpStore, MemoryStore, RemoteStore, StoreEvent, StorePath};
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};
    use std::sync::Arc;
    use std::sync::mpsc::{self, Receiver};
    use std::time::Duration;
    use tokio::runtime::Runtime;
    use tokio::task::JoinHandle;

    const POLL: Duration = Duration::from_millis(20);
    const WAIT: Duration = Duration::from_secs(3);

    /// Serve the router on an ephemeral port from a runtime owned by the test.
    fn start_server(store: Arc<MemoryStore>) -> (Runtime, JoinHandle<()>, String) {
        let rt = Runtime::new().unwrap();
        let listener = rt
            .block_on(tokio::net::TcpListener::bind("127.0.0.1:0"))
            .unwrap();
        let addr = listener.local_addr().unwrap();
        let app = create_router(store);
        let server = rt.spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        (rt, server, format!("http://{addr}"))
    }

    fn path(raw: &str) -> StorePath {
        StorePath::parse(raw).unwrap()
    }

    fn next_change(rx: &Receiver<StoreEvent>) -> Option<Value> {
        match rx.recv_timeout(WAIT).unwrap() {
            StoreEvent::Changed { value, .. } => value,
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_http_store_against_service() {
        let backing = Arc::new(MemoryStore::new());
        let (rt, server, url) = start_server(backing.clone());
        let store = HttpStore::new(&url, POLL, Duration::from_secs(2)).unwrap();
        let note = path("notes/note1");

        assert_eq!(store.get(&note).unwrap(), None);

        let doc = json!({ "colorHex": "#00BB77", "items": [{ "name": "milk", "quantity": 2 }] });
        store.set(&note, doc.clone()).unwrap();
        assert_eq!(backing.get(&note).unwrap(), Some(doc.clone()));
        assert_eq!(store.get(&note).unwrap(), Some(doc.clone()));
        assert_eq!(
            store.get(&path("notes/note1/colorHex")).unwrap(),
            Some(json!("#00BB77"))
        );

        // Current value first, then only real changes.
        let (tx, rx) = mpsc::channel();
        let id = store.subscribe(&note, tx).unwrap();
        assert_eq!(next_change(&rx), Some(doc));
        assert!(rx.recv_timeout(POLL * 6).is_err());

        store.set(&path("notes/note1/colorHex"), json!("#A8B5E0")).unwrap();
        assert_eq!(next_change(&rx).unwrap()["colorHex"], json!("#A8B5E0"));

        store.unsubscribe(id);
        std::thread::sleep(POLL * 4);
        while rx.try_recv().is_ok() {}
        backing.set(&note, json!({ "items": [] })).unwrap();
        assert!(rx.recv_timeout(POLL * 6).is_err());

        // An outage is reported once, not on every poll.
        let (tx, rx) = mpsc::channel();
        store.subscribe(&note, tx).unwrap();
        assert_eq!(next_change(&rx), Some(json!({ "items": [] })));

        server.abort();
        rt.shutdown_timeout(Duration::from_secs(1));

        match rx.recv_timeout(WAIT).unwrap() {
            StoreEvent::SubscriptionFailed { error, .. } => {
                assert!(matches!(error, NoteError::Store { .. }));
            }
            other => panic!("unexpected event: {other:?}"),
        }
        assert!(rx.recv_timeout(POLL * 10).is_err());
        assert!(matches!(store.get(&note), Err(NoteError::Store { .. })));
    }
}
