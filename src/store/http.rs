//! Client for the `/api/store` endpoints served by `arnotes serve`.
//!
//! The service has no push channel, so subscriptions poll on a background
//! thread and emit only when the value changes.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use super::{RemoteStore, StoreEvent, StorePath, SubscriptionId};
use crate::error::{NoteError, NoteResult};

pub struct HttpStore {
    base_url: String,
    client: reqwest::blocking::Client,
    poll_interval: Duration,
    subscriptions: Mutex<HashMap<SubscriptionId, Arc<AtomicBool>>>,
}

impl HttpStore {
    pub fn new(
        base_url: &str,
        poll_interval: Duration,
        request_timeout: Duration,
    ) -> NoteResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(request_timeout)
            .user_agent(concat!("ar-notes/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| NoteError::store(base_url, e))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            poll_interval,
            subscriptions: Mutex::new(HashMap::new()),
        })
    }

    fn url(&self, path: &StorePath) -> String {
        format!("{}/api/store/{}", self.base_url, path)
    }
}

fn fetch(
    client: &reqwest::blocking::Client,
    url: &str,
    path: &StorePath,
) -> NoteResult<Option<Value>> {
    let response = client
        .get(url)
        .send()
        .map_err(|e| NoteError::store(path, e))?;

    if !response.status().is_success() {
        return Err(NoteError::store(path, format!("server answered {}", response.status())));
    }

    let value: Value = response.json().map_err(|e| NoteError::store(path, e))?;
    Ok((!value.is_null()).then_some(value))
}

impl RemoteStore for HttpStore {
    fn get(&self, path: &StorePath) -> NoteResult<Option<Value>> {
        fetch(&self.client, &self.url(path), path)
    }

    fn set(&self, path: &StorePath, value: Value) -> NoteResult<()> {
        let response = self
            .client
            .put(self.url(path))
            .json(&value)
            .send()
            .map_err(|e| NoteError::store(path, e))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(NoteError::store(path, format!("server answered {}", response.status())))
        }
    }

    fn subscribe(&self, path: &StorePath, tx: Sender<StoreEvent>) -> NoteResult<SubscriptionId> {
        let id = SubscriptionId::new();
        let stop = Arc::new(AtomicBool::new(false));

        self.subscriptions
            .lock()
            .map_err(|_| NoteError::store(path, "subscription table poisoned"))?
            .insert(id, stop.clone());

        let client = self.client.clone();
        let url = self.url(path);
        let path = path.clone();
        let interval = self.poll_interval;

        thread::spawn(move || {
            let mut last: Option<Option<Value>> = None;
            let mut failing = false;

            while !stop.load(Ordering::Acquire) {
                let event = match fetch(&client, &url, &path) {
                    Ok(value) => {
                        failing = false;
                        if last.as_ref() == Some(&value) {
                            None
                        } else {
                            last = Some(value.clone());
                            Some(StoreEvent::Changed {
                                subscription: id,
                                path: path.clone(),
                                value,
                            })
                        }
                    }
                    // Report once per outage, not once per poll.
                    Err(error) if !failing => {
                        failing = true;
                        Some(StoreEvent::SubscriptionFailed {
                            subscription: id,
                            path: path.clone(),
                            error,
                        })
                    }
                    Err(_) => None,
                };

                if let Some(event) = event
                    && tx.send(event).is_err()
                {
                    break;
                }

                thread::sleep(interval);
            }

            tracing::debug!(path = %path, subscription = %id, "Polling subscription stopped");
        });

        Ok(id)
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        if let Ok(mut subscriptions) = self.subscriptions.lock()
            && let Some(stop) = subscriptions.remove(&id)
        {
            stop.store(true, Ordering::Release);
        }
    }
}
