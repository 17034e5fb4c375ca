//! Shared, per-portfolio namespace of deployment intents and shared
//! secrets (spec.md §4.C): a portfolio-wide session token for the run,
//! shared per-account rate-limit tokens, a shared dry-run flag. Each
//! key is single-writer: once a writer shares a key, only that same
//! writer may update or release it.

use crate::error::CoordinatorError;
use dashmap::DashMap;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

struct Entry {
    writer: String,
    value: Value,
}

pub struct Coordinator {
    entries: DashMap<String, Entry>,
    waiters: DashMap<String, Arc<Notify>>,
}

impl Default for Coordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl Coordinator {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            waiters: DashMap::new(),
        }
    }

    fn waiter_for(&self, key: &str) -> Arc<Notify> {
        self.waiters.entry(key.to_string()).or_insert_with(|| Arc::new(Notify::new())).clone()
    }

    /// Publishes `value` under `key` as `writer`. If the key is already
    /// held by a different writer this fails rather than silently
    /// overwriting (the single-writer invariant); the same writer may
    /// update its own key freely.
    pub fn share(&self, key: &str, writer: &str, value: Value) -> Result<(), CoordinatorError> {
        if let Some(existing) = self.entries.get(key) {
            if existing.writer != writer {
                return Err(CoordinatorError::WriterConflict {
                    key: key.to_string(),
                    holder: existing.writer.clone(),
                });
            }
        }
        self.entries.insert(key.to_string(), Entry { writer: writer.to_string(), value });
        self.waiter_for(key).notify_waiters();
        Ok(())
    }

    /// Returns the current value for `key` if one has been shared.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.entries.get(key).map(|e| e.value.clone())
    }

    /// Blocks until `key` has a value, then returns it. Used by
    /// per-domain pipelines that need a portfolio-wide session token
    /// or shared resource another pipeline is responsible for
    /// publishing.
    pub async fn await_value(&self, key: &str) -> Value {
        loop {
            if let Some(value) = self.get(key) {
                return value;
            }
            let notify = self.waiter_for(key);
            notify.notified().await;
        }
    }

    /// Like [`Coordinator::await_value`] but gives up after `timeout`.
    pub async fn await_value_timeout(&self, key: &str, timeout: Duration) -> Result<Value, CoordinatorError> {
        tokio::time::timeout(timeout, self.await_value(key))
            .await
            .map_err(|_| CoordinatorError::Timeout(key.to_string()))
    }

    /// Releases `key`, but only on behalf of the writer that holds it.
    pub fn release(&self, key: &str, writer: &str) -> Result<(), CoordinatorError> {
        let holder = match self.entries.get(key) {
            None => return Err(CoordinatorError::NotFound(key.to_string())),
            Some(entry) => entry.writer.clone(),
        };
        if holder != writer {
            return Err(CoordinatorError::NotOwner { key: key.to_string(), holder, attempted: writer.to_string() });
        }
        self.entries.remove(key);
        Ok(())
    }
}
