//! Observers notified after each handled link.

use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use dashmap::DashMap;
use serde::Serialize;

/// What was dispatched, as reported to listeners and `last_dispatch`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchRecord {
    pub handler: String,
    pub pattern: Option<String>,
    pub params: BTreeMap<String, String>,
    pub query: Vec<(String, String)>,
    pub config_version: u64,
}

type Listener = Arc<dyn Fn(&DispatchRecord) + Send + Sync>;

#[derive(Default)]
struct ListenerTable {
    next_id: AtomicU64,
    entries: DashMap<u64, Listener>,
}

/// Set of registered listeners.
#[derive(Default)]
pub struct ListenerSet {
    table: Arc<ListenerTable>,
}

impl ListenerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&DispatchRecord) + Send + Sync + 'static,
    {
        let id = self.table.next_id.fetch_add(1, Ordering::Relaxed);
        self.table.entries.insert(id, Arc::new(listener));
        Subscription {
            id,
            table: Arc::downgrade(&self.table),
        }
    }

    pub fn len(&self) -> usize {
        self.table.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.entries.is_empty()
    }

    /// Call every listener. A panicking listener is logged and skipped.
    pub fn notify(&self, record: &DispatchRecord) {
        // Snapshot first so a listener can unsubscribe without deadlocking a shard.
        let listeners: Vec<(u64, Listener)> = self
            .table
            .entries
            .iter()
            .map(|r| (*r.key(), r.value().clone()))
            .collect();

        for (id, listener) in listeners {
            if catch_unwind(AssertUnwindSafe(|| listener(record))).is_err() {
                tracing::error!(listener = id, handler = %record.handler, "Link listener panicked");
            }
        }
    }
}

impl std::fmt::Debug for ListenerSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerSet").field("len", &self.len()).finish()
    }
}

/// Handle returned by `on_link`. Dropping it keeps the listener registered;
/// call `remove` to unregister.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    table: Weak<ListenerTable>,
}

impl Subscription {
    /// Unregister the listener. Returns false if it was already gone.
    pub fn remove(self) -> bool {
        match self.table.upgrade() {
            Some(table) => table.entries.remove(&self.id).is_some(),
            None => false,
        }
    }
}

impl std::fmt::Debug for ListenerTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerTable")
            .field("len", &self.entries.len())
            .finish()
    }
}
