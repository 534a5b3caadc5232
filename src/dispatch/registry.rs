//! Handler registry supplied by the host.
//!
//! # Responsibilities
//! - Map handler identifiers to callables
//! - Allow registration changes while links are being dispatched
//!
//! # Design Decisions
//! - Injected into the dispatcher as `Arc<HandlerRegistry>`, not owned by it
//! - `DashMap` so lookups never block behind a registration

use std::collections::BTreeMap;
use std::sync::Arc;

use dashmap::DashMap;

use crate::routing::types::LinkEvent;

/// Everything a handler gets for one matched link.
#[derive(Debug, Clone, Copy)]
pub struct DispatchRequest<'a> {
    pub handler: &'a str,
    pub params: &'a BTreeMap<String, String>,
    pub query: &'a [(String, String)],
    pub event: &'a LinkEvent,
    pub config_version: u64,
}

impl DispatchRequest<'_> {
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// First query value for `key`.
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// A host-side link handler.
///
/// Returning `false` means the handler declined the link.
pub trait LinkHandler: Send + Sync {
    fn handle(&self, request: &DispatchRequest<'_>) -> bool;
}

impl<F> LinkHandler for F
where
    F: Fn(&DispatchRequest<'_>) -> bool + Send + Sync,
{
    fn handle(&self, request: &DispatchRequest<'_>) -> bool {
        self(request)
    }
}

/// Concurrent map of handler identifier → handler.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: DashMap<String, Arc<dyn LinkHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace the handler for `id`.
    pub fn register(&self, id: impl Into<String>, handler: impl LinkHandler + 'static) {
        self.handlers.insert(id.into(), Arc::new(handler));
    }

    pub fn unregister(&self, id: &str) -> bool {
        self.handlers.remove(id).is_some()
    }

    /// Clone the handler out so the map shard is not held during the call.
    pub fn get(&self, id: &str) -> Option<Arc<dyn LinkHandler>> {
        self.handlers.get(id).map(|r| r.value().clone())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.handlers.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut ids: Vec<String> = self.handlers.iter().map(|r| r.key().clone()).collect();
        ids.sort();
        f.debug_struct("HandlerRegistry").field("handlers", &ids).finish()
    }
}
