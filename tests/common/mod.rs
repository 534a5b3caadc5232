//! Shared utilities for integration tests.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use link_dispatch::dispatch::DispatchRequest;
use link_dispatch::HandlerRegistry;

/// One handler invocation as seen by a [`Recorder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub handler: String,
    pub params: BTreeMap<String, String>,
    pub config_version: u64,
}

/// Records every invocation of the handlers it registers.
#[derive(Clone, Default)]
pub struct Recorder {
    calls: Arc<Mutex<Vec<Call>>>,
}

#[allow(dead_code)]
impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an accepting handler for each id.
    pub fn register(&self, registry: &HandlerRegistry, ids: &[&str]) {
        for id in ids {
            self.register_with(registry, id, true);
        }
    }

    /// Register a handler for `id` that records and returns `accept`.
    pub fn register_with(&self, registry: &HandlerRegistry, id: &str, accept: bool) {
        let calls = self.calls.clone();
        registry.register(id, move |req: &DispatchRequest<'_>| {
            calls.lock().unwrap().push(Call {
                handler: req.handler.to_string(),
                params: req.params.clone(),
                config_version: req.config_version,
            });
            accept
        });
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

/// Registry with accepting recording handlers for `ids`.
#[allow(dead_code)]
pub fn recording_registry(ids: &[&str]) -> (Arc<HandlerRegistry>, Recorder) {
    let registry = Arc::new(HandlerRegistry::new());
    let recorder = Recorder::new();
    recorder.register(&registry, ids);
    (registry, recorder)
}

/// Build a params map from pairs.
#[allow(dead_code)]
pub fn params(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}
