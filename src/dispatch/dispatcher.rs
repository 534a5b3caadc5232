//! Link dispatcher.
//!
//! # Responsibilities
//! - Own the configuration store and the init gate
//! - Validate and publish configuration payloads
//! - Match each incoming link against the current snapshot
//! - Invoke the resolved handler and report the outcome
//!
//! # Design Decisions
//! - One explicit instance per host, no global state
//! - Each link reads one snapshot; a concurrent apply never splits a match
//! - "No route" is an outcome, not an error
//! - Handler panics are contained and count as a declined link

use std::collections::VecDeque;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, TryLockError};

use arc_swap::ArcSwapOption;

use crate::config::schema::{BridgeSettings, ConfigPayload, DispatchConfig};
use crate::config::store::ConfigStore;
use crate::config::validation::validate_payload;
use crate::dispatch::bootstrap::{BootstrapSource, EmptyBootstrap, FileBootstrap};
use crate::dispatch::gate::{BridgeState, InitGate};
use crate::dispatch::listeners::{DispatchRecord, ListenerSet, Subscription};
use crate::dispatch::registry::{DispatchRequest, HandlerRegistry};
use crate::error::{BridgeError, BridgeResult};
use crate::observability::metrics;
use crate::routing::matcher::match_link;
use crate::routing::types::{
    Configuration, LinkEvent, MatchResult, MatchedRoute, Snapshot, UserActivity,
};

/// What happened to one link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// A handler accepted the link.
    Handled { handler: String },
    /// A handler was found but returned false (or panicked).
    HandlerDeclined { handler: String },
    /// The matched handler id has no registered handler.
    UnknownHandler { handler: String },
    /// No route and no default handler.
    NoRoute,
    /// Queued until the host calls `set_ready`.
    Deferred,
    /// Bootstrap failed; no configuration to match against.
    Unconfigured,
}

impl DispatchOutcome {
    /// The boolean the host sees.
    pub fn is_handled(&self) -> bool {
        matches!(self, DispatchOutcome::Handled { .. })
    }

    /// Metric / log label.
    pub fn label(&self) -> &'static str {
        match self {
            DispatchOutcome::Handled { .. } => "handled",
            DispatchOutcome::HandlerDeclined { .. } => "declined",
            DispatchOutcome::UnknownHandler { .. } => "unknown_handler",
            DispatchOutcome::NoRoute => "no_route",
            DispatchOutcome::Deferred => "deferred",
            DispatchOutcome::Unconfigured => "unconfigured",
        }
    }
}

/// Builder for [`Dispatcher`].
pub struct DispatcherBuilder {
    registry: Arc<HandlerRegistry>,
    bootstrap: Box<dyn BootstrapSource>,
    settings: DispatchConfig,
}

impl DispatcherBuilder {
    pub fn registry(mut self, registry: Arc<HandlerRegistry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn bootstrap(mut self, source: impl BootstrapSource + 'static) -> Self {
        self.bootstrap = Box::new(source);
        self
    }

    pub fn settings(mut self, settings: DispatchConfig) -> Self {
        self.settings = settings;
        self
    }

    pub fn build(self) -> Dispatcher {
        Dispatcher {
            store: ConfigStore::new(),
            gate: InitGate::new(),
            registry: self.registry,
            bootstrap: self.bootstrap,
            listeners: ListenerSet::new(),
            settings: self.settings,
            host_ready: AtomicBool::new(false),
            pending: Mutex::new(VecDeque::new()),
            replay: Mutex::new(()),
            last: ArcSwapOption::empty(),
        }
    }
}

/// Deep-link dispatcher. Hold one per process (or per test).
pub struct Dispatcher {
    store: ConfigStore,
    gate: InitGate,
    registry: Arc<HandlerRegistry>,
    bootstrap: Box<dyn BootstrapSource>,
    listeners: ListenerSet,
    settings: DispatchConfig,
    host_ready: AtomicBool,
    pending: Mutex<VecDeque<LinkEvent>>,
    replay: Mutex<()>,
    last: ArcSwapOption<DispatchRecord>,
}

impl Dispatcher {
    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder {
            registry: Arc::new(HandlerRegistry::new()),
            bootstrap: Box::new(EmptyBootstrap),
            settings: DispatchConfig::default(),
        }
    }

    /// Dispatcher with an empty bootstrap and default settings.
    pub fn new(registry: Arc<HandlerRegistry>) -> Self {
        Self::builder().registry(registry).build()
    }

    /// Dispatcher wired from a settings file.
    pub fn from_settings(settings: &BridgeSettings, registry: Arc<HandlerRegistry>) -> Self {
        let builder = Self::builder()
            .registry(registry)
            .settings(settings.dispatch.clone());
        match &settings.bootstrap.payload_path {
            Some(path) => builder.bootstrap(FileBootstrap::new(path)).build(),
            None => builder.build(),
        }
    }

    /// Lifecycle state. Never reports `Initializing` again once `Ready`.
    pub fn state(&self) -> BridgeState {
        self.gate.state()
    }

    pub fn registry(&self) -> &Arc<HandlerRegistry> {
        &self.registry
    }

    /// Current snapshot, if bootstrap has completed.
    pub fn snapshot(&self) -> Option<Snapshot> {
        self.store.current()
    }

    /// Run the bootstrap once. Idempotent and safe to call from any thread.
    pub fn configure_if_needed(&self) -> BridgeResult<()> {
        if self.gate.is_ready() {
            return Ok(());
        }
        match self.gate.run(|| self.bootstrap_once()) {
            Ok(ran) => {
                if ran {
                    metrics::record_bootstrap("ok");
                }
                Ok(())
            }
            Err(e) => {
                metrics::record_bootstrap("failed");
                tracing::warn!(error = %e, "Bootstrap failed, will retry on next call");
                Err(e)
            }
        }
    }

    fn bootstrap_once(&self) -> BridgeResult<()> {
        let payload = self
            .bootstrap
            .initial_payload()
            .map_err(into_bootstrap_failure)?;

        let config = match payload {
            Some(payload) => validate_payload(&payload).map_err(|errors| {
                into_bootstrap_failure(BridgeError::InvalidConfig(errors))
            })?,
            None => Configuration::empty(),
        };

        tracing::info!(
            version = config.version,
            routes = config.routes.len(),
            "Bootstrap configuration loaded"
        );
        self.publish(config).map(|_| ())
    }

    /// Validate `payload` and publish it.
    ///
    /// On an uninitialised dispatcher the payload itself becomes the
    /// bootstrap configuration. Returns the published version.
    pub fn apply_config(&self, payload: &ConfigPayload) -> BridgeResult<u64> {
        let config = match validate_payload(payload) {
            Ok(config) => config,
            Err(errors) => {
                metrics::record_config_rejected("invalid");
                tracing::warn!(errors = errors.len(), "Configuration payload rejected");
                return Err(BridgeError::InvalidConfig(errors));
            }
        };
        let version = config.version;

        let mut staged = Some(config);
        self.gate.run(|| match staged.take() {
            Some(config) => self.publish(config).map(|_| ()),
            None => Ok(()),
        })?;

        match staged {
            Some(config) => self.publish(config),
            None => Ok(version),
        }
    }

    fn publish(&self, config: Configuration) -> BridgeResult<u64> {
        let version = config.version;
        let routes = config.routes.len();
        match self.store.replace(config) {
            Ok(previous) => {
                metrics::record_config_applied(version);
                tracing::info!(
                    version,
                    previous_version = ?previous.map(|p| p.version),
                    routes,
                    "Configuration applied"
                );
                Ok(version)
            }
            Err(e) => {
                metrics::record_config_rejected("stale");
                tracing::warn!(error = %e, "Configuration rejected");
                Err(e)
            }
        }
    }

    /// Match without invoking a handler.
    pub fn resolve(&self, event: &LinkEvent) -> BridgeResult<MatchResult> {
        self.configure_if_needed()?;
        let snapshot = self.current_snapshot()?;
        Ok(match_link(event, &snapshot))
    }

    fn current_snapshot(&self) -> BridgeResult<Snapshot> {
        self.store
            .current()
            .ok_or_else(|| BridgeError::BootstrapFailed("no configuration published".into()))
    }

    /// Dispatch one link and report what happened.
    pub fn dispatch(&self, event: LinkEvent) -> DispatchOutcome {
        if self.settings.defer_until_ready && !self.host_ready.load(Ordering::Acquire) {
            let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
            // Re-check under the lock; set_ready flips the flag while holding it.
            if !self.host_ready.load(Ordering::Acquire) {
                let limit = self.settings.max_pending.max(1);
                while pending.len() >= limit {
                    pending.pop_front();
                    tracing::warn!(max_pending = limit, "Pending link queue full, dropping oldest link");
                }
                pending.push_back(event);
                metrics::record_pending(pending.len());
                metrics::record_dispatch(DispatchOutcome::Deferred.label());
                return DispatchOutcome::Deferred;
            }
        }
        self.dispatch_now(&event)
    }

    fn dispatch_now(&self, event: &LinkEvent) -> DispatchOutcome {
        let outcome = match self.configure_if_needed().and_then(|()| self.current_snapshot()) {
            Ok(snapshot) => match match_link(event, &snapshot) {
                MatchResult::Unmatched => DispatchOutcome::NoRoute,
                MatchResult::Matched(matched) => self.invoke(&matched, event, snapshot.version),
            },
            Err(_) => DispatchOutcome::Unconfigured,
        };

        metrics::record_dispatch(outcome.label());
        tracing::debug!(outcome = outcome.label(), event = ?event, "Link dispatched");
        outcome
    }

    fn invoke(&self, matched: &MatchedRoute, event: &LinkEvent, version: u64) -> DispatchOutcome {
        let handler_id = matched.handler.clone();
        let Some(handler) = self.registry.get(&handler_id) else {
            tracing::warn!(handler = %handler_id, "Matched handler is not registered");
            return DispatchOutcome::UnknownHandler {
                handler: handler_id,
            };
        };

        let request = DispatchRequest {
            handler: &handler_id,
            params: &matched.params,
            query: &matched.query,
            event,
            config_version: version,
        };

        match catch_unwind(AssertUnwindSafe(|| handler.handle(&request))) {
            Ok(true) => {
                let record = DispatchRecord {
                    handler: handler_id.clone(),
                    pattern: matched.pattern.clone(),
                    params: matched.params.clone(),
                    query: matched.query.clone(),
                    config_version: version,
                };
                self.last.store(Some(Arc::new(record.clone())));
                self.listeners.notify(&record);
                DispatchOutcome::Handled {
                    handler: handler_id,
                }
            }
            Ok(false) => DispatchOutcome::HandlerDeclined {
                handler: handler_id,
            },
            Err(_) => {
                tracing::error!(handler = %handler_id, "Link handler panicked");
                DispatchOutcome::HandlerDeclined {
                    handler: handler_id,
                }
            }
        }
    }

    /// Dispatch one link; `true` only when a handler accepted it.
    pub fn handle_link(&self, event: LinkEvent) -> bool {
        self.dispatch(event).is_handled()
    }

    /// Parse and dispatch a URL string. Unparseable URLs are not handled.
    pub fn handle_url(&self, url: &str) -> bool {
        match LinkEvent::from_url(url) {
            Ok(event) => self.handle_link(event),
            Err(e) => {
                metrics::record_dispatch("malformed");
                tracing::warn!(error = %e, "Ignoring malformed link");
                false
            }
        }
    }

    pub fn handle_user_activity(&self, activity: UserActivity) -> bool {
        self.handle_link(LinkEvent::Activity(activity))
    }

    /// Mark the host ready and replay queued links in arrival order.
    ///
    /// Links arriving during the replay are queued behind it; the host only
    /// becomes ready once the queue is drained. Returns how many replayed
    /// links were handled; a call made while another replay runs returns 0.
    pub fn set_ready(&self) -> usize {
        let _replaying = match self.replay.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            Err(TryLockError::WouldBlock) => return 0,
        };
        let mut handled = 0;
        loop {
            let batch = {
                let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
                if pending.is_empty() {
                    self.host_ready.store(true, Ordering::Release);
                    break;
                }
                std::mem::take(&mut *pending)
            };
            metrics::record_pending(0);
            tracing::info!(count = batch.len(), "Replaying pending links");
            handled += batch
                .iter()
                .filter(|event| self.dispatch_now(event).is_handled())
                .count();
        }
        handled
    }

    /// Number of links waiting for `set_ready`.
    pub fn pending_len(&self) -> usize {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Register a listener called after every handled link.
    pub fn on_link<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&DispatchRecord) + Send + Sync + 'static,
    {
        self.listeners.subscribe(listener)
    }

    /// Most recently handled link.
    pub fn last_dispatch(&self) -> Option<Arc<DispatchRecord>> {
        self.last.load_full()
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("state", &self.state())
            .field("version", &self.store.version())
            .field("registry", &self.registry)
            .field("listeners", &self.listeners)
            .finish_non_exhaustive()
    }
}

fn into_bootstrap_failure(err: BridgeError) -> BridgeError {
    match err {
        BridgeError::BootstrapFailed(_) => err,
        other => BridgeError::BootstrapFailed(other.to_string()),
    }
}
