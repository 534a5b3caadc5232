//! Payload file watcher for hot reload.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::load_payload;
use crate::config::schema::ConfigPayload;

/// Monitors a payload file and forwards every successfully loaded payload.
///
/// Loading here is syntactic only; the receiver applies (and validates)
/// each payload.
pub struct ConfigWatcher {
    path: PathBuf,
    poll_interval: Duration,
    update_tx: mpsc::UnboundedSender<ConfigPayload>,
}

impl ConfigWatcher {
    /// Create a new ConfigWatcher.
    ///
    /// `poll_interval` only applies where notify falls back to polling;
    /// the native backends (inotify, FSEvents, ReadDirectoryChanges) are
    /// event driven. Returns the watcher and a receiver for payload updates.
    pub fn new(
        path: &Path,
        poll_interval: Duration,
    ) -> (Self, mpsc::UnboundedReceiver<ConfigPayload>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        (
            Self {
                path: path.to_path_buf(),
                poll_interval,
                update_tx,
            },
            update_rx,
        )
    }

    /// Start watching the file. Dropping the returned watcher stops it.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let tx = self.update_tx;
        let path = self.path.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if event.kind.is_modify() || event.kind.is_create() {
                        tracing::info!(path = %path.display(), "Payload file change detected, reloading");
                        match load_payload(&path) {
                            Ok(payload) => {
                                let _ = tx.send(payload);
                            }
                            Err(e) => {
                                tracing::error!(error = %e, "Failed to reload payload, keeping current configuration");
                            }
                        }
                    }
                }
                Err(e) => tracing::error!(error = ?e, "Watch error"),
            },
            Config::default().with_poll_interval(self.poll_interval),
        )?;

        watcher.watch(&self.path, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.path, "Payload watcher started");
        Ok(watcher)
    }
}
