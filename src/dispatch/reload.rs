//! Applies payloads arriving from the watcher (or any other producer).

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};

use crate::config::schema::ConfigPayload;
use crate::dispatch::dispatcher::Dispatcher;

/// Counts kept by the reload loop, returned when it stops.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReloadStats {
    pub applied: usize,
    pub rejected: usize,
}

/// Apply every received payload until the channel closes or shutdown fires.
///
/// Rejected payloads (invalid or stale) are logged and the current
/// configuration stays published.
pub async fn run_reload_loop(
    dispatcher: Arc<Dispatcher>,
    mut updates: mpsc::UnboundedReceiver<ConfigPayload>,
    mut shutdown: broadcast::Receiver<()>,
) -> ReloadStats {
    let mut stats = ReloadStats::default();
    loop {
        tokio::select! {
            update = updates.recv() => {
                let Some(payload) = update else {
                    tracing::debug!("Payload channel closed, reload loop exiting");
                    break;
                };
                match dispatcher.apply_config(&payload) {
                    Ok(version) => {
                        stats.applied += 1;
                        tracing::info!(version, "Reloaded configuration");
                    }
                    Err(e) => {
                        stats.rejected += 1;
                        tracing::error!(error = %e, "Failed to apply reloaded configuration, keeping current");
                    }
                }
            }
            _ = shutdown.recv() => {
                tracing::info!("Shutdown signal received, reload loop exiting");
                break;
            }
        }
    }
    stats
}
