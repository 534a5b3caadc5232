//! Shutdown coordination for background tasks (reload loop, watcher).

use tokio::sync::broadcast;

/// Coordinator for graceful shutdown.
///
/// Every long-running task subscribes; `trigger` stops all of them.
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    /// Create a new shutdown coordinator.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Subscribe to the shutdown signal.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Trigger the shutdown signal. Returns how many tasks were listening.
    pub fn trigger(&self) -> usize {
        self.tx.send(()).unwrap_or(0)
    }

    /// Number of tasks still subscribed.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_trigger_reaches_subscribers() {
        let shutdown = Shutdown::new();
        let mut a = shutdown.subscribe();
        let mut b = shutdown.subscribe();
        assert_eq!(shutdown.receiver_count(), 2);

        assert_eq!(shutdown.trigger(), 2);
        assert!(a.recv().await.is_ok());
        assert!(b.recv().await.is_ok());
    }

    #[test]
    fn test_trigger_without_subscribers() {
        let shutdown = Shutdown::default();
        assert_eq!(shutdown.trigger(), 0);
    }
}
