//! Published configuration snapshots.
//!
//! # Responsibilities
//! - Hold the single current-configuration slot
//! - Lock-free O(1) reads from any number of threads
//! - Atomic replace that only moves the version forward
//!
//! # Design Decisions
//! - `ArcSwapOption` slot: readers keep their `Arc` after a swap (snapshot isolation)
//! - Replace is a compare-and-swap loop, so two racing writers cannot both
//!   pass the version check against the same old snapshot
//! - Empty until the init gate publishes the bootstrap configuration

use std::sync::Arc;

use arc_swap::{ArcSwapOption, Guard};

use crate::error::{BridgeError, BridgeResult};
use crate::routing::types::{Configuration, Snapshot};

/// Holds the current routing configuration.
#[derive(Debug, Default)]
pub struct ConfigStore {
    slot: ArcSwapOption<Configuration>,
}

impl ConfigStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest published snapshot, or `None` before the first publication.
    pub fn current(&self) -> Option<Snapshot> {
        self.slot.load_full()
    }

    /// Version of the published snapshot.
    pub fn version(&self) -> Option<u64> {
        Option::as_ref(&*self.slot.load()).map(|c| c.version)
    }

    /// Publish `next` if its version is newer than the current one.
    ///
    /// Returns the snapshot that was replaced. On `StaleConfig` nothing changes.
    pub fn replace(&self, next: Configuration) -> BridgeResult<Option<Snapshot>> {
        let next = Arc::new(next);
        loop {
            let current = self.slot.load();
            if let Some(published) = Option::as_ref(&*current) {
                if next.version <= published.version {
                    return Err(BridgeError::StaleConfig {
                        current: published.version,
                        attempted: next.version,
                    });
                }
            }

            let previous = self.slot.compare_and_swap(&current, Some(next.clone()));
            let swapped = match (Option::as_ref(&*previous), Option::as_ref(&*current)) {
                (Some(a), Some(b)) => Arc::ptr_eq(a, b),
                (None, None) => true,
                _ => false,
            };
            if swapped {
                return Ok(Guard::into_inner(previous));
            }
            // Another writer got in first; re-check against its version.
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn config(version: u64) -> Configuration {
        Configuration {
            version,
            ..Configuration::empty()
        }
    }

    #[test]
    fn test_empty_store() {
        let store = ConfigStore::new();
        assert!(store.current().is_none());
        assert_eq!(store.version(), None);
    }

    #[test]
    fn test_monotonic_replace() {
        let store = ConfigStore::new();
        assert!(store.replace(config(1)).unwrap().is_none());
        let previous = store.replace(config(2)).unwrap();
        assert_eq!(previous.map(|c| c.version), Some(1));
        assert_eq!(store.current().map(|c| c.version), Some(2));
    }

    #[test]
    fn test_stale_replace_rejected() {
        let store = ConfigStore::new();
        store.replace(config(5)).unwrap();

        assert_eq!(
            store.replace(config(5)).unwrap_err(),
            BridgeError::StaleConfig {
                current: 5,
                attempted: 5
            }
        );
        assert!(store.replace(config(4)).is_err());
        assert_eq!(store.version(), Some(5));
    }

    #[test]
    fn test_snapshot_isolation() {
        let store = ConfigStore::new();
        store.replace(config(1)).unwrap();
        let held = store.current().unwrap();
        store.replace(config(2)).unwrap();
        assert_eq!(held.version, 1);
        assert_eq!(store.current().unwrap().version, 2);
    }

    #[test]
    fn test_concurrent_writers_keep_highest() {
        let store = Arc::new(ConfigStore::new());
        let handles: Vec<_> = (1..=16u64)
            .map(|v| {
                let store = store.clone();
                thread::spawn(move || {
                    let _ = store.replace(config(v));
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(store.version(), Some(16));
    }
}
