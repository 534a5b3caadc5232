//! Sources of the initial configuration payload.

use std::path::PathBuf;

use crate::config::loader::load_payload;
use crate::config::schema::ConfigPayload;
use crate::error::{BridgeError, BridgeResult};

/// Supplies the payload the init gate publishes on first use.
///
/// `Ok(None)` means no payload is available yet; the dispatcher then
/// starts from an empty configuration. `Err` fails the bootstrap and
/// leaves the dispatcher retryable.
pub trait BootstrapSource: Send + Sync {
    fn initial_payload(&self) -> BridgeResult<Option<ConfigPayload>>;
}

/// Always starts empty.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmptyBootstrap;

impl BootstrapSource for EmptyBootstrap {
    fn initial_payload(&self) -> BridgeResult<Option<ConfigPayload>> {
        Ok(None)
    }
}

/// A payload known up front (e.g. bundled with the host application).
#[derive(Debug, Clone)]
pub struct StaticBootstrap(pub ConfigPayload);

impl BootstrapSource for StaticBootstrap {
    fn initial_payload(&self) -> BridgeResult<Option<ConfigPayload>> {
        Ok(Some(self.0.clone()))
    }
}

/// Reads the payload from a TOML or JSON file.
#[derive(Debug, Clone)]
pub struct FileBootstrap {
    path: PathBuf,
}

impl FileBootstrap {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl BootstrapSource for FileBootstrap {
    fn initial_payload(&self) -> BridgeResult<Option<ConfigPayload>> {
        let payload = load_payload(&self.path).map_err(|e| {
            BridgeError::BootstrapFailed(format!("{}: {}", self.path.display(), e))
        })?;
        Ok(Some(payload))
    }
}

/// Any closure can act as a source, which keeps tests short.
impl<F> BootstrapSource for F
where
    F: Fn() -> BridgeResult<Option<ConfigPayload>> + Send + Sync,
{
    fn initial_payload(&self) -> BridgeResult<Option<ConfigPayload>> {
        self()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_and_static() {
        assert_eq!(EmptyBootstrap.initial_payload(), Ok(None));
        let payload = ConfigPayload::new(1).route("/a", "A");
        assert_eq!(
            StaticBootstrap(payload.clone()).initial_payload(),
            Ok(Some(payload))
        );
    }

    #[test]
    fn test_missing_file_fails_bootstrap() {
        let source = FileBootstrap::new(std::env::temp_dir().join("link_dispatch_no_such_payload.toml"));
        assert!(matches!(
            source.initial_payload(),
            Err(BridgeError::BootstrapFailed(_))
        ));
    }

    #[test]
    fn test_closure_source() {
        let source =
            || -> BridgeResult<Option<ConfigPayload>> { Err(BridgeError::BootstrapFailed("offline".into())) };
        assert!(source.initial_payload().is_err());
    }
}
