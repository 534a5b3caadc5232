//! Configuration schema definitions.
//!
//! Two documents live here: the routing payload the host hands to
//! `apply_config`, and the bridge's own settings file. Both derive Serde
//! traits so they can come from TOML or JSON.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{BridgeError, ValidationError};

/// Routing configuration payload, as supplied by the host.
///
/// Structural only: `validation::validate_payload` turns it into a
/// `Configuration`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ConfigPayload {
    /// Generation counter. Required; must increase with every update.
    #[serde(default)]
    pub version: Option<u64>,

    /// Route list in declaration order.
    #[serde(default)]
    pub routes: Vec<RouteEntry>,

    /// Handler used when no route matches.
    #[serde(default)]
    pub default_handler: Option<String>,

    /// Feature flags.
    #[serde(default)]
    pub features: BTreeMap<String, bool>,
}

impl ConfigPayload {
    /// Start an empty payload at `version`.
    pub fn new(version: u64) -> Self {
        Self {
            version: Some(version),
            ..Self::default()
        }
    }

    pub fn route(mut self, pattern: impl Into<String>, handler: impl Into<String>) -> Self {
        self.routes.push(RouteEntry {
            pattern: pattern.into(),
            handler: handler.into(),
        });
        self
    }

    pub fn default_handler(mut self, handler: impl Into<String>) -> Self {
        self.default_handler = Some(handler.into());
        self
    }

    pub fn feature(mut self, name: impl Into<String>, enabled: bool) -> Self {
        self.features.insert(name.into(), enabled);
        self
    }

    /// Accept an already-parsed mapping from the host.
    pub fn from_value(value: serde_json::Value) -> Result<Self, BridgeError> {
        serde_json::from_value(value).map_err(|e| {
            BridgeError::InvalidConfig(vec![ValidationError::Malformed(e.to_string())])
        })
    }
}

/// One route of a payload.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RouteEntry {
    /// Pattern, e.g. `https://app.example/product/*`.
    pub pattern: String,

    /// Handler identifier resolved through the host's registry.
    pub handler: String,
}

/// Root settings for the bridge process.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct BridgeSettings {
    /// Where the initial payload comes from.
    pub bootstrap: BootstrapConfig,

    /// Dispatch behaviour.
    pub dispatch: DispatchConfig,

    /// Payload file watching.
    pub watch: WatchConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Bootstrap configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct BootstrapConfig {
    /// Payload file (TOML or JSON). Absent means start with no routes.
    pub payload_path: Option<String>,
}

/// Dispatch configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Queue links until the host calls `set_ready`.
    pub defer_until_ready: bool,

    /// Maximum queued links; the oldest is dropped when full.
    pub max_pending: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            defer_until_ready: false,
            max_pending: 64,
        }
    }
}

/// Watch configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Reload the payload file when it changes.
    pub enabled: bool,

    /// Poll interval for the fallback watcher, in seconds.
    pub poll_interval_secs: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            poll_interval_secs: 2,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// `compact` or `pretty`.
    pub log_format: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "compact".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = BridgeSettings::default();
        assert!(settings.bootstrap.payload_path.is_none());
        assert!(!settings.dispatch.defer_until_ready);
        assert_eq!(settings.dispatch.max_pending, 64);
        assert_eq!(settings.observability.log_level, "info");
    }

    #[test]
    fn test_partial_settings_toml() {
        let settings: BridgeSettings = toml::from_str(
            r#"
            [dispatch]
            defer_until_ready = true
            "#,
        )
        .unwrap();
        assert!(settings.dispatch.defer_until_ready);
        assert_eq!(settings.dispatch.max_pending, 64);
        assert!(!settings.watch.enabled);
    }

    #[test]
    fn test_payload_from_value() {
        let payload = ConfigPayload::from_value(serde_json::json!({
            "version": 2,
            "routes": [{ "pattern": "/a", "handler": "A" }],
            "default_handler": "Fallback"
        }))
        .unwrap();
        assert_eq!(payload, ConfigPayload::new(2).route("/a", "A").default_handler("Fallback"));
    }

    #[test]
    fn test_payload_from_value_malformed() {
        let err = ConfigPayload::from_value(serde_json::json!({
            "version": "two",
            "routes": "nope"
        }))
        .unwrap_err();
        assert!(matches!(
            err,
            BridgeError::InvalidConfig(ref errors) if matches!(errors[0], ValidationError::Malformed(_))
        ));
    }

    #[test]
    fn test_route_missing_handler_is_malformed() {
        let err = ConfigPayload::from_value(serde_json::json!({
            "version": 1,
            "routes": [{ "pattern": "/a" }]
        }));
        assert!(err.is_err());
    }
}
