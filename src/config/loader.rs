//! Configuration loading from disk.
//!
//! Payload files may be TOML or JSON, chosen by extension. Loading is
//! syntactic only; semantic checks happen when the payload is applied.

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;

use crate::config::schema::{BridgeSettings, ConfigPayload};
use crate::error::LoadError;

/// Load a routing payload from a `.toml` or `.json` file.
pub fn load_payload(path: &Path) -> Result<ConfigPayload, LoadError> {
    load_document(path)
}

/// Load bridge settings from a `.toml` or `.json` file.
pub fn load_settings(path: &Path) -> Result<BridgeSettings, LoadError> {
    load_document(path)
}

fn load_document<T: DeserializeOwned>(path: &Path) -> Result<T, LoadError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    let content = fs::read_to_string(path)?;
    match extension.as_str() {
        "toml" => Ok(toml::from_str(&content)?),
        "json" => Ok(serde_json::from_str(&content)?),
        _ => Err(LoadError::UnsupportedFormat(path.display().to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_file(name: &str, content: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("link_dispatch_loader_{}_{}", std::process::id(), name));
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_toml_payload() {
        let path = temp_file(
            "payload.toml",
            r#"
            version = 3
            default_handler = "FallbackHandler"

            [features]
            universal_links = true

            [[routes]]
            pattern = "https://app.example/product/*"
            handler = "ProductHandler"
            "#,
        );
        let payload = load_payload(&path).unwrap();
        assert_eq!(payload.version, Some(3));
        assert_eq!(payload.routes.len(), 1);
        assert_eq!(payload.routes[0].handler, "ProductHandler");
        assert_eq!(payload.features.get("universal_links"), Some(&true));
        fs::remove_file(path).unwrap_or_default();
    }

    #[test]
    fn test_load_json_payload() {
        let path = temp_file(
            "payload.json",
            r#"{"version": 1, "routes": [{"pattern": "/a", "handler": "A"}]}"#,
        );
        let payload = load_payload(&path).unwrap();
        assert_eq!(payload, ConfigPayload::new(1).route("/a", "A"));
        fs::remove_file(path).unwrap_or_default();
    }

    #[test]
    fn test_unsupported_extension() {
        let path = temp_file("payload.yaml", "version: 1");
        assert!(matches!(load_payload(&path), Err(LoadError::UnsupportedFormat(_))));
        fs::remove_file(path).unwrap_or_default();
    }

    #[test]
    fn test_missing_file() {
        let path = std::env::temp_dir().join("link_dispatch_loader_does_not_exist.toml");
        assert!(matches!(load_payload(&path), Err(LoadError::Io(_))));
    }

    #[test]
    fn test_load_settings() {
        let path = temp_file(
            "settings.toml",
            r#"
            [bootstrap]
            payload_path = "routes.toml"

            [observability]
            log_level = "debug"
            "#,
        );
        let settings = load_settings(&path).unwrap();
        assert_eq!(settings.bootstrap.payload_path.as_deref(), Some("routes.toml"));
        assert_eq!(settings.observability.log_level, "debug");
        assert_eq!(settings.observability.log_format, "compact");
        fs::remove_file(path).unwrap_or_default();
    }
}
