//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check required fields (version, non-empty patterns and handlers)
//! - Parse every route pattern
//! - Detect duplicate route patterns
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ConfigPayload → Result<Configuration, Vec<ValidationError>>
//! - Runs before config is accepted into the system
//! - Duplicates are rejected, never silently deduplicated

use std::collections::HashSet;

use crate::config::schema::ConfigPayload;
use crate::error::ValidationError;
use crate::routing::pattern::RoutePattern;
use crate::routing::types::{Configuration, Route};

/// Validate a payload and build the configuration it describes.
pub fn validate_payload(payload: &ConfigPayload) -> Result<Configuration, Vec<ValidationError>> {
    let mut errors = Vec::new();

    if payload.version.is_none() {
        errors.push(ValidationError::MissingVersion);
    }

    let mut routes = Vec::with_capacity(payload.routes.len());
    let mut seen = HashSet::new();

    for (index, entry) in payload.routes.iter().enumerate() {
        if entry.handler.trim().is_empty() {
            errors.push(ValidationError::EmptyHandler { index });
        }
        if entry.pattern.trim().is_empty() {
            errors.push(ValidationError::EmptyPattern { index });
            continue;
        }

        let pattern = match RoutePattern::parse(&entry.pattern) {
            Ok(p) => p,
            Err(reason) => {
                errors.push(ValidationError::InvalidPattern {
                    pattern: entry.pattern.clone(),
                    reason,
                });
                continue;
            }
        };

        let canonical = pattern.to_string();
        if !seen.insert(canonical.clone()) {
            errors.push(ValidationError::DuplicatePattern { pattern: canonical });
            continue;
        }

        routes.push(Route {
            pattern,
            handler: entry.handler.trim().to_string(),
        });
    }

    let default_handler = match &payload.default_handler {
        Some(handler) if handler.trim().is_empty() => {
            errors.push(ValidationError::EmptyDefaultHandler);
            None
        }
        Some(handler) => Some(handler.trim().to_string()),
        None => None,
    };

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(Configuration {
        version: payload.version.unwrap_or_default(),
        routes,
        default_handler,
        features: payload.features.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_payload() {
        let payload = ConfigPayload::new(3)
            .route("https://app.example/product/*", "ProductHandler")
            .route("activity:com.example.view", "ViewHandler")
            .default_handler("FallbackHandler")
            .feature("universal_links", true);

        let config = validate_payload(&payload).unwrap();
        assert_eq!(config.version, 3);
        assert_eq!(config.routes.len(), 2);
        assert_eq!(config.routes[0].handler, "ProductHandler");
        assert_eq!(config.default_handler.as_deref(), Some("FallbackHandler"));
        assert!(config.feature_enabled("universal_links"));
    }

    #[test]
    fn test_missing_version() {
        let payload = ConfigPayload {
            version: None,
            ..ConfigPayload::default()
        };
        assert_eq!(
            validate_payload(&payload).unwrap_err(),
            vec![ValidationError::MissingVersion]
        );
    }

    #[test]
    fn test_duplicate_patterns_rejected() {
        let payload = ConfigPayload::new(1)
            .route("https://app.example/a", "A")
            .route("HTTPS://App.Example/a/", "B");
        assert_eq!(
            validate_payload(&payload).unwrap_err(),
            vec![ValidationError::DuplicatePattern {
                pattern: "https://app.example/a".into()
            }]
        );
    }

    #[test]
    fn test_any_scheme_and_host_is_path_only_duplicate() {
        let payload = ConfigPayload::new(1).route("/a", "A").route("*://*/a", "B");
        assert_eq!(
            validate_payload(&payload).unwrap_err(),
            vec![ValidationError::DuplicatePattern { pattern: "/a".into() }]
        );
    }

    #[test]
    fn test_port_in_pattern_rejected() {
        let payload = ConfigPayload::new(1).route("https://app.example:8080/a", "A");
        assert!(matches!(
            validate_payload(&payload).unwrap_err().as_slice(),
            [ValidationError::InvalidPattern { .. }]
        ));
    }

    #[test]
    fn test_collects_all_errors() {
        let payload = ConfigPayload {
            version: None,
            ..ConfigPayload::default()
        }
        .route("", "A")
        .route("/b", " ")
        .route("bogus", "C")
        .default_handler("");

        let errors = validate_payload(&payload).unwrap_err();
        assert_eq!(errors.len(), 5);
        assert!(errors.contains(&ValidationError::MissingVersion));
        assert!(errors.contains(&ValidationError::EmptyPattern { index: 0 }));
        assert!(errors.contains(&ValidationError::EmptyHandler { index: 1 }));
        assert!(errors.contains(&ValidationError::EmptyDefaultHandler));
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::InvalidPattern { pattern, .. } if pattern == "bogus")));
    }

    #[test]
    fn test_empty_route_list_is_valid() {
        let config = validate_payload(&ConfigPayload::new(1)).unwrap();
        assert!(config.routes.is_empty());
        assert!(config.default_handler.is_none());
    }
}
