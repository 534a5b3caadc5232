//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber for the binary
//! - Pick the log level from `RUST_LOG`, falling back to settings
//!
//! # Design Decisions
//! - Library code only emits events; installing a subscriber is the host's call
//! - Compact format by default, pretty for development

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::schema::ObservabilityConfig;

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging(
    config: &ObservabilityConfig,
) -> Result<(), tracing_subscriber::util::TryInitError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(&config.log_level)));

    let registry = tracing_subscriber::registry().with(filter);
    match config.log_format.as_str() {
        "pretty" => registry
            .with(tracing_subscriber::fmt::layer().pretty())
            .try_init(),
        _ => registry
            .with(tracing_subscriber::fmt::layer().compact())
            .try_init(),
    }
}

fn default_directive(level: &str) -> String {
    format!("link_dispatch={}", level)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive() {
        assert_eq!(default_directive("debug"), "link_dispatch=debug");
    }
}
