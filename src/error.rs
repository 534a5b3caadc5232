//! Error types for the configuration lifecycle and link parsing.
//!
//! An unmatched link is not an error: it is a normal `false` from
//! `handle_link`. Everything here is local and recoverable by retrying.

use thiserror::Error;

/// A single problem found while validating a configuration payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Payload has no `version`.
    #[error("missing required field: version")]
    MissingVersion,

    /// Route at `index` has an empty pattern.
    #[error("route {index}: pattern is empty")]
    EmptyPattern { index: usize },

    /// Route at `index` has an empty handler identifier.
    #[error("route {index}: handler is empty")]
    EmptyHandler { index: usize },

    /// Pattern could not be parsed.
    #[error("invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// Two routes in the same payload share a pattern.
    #[error("duplicate route pattern '{pattern}'")]
    DuplicatePattern { pattern: String },

    /// `default_handler` is present but empty.
    #[error("default handler is empty")]
    EmptyDefaultHandler,

    /// Payload does not have the expected shape at all.
    #[error("malformed payload: {0}")]
    Malformed(String),
}

/// Errors surfaced by `configure_if_needed`, `apply_config` and
/// `ConfigStore::replace`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BridgeError {
    /// Payload failed validation; the published configuration is unchanged.
    #[error("invalid configuration: {}", join_errors(.0))]
    InvalidConfig(Vec<ValidationError>),

    /// Version is not greater than the published one.
    #[error("stale configuration: version {attempted} is not newer than published version {current}")]
    StaleConfig { current: u64, attempted: u64 },

    /// First-time bootstrap could not obtain an initial configuration.
    #[error("bootstrap failed: {0}")]
    BootstrapFailed(String),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result type for configuration operations.
pub type BridgeResult<T> = Result<T, BridgeError>;

/// A URL string that cannot be decomposed into scheme/host/path/query.
#[derive(Debug, Error)]
pub enum LinkError {
    #[error("unparseable link '{url}': {source}")]
    Parse {
        url: String,
        source: url::ParseError,
    },

    #[error("link '{0}' has no scheme")]
    MissingScheme(String),
}

/// Errors while reading a payload or settings file from disk.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported config file extension: {0}")]
    UnsupportedFormat(String),
}

impl From<LoadError> for BridgeError {
    fn from(err: LoadError) -> Self {
        BridgeError::BootstrapFailed(err.to_string())
    }
}
