//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! host mapping / payload file (TOML/JSON)
//!     → schema.rs (ConfigPayload, structural)
//!     → validation.rs (required fields, patterns, duplicates)
//!     → Configuration (validated, immutable, versioned)
//!     → store.rs (atomic, version-checked publish)
//!
//! On payload file change:
//!     watcher.rs detects change
//!     → loader.rs loads new payload
//!     → dispatcher validates and publishes
//!     → in-flight links keep the snapshot they already hold
//! ```
//!
//! # Design Decisions
//! - Config is immutable once published; changes replace the whole snapshot
//! - Settings fields all have defaults to allow minimal files
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod store;
pub mod validation;
pub mod watcher;

pub use schema::{BridgeSettings, ConfigPayload, RouteEntry};
pub use store::ConfigStore;
pub use validation::validate_payload;
