//! Deep-link / universal-link dispatch bridge.
//!
//! Receives link activations (URL schemes, universal links, platform
//! continuations), matches them against a hot-swappable routing
//! configuration and invokes the host's registered handler.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod lifecycle;
pub mod observability;
pub mod routing;

pub use config::{BridgeSettings, ConfigPayload};
pub use dispatch::{DispatchOutcome, Dispatcher, HandlerRegistry};
pub use error::{BridgeError, BridgeResult};
pub use routing::{LinkEvent, LinkUrl, MatchResult, UserActivity};
