//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming link (scheme, host, path, query | activity type)
//!     → types.rs (LinkEvent, normalized scheme/host)
//!     → matcher.rs (evaluate every route of the snapshot)
//!     → Return: MatchResult::Matched or MatchResult::Unmatched
//!
//! Route Compilation (on every config apply):
//!     RouteEntry[] from the payload
//!     → pattern.rs (parse, canonicalize)
//!     → Freeze inside an immutable Configuration
//! ```
//!
//! # Design Decisions
//! - Routes compiled when a payload is validated, immutable afterwards
//! - No regex in hot path (segment comparison only)
//! - Deterministic: same input always matches same route
//! - Most specific route wins, declaration order breaks ties

pub mod matcher;
pub mod pattern;
pub mod types;

pub use matcher::match_link;
pub use pattern::RoutePattern;
pub use types::{
    Configuration, LinkEvent, LinkUrl, MatchResult, MatchedRoute, Route, Snapshot, UserActivity,
};
