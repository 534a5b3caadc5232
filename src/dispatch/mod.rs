//! Dispatch subsystem.
//!
//! # Data Flow
//! ```text
//! host → configure_if_needed()
//!     → gate.rs (exactly-once bootstrap)
//!     → bootstrap.rs (initial payload or empty)
//!     → config store
//!
//! host → apply_config(payload)
//!     → validate → config store replace (version-checked)
//!
//! host → handle_url / handle_user_activity / handle_link
//!     → dispatcher.rs (snapshot, match)
//!     → registry.rs (resolve handler id, invoke)
//!     → listeners.rs (notify on handled)
//!     → bool at the boundary, DispatchOutcome internally
//! ```

pub mod bootstrap;
pub mod dispatcher;
pub mod gate;
pub mod listeners;
pub mod registry;
pub mod reload;

pub use bootstrap::{BootstrapSource, EmptyBootstrap, FileBootstrap, StaticBootstrap};
pub use dispatcher::{DispatchOutcome, Dispatcher, DispatcherBuilder};
pub use gate::{BridgeState, InitGate};
pub use listeners::{DispatchRecord, Subscription};
pub use registry::{DispatchRequest, HandlerRegistry, LinkHandler};
