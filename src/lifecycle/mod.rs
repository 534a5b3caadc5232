//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Shutdown (shutdown.rs):
//!     trigger → reload loop exits → watcher dropped
//!
//! Signals (signals.rs):
//!     SIGINT → trigger shutdown
//! ```
//!
//! The dispatcher's own lifecycle (Uninitialized → Initializing → Ready)
//! lives in `dispatch::gate`.

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
