//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! dispatch / config subsystems produce:
//!     → tracing events (structured fields)
//!     → metrics.rs (counters, gauges)
//!
//! Consumers:
//!     → logging.rs subscriber (stdout), installed by the binary
//!     → Prometheus scrape endpoint, installed by the binary
//! ```

pub mod logging;
pub mod metrics;
