//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! identity / network / transaction produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout (fmt layer)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Metrics are cheap and safe to record without an installed exporter
//! - Log level from config, overridable through `RUST_LOG`

pub mod logging;
pub mod metrics;

pub use logging::init_logging;
pub use metrics::init_metrics;
