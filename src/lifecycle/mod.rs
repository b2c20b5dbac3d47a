//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Init logging/metrics → Load identity → Resolve topology
//!     → Build transport → TransactionClient
//!
//! Signals (signals.rs):
//!     SIGINT → stop waiting for a commit event
//! ```
//!
//! # Design Decisions
//! - Ordered startup: identity before topology before transport
//! - No degraded client is ever returned

pub mod signals;
pub mod startup;

pub use startup::{connect, load_identity, StartupError};
