//! Structured logging.
//!
//! # Responsibilities
//! - Install the global tracing subscriber
//! - Honour `RUST_LOG` over the configured level
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - Key material never reaches a log field; credential types hide it in `Debug`

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when neither `RUST_LOG` nor a level is given.
pub fn default_filter(level: &str) -> String {
    format!("ledger_client={},warn", level)
}

/// Install the global subscriber. Returns false if one was already set.
pub fn init_logging(level: &str) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(level).into());

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .try_init()
        .is_ok()
}
