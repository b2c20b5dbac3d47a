//! Credential-based identity and transaction submission for a permissioned ledger.
//!
//! # Architecture Overview
//!
//! ```text
//!   credential artifacts ──▶ identity ──┐
//!                                       ├──▶ transaction::TransactionClient
//!   network profile ──────▶ network ────┘        │
//!                                                ├──▶ peers (endorse, notify commit)
//!                                                └──▶ orderers (broadcast)
//!
//!   config ──▶ lifecycle::startup wires the above; observability is ambient
//! ```

pub mod config;
pub mod identity;
pub mod lifecycle;
pub mod network;
pub mod observability;
pub mod transaction;

pub use config::ClientConfig;
pub use identity::{Identity, IdentityError};
pub use network::NetworkTopology;
pub use transaction::{CommitHandle, TransactionClient, TxError};
