//! Transaction submission subsystem.
//!
//! # Data Flow
//! ```text
//! send_transaction(function, args)
//!     → proposal.rs (nonce, tx id, sign with active identity)
//!     → collect.rs (fan out to peers, per-peer timeout, join barrier)
//!     → collect.rs (drop failures, keep the consistent majority)
//!     → proposal.rs (envelope over the endorsements, signed)
//!     → commit.rs (listen for the commit event on endorsing peers)
//!     → client.rs (broadcast to orderers with failover)
//!     → CommitHandle
//! ```
//!
//! # Design Decisions
//! - Each call is a short-lived task group; abandoning it cancels peer calls
//! - Individual peer failures are collected, never raised
//! - Identity and chaincode are atomically swappable snapshots
//! - Transports sit behind traits; `HttpTransport` is the default

pub mod client;
pub mod collect;
pub mod commit;
pub mod http;
pub mod proposal;
pub mod transport;
pub mod types;
pub mod wire;

pub use client::{ClientSettings, TransactionClient};
pub use commit::CommitHandle;
pub use http::HttpTransport;
pub use proposal::{Proposal, SignedProposal};
pub use transport::{CommitListener, Endorser, Orderer, Transport};
pub use types::{
    CollectPolicy, CommitEvent, EndorsementResponse, ExclusionReason, OrderingAck, PeerExclusion,
    SubmittedTransaction, TransportError, TransportResult, TxError, TxResult,
};
