//! Transport seams towards peers and the ordering service.
//!
//! Each call returns a `'static` boxed future so the client can run it inside
//! its own task group and bound it with a deadline.

use std::sync::Arc;

use futures_util::future::BoxFuture;

use crate::network::{OrdererEndpoint, PeerEndpoint};
use crate::transaction::proposal::SignedProposal;
use crate::transaction::types::{CommitEvent, EndorsementResponse, OrderingAck, TransportResult};
use crate::transaction::wire;

/// Sends signed proposals to a peer for execution.
pub trait Endorser: Send + Sync {
    fn process_proposal(
        &self,
        peer: &PeerEndpoint,
        proposal: &SignedProposal,
    ) -> BoxFuture<'static, TransportResult<EndorsementResponse>>;
}

/// Hands signed envelopes to an ordering node.
pub trait Orderer: Send + Sync {
    fn broadcast(
        &self,
        orderer: &OrdererEndpoint,
        envelope: &wire::Envelope,
    ) -> BoxFuture<'static, TransportResult<OrderingAck>>;
}

/// Observes commit notifications emitted by peers.
pub trait CommitListener: Send + Sync {
    /// Resolves once `peer` reports the transaction committed.
    fn wait_for_commit(
        &self,
        peer: &PeerEndpoint,
        tx_id: &str,
    ) -> BoxFuture<'static, TransportResult<CommitEvent>>;
}

/// The three transport roles a client needs.
#[derive(Clone)]
pub struct Transport {
    pub endorser: Arc<dyn Endorser>,
    pub orderer: Arc<dyn Orderer>,
    pub commits: Arc<dyn CommitListener>,
}

impl Transport {
    /// Use one implementation for all three roles.
    pub fn unified<T>(transport: T) -> Self
    where
        T: Endorser + Orderer + CommitListener + 'static,
    {
        let shared = Arc::new(transport);
        Self {
            endorser: shared.clone(),
            orderer: shared.clone(),
            commits: shared,
        }
    }
}

impl std::fmt::Debug for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transport").finish_non_exhaustive()
    }
}
