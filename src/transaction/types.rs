//! Transaction domain types and error definitions.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

use crate::identity::IdentityError;
use crate::network::TopologyError;
use crate::transaction::wire;

/// Lowest status code a peer uses to signal an error.
pub const ERROR_STATUS_THRESHOLD: i32 = 400;

/// Status code for a successful chaincode execution.
pub const STATUS_OK: i32 = 200;

/// Validation code the network assigns to a committed, valid transaction.
pub const TX_VALID: i32 = 0;

/// Why a peer's answer was left out of the endorsement set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExclusionReason {
    /// No answer within the proposal timeout.
    Timeout,
    /// Network or protocol failure talking to the peer.
    Transport(String),
    /// The peer answered with an error status.
    ErrorStatus { status: i32, message: String },
    /// The payload disagreed with the majority of endorsements.
    Inconsistent,
}

impl fmt::Display for ExclusionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExclusionReason::Timeout => write!(f, "timed out"),
            ExclusionReason::Transport(msg) => write!(f, "transport error: {}", msg),
            ExclusionReason::ErrorStatus { status, message } => {
                write!(f, "status {}: {}", status, message)
            }
            ExclusionReason::Inconsistent => write!(f, "inconsistent payload"),
        }
    }
}

/// A peer that did not contribute to the result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerExclusion {
    pub peer: String,
    pub reason: ExclusionReason,
}

impl fmt::Display for PeerExclusion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.peer, self.reason)
    }
}

/// Errors surfaced by the transaction client.
#[derive(Debug, Error)]
pub enum TxError {
    /// Rejected before any network call.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Zero usable endorsements; nothing was submitted.
    #[error("proposal rejected: no endorsement gathered ({} peers excluded)", .excluded.len())]
    ProposalRejected { excluded: Vec<PeerExclusion> },

    /// Query reached no peer at all.
    #[error("query failed: no peer answered ({} peers excluded)", .excluded.len())]
    ProposalFailed { excluded: Vec<PeerExclusion> },

    /// The ordering service did not accept the transaction.
    #[error("submission failed: {0}")]
    SubmissionFailed(String),

    /// No commit event within the wait window. The transaction may still commit.
    #[error("no commit event for {tx_id} within {waited:?}")]
    CommitTimeout { tx_id: String, waited: Duration },

    /// Every commit listener failed before an event arrived. Outcome unknown.
    #[error("commit status for {tx_id} unobservable: {reason}")]
    CommitUnobservable { tx_id: String, reason: String },

    /// Signing or creator serialization failed.
    #[error("identity error: {0}")]
    Identity(#[from] IdentityError),
}

impl TxError {
    /// Peers left out, for errors raised after partial I/O.
    pub fn excluded(&self) -> &[PeerExclusion] {
        match self {
            TxError::ProposalRejected { excluded } | TxError::ProposalFailed { excluded } => excluded,
            _ => &[],
        }
    }
}

/// Result type for transaction operations.
pub type TxResult<T> = Result<T, TxError>;

/// Errors raised by a transport while talking to one endpoint.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("endpoint returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("undecodable response: {0}")]
    Decode(String),

    #[error("bad endpoint: {0}")]
    Endpoint(String),
}

impl From<TopologyError> for TransportError {
    fn from(err: TopologyError) -> Self {
        TransportError::Endpoint(err.to_string())
    }
}

/// Result type for transport calls.
pub type TransportResult<T> = Result<T, TransportError>;

/// When the endorsement join barrier completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CollectPolicy {
    /// Wait until every peer answered or timed out.
    #[default]
    WaitForAll,
    /// Stop as soon as this many successful endorsements arrived.
    MinEndorsements(usize),
}

impl CollectPolicy {
    /// `0` means wait for all.
    pub fn from_min(min: usize) -> Self {
        if min == 0 {
            CollectPolicy::WaitForAll
        } else {
            CollectPolicy::MinEndorsements(min)
        }
    }
}

/// One peer's answer to a proposal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndorsementResponse {
    /// Name of the answering peer.
    pub peer: String,
    pub status: i32,
    pub message: String,
    pub payload: Vec<u8>,
    /// Serialized endorser identity.
    pub endorser: Vec<u8>,
    pub signature: Vec<u8>,
}

impl EndorsementResponse {
    pub fn from_wire(peer: &str, response: wire::ProposalResponse) -> Self {
        let endorsement = response.endorsement.unwrap_or_default();
        Self {
            peer: peer.to_string(),
            status: response.status,
            message: response.message,
            payload: response.payload,
            endorser: endorsement.endorser,
            signature: endorsement.signature,
        }
    }

    pub fn is_success(&self) -> bool {
        (STATUS_OK..ERROR_STATUS_THRESHOLD).contains(&self.status)
    }

    pub(crate) fn to_endorsement(&self) -> wire::Endorsement {
        wire::Endorsement {
            endorser: self.endorser.clone(),
            signature: self.signature.clone(),
        }
    }
}

/// Ordering service acknowledgment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderingAck {
    /// Orderer that accepted the envelope.
    pub orderer: String,
    pub status: i32,
    pub info: String,
}

/// The unit handed to the ordering service.
#[derive(Debug, Clone)]
pub struct SubmittedTransaction {
    pub tx_id: String,
    pub endorsements: Vec<EndorsementResponse>,
    /// Peers contacted but not part of `endorsements`.
    pub excluded: Vec<PeerExclusion>,
    pub ordering_ack: OrderingAck,
}

/// Commit notification for a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitEvent {
    pub tx_id: String,
    pub block_number: u64,
    pub validation_code: i32,
    /// Peer that delivered the event.
    pub peer: String,
}

impl CommitEvent {
    pub fn is_valid(&self) -> bool {
        self.validation_code == TX_VALID
    }
}
