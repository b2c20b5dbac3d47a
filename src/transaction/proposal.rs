//! Proposal and envelope construction.
//!
//! # Responsibilities
//! - Build proposals with a fresh nonce and derived transaction id
//! - Sign proposals and transaction envelopes with the active identity

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use prost::Message;
use sha2::{Digest, Sha256};

use crate::identity::Identity;
use crate::transaction::types::{EndorsementResponse, TxError, TxResult};
use crate::transaction::wire;

/// Nonce length in bytes.
pub const NONCE_LEN: usize = 24;

/// A request to execute `function(args)` on a chaincode. Never persisted.
#[derive(Debug, Clone)]
pub struct Proposal {
    pub channel_id: String,
    pub chaincode: String,
    pub function: String,
    pub args: Vec<Vec<u8>>,
    pub nonce: Vec<u8>,
    /// Serialized creator identity.
    pub creator: Vec<u8>,
    pub tx_id: String,
    pub timeout: Duration,
    pub timestamp_millis: u64,
}

impl Proposal {
    /// Build a proposal for `identity` with a fresh nonce.
    pub fn new(
        channel_id: &str,
        chaincode: &str,
        function: &str,
        args: &[Vec<u8>],
        identity: &Identity,
        timeout: Duration,
    ) -> TxResult<Self> {
        if function.is_empty() {
            return Err(TxError::InvalidArgument("function name is empty".to_string()));
        }

        let creator = identity.creator_bytes()?;
        let nonce = rand::random::<[u8; NONCE_LEN]>().to_vec();
        let tx_id = compute_tx_id(&nonce, &creator);
        let timestamp_millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;

        Ok(Self {
            channel_id: channel_id.to_string(),
            chaincode: chaincode.to_string(),
            function: function.to_string(),
            args: args.to_vec(),
            nonce,
            creator,
            tx_id,
            timeout,
            timestamp_millis,
        })
    }

    pub fn to_wire(&self) -> wire::Proposal {
        wire::Proposal {
            header: Some(wire::ProposalHeader {
                channel_id: self.channel_id.clone(),
                tx_id: self.tx_id.clone(),
                chaincode: self.chaincode.clone(),
                timestamp_millis: self.timestamp_millis,
                creator: self.creator.clone(),
                nonce: self.nonce.clone(),
            }),
            input: Some(wire::ChaincodeInput {
                function: self.function.clone(),
                args: self.args.clone(),
            }),
            timeout_ms: self.timeout.as_millis() as u64,
        }
    }

    /// Sign the encoded proposal.
    pub fn sign(&self, identity: &Identity) -> TxResult<SignedProposal> {
        let proposal_bytes = self.to_wire().encode_to_vec();
        let signature = identity.sign(&proposal_bytes)?;
        Ok(SignedProposal {
            tx_id: self.tx_id.clone(),
            proposal_bytes,
            signature,
        })
    }
}

/// Encoded proposal plus the creator's signature over it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedProposal {
    pub tx_id: String,
    pub proposal_bytes: Vec<u8>,
    pub signature: Vec<u8>,
}

impl SignedProposal {
    pub fn to_wire(&self) -> wire::SignedProposal {
        wire::SignedProposal {
            proposal_bytes: self.proposal_bytes.clone(),
            signature: self.signature.clone(),
        }
    }
}

/// hex(SHA-256(nonce ‖ creator)).
pub fn compute_tx_id(nonce: &[u8], creator: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(nonce);
    hasher.update(creator);
    hex::encode(hasher.finalize())
}

/// Wrap a proposal and its endorsements into a signed envelope.
///
/// `endorsements` must be non-empty and share one payload.
pub fn build_envelope(
    proposal: &SignedProposal,
    endorsements: &[EndorsementResponse],
    identity: &Identity,
) -> TxResult<wire::Envelope> {
    let first = endorsements
        .first()
        .ok_or_else(|| TxError::ProposalRejected { excluded: Vec::new() })?;

    let payload = wire::TransactionPayload {
        proposal_bytes: proposal.proposal_bytes.clone(),
        response_payload: first.payload.clone(),
        endorsements: endorsements.iter().map(EndorsementResponse::to_endorsement).collect(),
    }
    .encode_to_vec();

    let signature = identity.sign(&payload)?;
    Ok(wire::Envelope { payload, signature })
}
