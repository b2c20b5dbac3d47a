//! Protobuf messages exchanged with peers and orderers.

#[derive(Clone, PartialEq, prost::Message)]
pub struct ProposalHeader {
    #[prost(string, tag = "1")]
    pub channel_id: String,
    #[prost(string, tag = "2")]
    pub tx_id: String,
    #[prost(string, tag = "3")]
    pub chaincode: String,
    #[prost(uint64, tag = "4")]
    pub timestamp_millis: u64,
    /// Serialized creator identity.
    #[prost(bytes = "vec", tag = "5")]
    pub creator: Vec<u8>,
    #[prost(bytes = "vec", tag = "6")]
    pub nonce: Vec<u8>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ChaincodeInput {
    #[prost(string, tag = "1")]
    pub function: String,
    #[prost(bytes = "vec", repeated, tag = "2")]
    pub args: Vec<Vec<u8>>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Proposal {
    #[prost(message, optional, tag = "1")]
    pub header: Option<ProposalHeader>,
    #[prost(message, optional, tag = "2")]
    pub input: Option<ChaincodeInput>,
    #[prost(uint64, tag = "3")]
    pub timeout_ms: u64,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct SignedProposal {
    #[prost(bytes = "vec", tag = "1")]
    pub proposal_bytes: Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    pub signature: Vec<u8>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Endorsement {
    #[prost(bytes = "vec", tag = "1")]
    pub endorser: Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    pub signature: Vec<u8>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ProposalResponse {
    #[prost(int32, tag = "1")]
    pub status: i32,
    #[prost(string, tag = "2")]
    pub message: String,
    #[prost(bytes = "vec", tag = "3")]
    pub payload: Vec<u8>,
    #[prost(message, optional, tag = "4")]
    pub endorsement: Option<Endorsement>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct TransactionPayload {
    #[prost(bytes = "vec", tag = "1")]
    pub proposal_bytes: Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    pub response_payload: Vec<u8>,
    #[prost(message, repeated, tag = "3")]
    pub endorsements: Vec<Endorsement>,
}

/// Signed transaction as broadcast to the ordering service.
#[derive(Clone, PartialEq, prost::Message)]
pub struct Envelope {
    #[prost(bytes = "vec", tag = "1")]
    pub payload: Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    pub signature: Vec<u8>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct BroadcastResponse {
    #[prost(int32, tag = "1")]
    pub status: i32,
    #[prost(string, tag = "2")]
    pub info: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct CommitStatus {
    #[prost(string, tag = "1")]
    pub tx_id: String,
    #[prost(uint64, tag = "2")]
    pub block_number: u64,
    #[prost(int32, tag = "3")]
    pub validation_code: i32,
}
