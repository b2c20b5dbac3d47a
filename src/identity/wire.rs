//! Protobuf schema for credential artifacts and serialized creators.
//!
//! Field numbers follow the idemix and MSP message definitions used by the
//! ledger network, so blobs produced by its tooling decode unchanged.

/// Point on G1.
#[derive(Clone, PartialEq, prost::Message)]
pub struct Ecp {
    #[prost(bytes = "vec", tag = "1")]
    pub x: Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    pub y: Vec<u8>,
}

/// Point on G2.
#[derive(Clone, PartialEq, prost::Message)]
pub struct Ecp2 {
    #[prost(bytes = "vec", tag = "1")]
    pub xa: Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    pub xb: Vec<u8>,
    #[prost(bytes = "vec", tag = "3")]
    pub ya: Vec<u8>,
    #[prost(bytes = "vec", tag = "4")]
    pub yb: Vec<u8>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct IssuerPublicKey {
    #[prost(string, repeated, tag = "1")]
    pub attribute_names: Vec<String>,
    #[prost(message, optional, tag = "2")]
    pub h_sk: Option<Ecp>,
    #[prost(message, optional, tag = "3")]
    pub h_rand: Option<Ecp>,
    #[prost(message, repeated, tag = "4")]
    pub h_attrs: Vec<Ecp>,
    #[prost(message, optional, tag = "5")]
    pub w: Option<Ecp2>,
    #[prost(message, optional, tag = "6")]
    pub bar_g1: Option<Ecp>,
    #[prost(message, optional, tag = "7")]
    pub bar_g2: Option<Ecp>,
    #[prost(bytes = "vec", tag = "8")]
    pub proof_c: Vec<u8>,
    #[prost(bytes = "vec", tag = "9")]
    pub proof_s: Vec<u8>,
    #[prost(bytes = "vec", tag = "10")]
    pub hash: Vec<u8>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Credential {
    #[prost(message, optional, tag = "1")]
    pub a: Option<Ecp>,
    #[prost(message, optional, tag = "2")]
    pub b: Option<Ecp>,
    #[prost(bytes = "vec", tag = "3")]
    pub e: Vec<u8>,
    #[prost(bytes = "vec", tag = "4")]
    pub s: Vec<u8>,
    #[prost(bytes = "vec", repeated, tag = "5")]
    pub attrs: Vec<Vec<u8>>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct CredentialRevocationInformation {
    #[prost(int64, tag = "1")]
    pub epoch: i64,
    #[prost(message, optional, tag = "2")]
    pub epoch_pk: Option<Ecp2>,
    #[prost(bytes = "vec", tag = "3")]
    pub epoch_pk_sig: Vec<u8>,
    #[prost(int32, tag = "4")]
    pub revocation_alg: i32,
    #[prost(bytes = "vec", tag = "5")]
    pub revocation_data: Vec<u8>,
}

/// Creator as carried in proposal headers.
#[derive(Clone, PartialEq, prost::Message)]
pub struct SerializedIdentity {
    #[prost(string, tag = "1")]
    pub mspid: String,
    #[prost(bytes = "vec", tag = "2")]
    pub id_bytes: Vec<u8>,
}

/// `id_bytes` payload for anonymous-credential creators. No stable
/// identifier is included; the engine-produced proof carries the pseudonym.
#[derive(Clone, PartialEq, prost::Message)]
pub struct SerializedAnonymousIdentity {
    #[prost(string, tag = "1")]
    pub ou: String,
    #[prost(int32, tag = "2")]
    pub role: i32,
    #[prost(bytes = "vec", tag = "3")]
    pub proof: Vec<u8>,
}
