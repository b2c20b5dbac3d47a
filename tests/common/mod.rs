//! Shared fixtures for integration tests: scripted transports, a mock HTTP
//! node, and credential artifacts.
#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::{Path as UrlPath, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use futures_util::future::BoxFuture;
use p384::pkcs8::{EncodePublicKey, LineEnding};
use prost::Message;
use sha2::{Digest, Sha256};

use ledger_client::identity::anonymous::{AnonymousCredential, IssuerPublicKey, RevocationPublicKey};
use ledger_client::identity::{self, load_x509, CredentialEngine, Identity, IdentityError, IdentityResult};
use ledger_client::network::{NetworkProfile, NetworkTopology, OrdererEndpoint, PeerEndpoint, ProfileFormat};
use ledger_client::transaction::{
    wire, CommitEvent, CommitListener, Endorser, EndorsementResponse, Orderer, OrderingAck,
    SignedProposal, Transport, TransportError, TransportResult,
};

// ---------------------------------------------------------------------------
// Scripted in-process transport
// ---------------------------------------------------------------------------

/// How a peer answers a proposal.
#[derive(Debug, Clone)]
pub enum PeerScript {
    Endorse { payload: Vec<u8>, delay: Duration },
    Status(i32),
    Fail,
    Hang,
}

impl PeerScript {
    pub fn ok() -> Self {
        PeerScript::Endorse {
            payload: b"ok".to_vec(),
            delay: Duration::ZERO,
        }
    }

    pub fn payload(payload: &[u8]) -> Self {
        PeerScript::Endorse {
            payload: payload.to_vec(),
            delay: Duration::ZERO,
        }
    }

    pub fn slow(delay: Duration) -> Self {
        PeerScript::Endorse {
            payload: b"ok".to_vec(),
            delay,
        }
    }
}

/// How an orderer answers a broadcast.
#[derive(Debug, Clone)]
pub enum OrdererScript {
    Accept,
    Refuse(i32),
    Fail,
    Hang,
}

/// How peers report commits.
#[derive(Debug, Clone)]
pub enum CommitScript {
    After { delay: Duration, validation_code: i32 },
    Never,
    /// Keep polling at this interval without ever seeing the commit.
    Poll(Duration),
}

/// Transport whose behaviour is scripted per endpoint name. Unscripted peers
/// endorse with payload `ok`, unscripted orderers accept.
pub struct ScriptedTransport {
    peers: Mutex<HashMap<String, PeerScript>>,
    orderers: Mutex<HashMap<String, OrdererScript>>,
    commit: Mutex<CommitScript>,
    pub endorse_calls: AtomicUsize,
    pub broadcasts: Mutex<Vec<String>>,
    pub proposals: Mutex<Vec<SignedProposal>>,
    pub commit_polls: Arc<AtomicUsize>,
}

impl Default for ScriptedTransport {
    fn default() -> Self {
        Self {
            peers: Mutex::new(HashMap::new()),
            orderers: Mutex::new(HashMap::new()),
            commit: Mutex::new(CommitScript::After {
                delay: Duration::from_millis(5),
                validation_code: 0,
            }),
            endorse_calls: AtomicUsize::new(0),
            broadcasts: Mutex::new(Vec::new()),
            proposals: Mutex::new(Vec::new()),
            commit_polls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn script_peer(&self, name: &str, script: PeerScript) {
        self.peers.lock().unwrap().insert(name.to_string(), script);
    }

    pub fn script_orderer(&self, name: &str, script: OrdererScript) {
        self.orderers.lock().unwrap().insert(name.to_string(), script);
    }

    pub fn script_commit(&self, script: CommitScript) {
        *self.commit.lock().unwrap() = script;
    }

    pub fn endorse_calls(&self) -> usize {
        self.endorse_calls.load(Ordering::SeqCst)
    }

    pub fn commit_polls(&self) -> usize {
        self.commit_polls.load(Ordering::SeqCst)
    }

    pub fn broadcast_log(&self) -> Vec<String> {
        self.broadcasts.lock().unwrap().clone()
    }

    pub fn tx_ids(&self) -> Vec<String> {
        self.proposals
            .lock()
            .unwrap()
            .iter()
            .map(|p| p.tx_id.clone())
            .collect()
    }

    pub fn transport(self: &Arc<Self>) -> Transport {
        Transport {
            endorser: self.clone(),
            orderer: self.clone(),
            commits: self.clone(),
        }
    }
}

impl Endorser for ScriptedTransport {
    fn process_proposal(
        &self,
        peer: &PeerEndpoint,
        proposal: &SignedProposal,
    ) -> BoxFuture<'static, TransportResult<EndorsementResponse>> {
        self.endorse_calls.fetch_add(1, Ordering::SeqCst);
        self.proposals.lock().unwrap().push(proposal.clone());
        let script = self
            .peers
            .lock()
            .unwrap()
            .get(&peer.name)
            .cloned()
            .unwrap_or_else(PeerScript::ok);
        let name = peer.name.clone();

        Box::pin(async move {
            match script {
                PeerScript::Endorse { payload, delay } => {
                    tokio::time::sleep(delay).await;
                    Ok(response(&name, 200, "", &payload))
                }
                PeerScript::Status(status) => Ok(response(&name, status, "chaincode error", b"")),
                PeerScript::Fail => Err(TransportError::Request("connection refused".into())),
                PeerScript::Hang => std::future::pending().await,
            }
        })
    }
}

impl Orderer for ScriptedTransport {
    fn broadcast(
        &self,
        orderer: &OrdererEndpoint,
        _envelope: &wire::Envelope,
    ) -> BoxFuture<'static, TransportResult<OrderingAck>> {
        self.broadcasts.lock().unwrap().push(orderer.name.clone());
        let script = self
            .orderers
            .lock()
            .unwrap()
            .get(&orderer.name)
            .cloned()
            .unwrap_or(OrdererScript::Accept);
        let name = orderer.name.clone();

        Box::pin(async move {
            match script {
                OrdererScript::Accept => Ok(OrderingAck {
                    orderer: name,
                    status: 200,
                    info: String::new(),
                }),
                OrdererScript::Refuse(status) => Ok(OrderingAck {
                    orderer: name,
                    status,
                    info: "refused".into(),
                }),
                OrdererScript::Fail => Err(TransportError::Request("connection reset".into())),
                OrdererScript::Hang => std::future::pending().await,
            }
        })
    }
}

impl CommitListener for ScriptedTransport {
    fn wait_for_commit(
        &self,
        peer: &PeerEndpoint,
        tx_id: &str,
    ) -> BoxFuture<'static, TransportResult<CommitEvent>> {
        let script = self.commit.lock().unwrap().clone();
        let polls = self.commit_polls.clone();
        let peer = peer.name.clone();
        let tx_id = tx_id.to_string();

        Box::pin(async move {
            match script {
                CommitScript::After {
                    delay,
                    validation_code,
                } => {
                    tokio::time::sleep(delay).await;
                    Ok(CommitEvent {
                        tx_id,
                        block_number: 1,
                        validation_code,
                        peer,
                    })
                }
                CommitScript::Never => std::future::pending().await,
                CommitScript::Poll(every) => loop {
                    tokio::time::sleep(every).await;
                    polls.fetch_add(1, Ordering::SeqCst);
                },
            }
        })
    }
}

fn response(peer: &str, status: i32, message: &str, payload: &[u8]) -> EndorsementResponse {
    EndorsementResponse {
        peer: peer.to_string(),
        status,
        message: message.to_string(),
        payload: payload.to_vec(),
        endorser: format!("{}-cert", peer).into_bytes(),
        signature: format!("{}-sig", peer).into_bytes(),
    }
}

// ---------------------------------------------------------------------------
// Topology and identity
// ---------------------------------------------------------------------------

/// Profile text for `orgs` (id, peer names); orderers hang off the first org.
/// Peers get `http://127.0.0.1:<port>` addresses from `addresses` when given.
pub fn profile_toml(orgs: &[(&str, &[&str])], orderers: &[&str], addresses: &HashMap<String, SocketAddr>) -> String {
    let mut out = String::new();
    for (i, (id, peers)) in orgs.iter().enumerate() {
        out.push_str("[[organizations]]\n");
        out.push_str(&format!("id = \"{}\"\n", id));
        out.push_str(&format!("peers = {:?}\n", peers));
        if i == 0 {
            out.push_str(&format!("orderers = {:?}\n", orderers));
        }
        out.push('\n');
    }

    let url = |name: &str, default_port: usize| match addresses.get(name) {
        Some(addr) => format!("http://{}", addr),
        None => format!("localhost:{}", default_port),
    };

    for (i, name) in orgs.iter().flat_map(|(_, peers)| peers.iter()).enumerate() {
        out.push_str(&format!("[[peers]]\nname = \"{}\"\nurl = \"{}\"\n\n", name, url(name, 7051 + i)));
    }
    for (i, name) in orderers.iter().enumerate() {
        out.push_str(&format!("[[orderers]]\nname = \"{}\"\nurl = \"{}\"\n\n", name, url(name, 7050 - i)));
    }
    out
}

pub fn topology(orgs: &[(&str, &[&str])], orderers: &[&str]) -> Arc<NetworkTopology> {
    topology_at(orgs, orderers, &HashMap::new())
}

pub fn topology_at(
    orgs: &[(&str, &[&str])],
    orderers: &[&str],
    addresses: &HashMap<String, SocketAddr>,
) -> Arc<NetworkTopology> {
    let profile = NetworkProfile::parse(&profile_toml(orgs, orderers, addresses), ProfileFormat::Toml).unwrap();
    Arc::new(NetworkTopology::from_profile(&profile, Path::new(".")).unwrap())
}

/// (private key PEM, certificate PEM) for a fresh self-signed P-256 cert.
pub fn x509_material(common_name: &str) -> (String, String) {
    let certified = rcgen::generate_simple_self_signed(vec![common_name.to_string()]).unwrap();
    (certified.key_pair.serialize_pem(), certified.cert.pem())
}

pub fn x509_identity(org_id: &str) -> Identity {
    let (key, cert) = x509_material("user1");
    load_x509(&key, &cert, org_id, Some("user1")).unwrap()
}

/// Fresh directory under the OS temp dir.
pub fn temp_dir() -> PathBuf {
    let dir = std::env::temp_dir().join(format!("ledger-client-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

pub fn write(dir: &Path, name: &str, contents: impl AsRef<[u8]>) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

// ---------------------------------------------------------------------------
// Anonymous credential artifacts
// ---------------------------------------------------------------------------

/// Engine binding signatures to the issuer key hash; verification needs only
/// public material.
#[derive(Debug)]
pub struct DigestEngine;

impl DigestEngine {
    fn tag(issuer_key: &IssuerPublicKey, message: &[u8]) -> Vec<u8> {
        let mut hasher = Sha256::new();
        hasher.update(issuer_key.hash());
        hasher.update(message);
        hasher.finalize().to_vec()
    }
}

impl CredentialEngine for DigestEngine {
    fn sign(&self, credential: &AnonymousCredential, message: &[u8]) -> IdentityResult<Vec<u8>> {
        Ok(Self::tag(credential.issuer_key(), message))
    }

    fn verify(
        &self,
        issuer_key: &IssuerPublicKey,
        _revocation_key: &RevocationPublicKey,
        message: &[u8],
        signature: &[u8],
    ) -> IdentityResult<()> {
        if Self::tag(issuer_key, message) == signature {
            Ok(())
        } else {
            Err(IdentityError::Verification("tag mismatch".into()))
        }
    }

    fn identity_proof(&self, credential: &AnonymousCredential) -> IdentityResult<Vec<u8>> {
        Ok(credential.issuer_key().hash().to_vec())
    }
}

fn point() -> identity::wire::Ecp {
    identity::wire::Ecp {
        x: vec![1; 32],
        y: vec![2; 32],
    }
}

fn point2() -> identity::wire::Ecp2 {
    identity::wire::Ecp2 {
        xa: vec![3; 32],
        xb: vec![4; 32],
        ya: vec![5; 32],
        yb: vec![6; 32],
    }
}

/// Paths of the three anonymous credential artifacts.
pub struct AnonymousFiles {
    pub signer_config: PathBuf,
    pub issuer_public_key: PathBuf,
    pub revocation_public_key: PathBuf,
}

/// Write a structurally valid set of anonymous credential artifacts.
pub fn write_anonymous_artifacts(dir: &Path) -> AnonymousFiles {
    let ipk = identity::wire::IssuerPublicKey {
        attribute_names: vec!["OU".into(), "Role".into(), "EnrollmentID".into(), "RevocationHandle".into()],
        h_sk: Some(point()),
        h_rand: Some(point()),
        h_attrs: vec![point(); 4],
        w: Some(point2()),
        bar_g1: Some(point()),
        bar_g2: Some(point()),
        proof_c: vec![7; 32],
        proof_s: vec![8; 32],
        hash: vec![9; 32],
    };
    let cred = identity::wire::Credential {
        a: Some(point()),
        b: Some(point()),
        e: vec![10; 32],
        s: vec![11; 32],
        attrs: vec![vec![12; 32]; 4],
    };
    let cri = identity::wire::CredentialRevocationInformation {
        epoch: 1,
        epoch_pk: Some(point2()),
        epoch_pk_sig: vec![13; 64],
        revocation_alg: 0,
        revocation_data: Vec::new(),
    };
    let signer_config = serde_json::json!({
        "Sk": STANDARD.encode([42u8; 32]),
        "Cred": STANDARD.encode(cred.encode_to_vec()),
        "credential_revocation_information": STANDARD.encode(cri.encode_to_vec()),
        "organizational_unit_identifier": "org1.department1",
    });
    let rpk = p384::SecretKey::random(&mut rand::rngs::OsRng)
        .public_key()
        .to_public_key_pem(LineEnding::LF)
        .unwrap();

    AnonymousFiles {
        signer_config: write(dir, "SignerConfig", serde_json::to_vec(&signer_config).unwrap()),
        issuer_public_key: write(dir, "IssuerPublicKey", ipk.encode_to_vec()),
        revocation_public_key: write(dir, "RevocationPublicKey", rpk),
    }
}

// ---------------------------------------------------------------------------
// Mock HTTP node (peer + orderer)
// ---------------------------------------------------------------------------

/// Behaviour of a mock node.
#[derive(Debug, Clone)]
pub struct MockNodeConfig {
    /// Status inside the protobuf proposal response.
    pub endorse_status: i32,
    /// Answer proposals with HTTP 500 instead.
    pub http_error: bool,
    /// Commit polls answered with 404 before the status is reported.
    pub pending_polls: usize,
    /// Report this transaction id instead of the requested one.
    pub commit_tx_id: Option<String>,
}

impl Default for MockNodeConfig {
    fn default() -> Self {
        Self {
            endorse_status: 200,
            http_error: false,
            pending_polls: 1,
            commit_tx_id: None,
        }
    }
}

#[derive(Default)]
pub struct MockCounters {
    pub proposals: AtomicUsize,
    pub broadcasts: AtomicUsize,
    pub commit_polls: AtomicUsize,
    pub tx_ids: Mutex<Vec<String>>,
}

struct MockState {
    config: MockNodeConfig,
    counters: Arc<MockCounters>,
}

pub struct MockNode {
    pub addr: SocketAddr,
    pub counters: Arc<MockCounters>,
}

const PROTOBUF: &str = "application/x-protobuf";

fn protobuf(body: Vec<u8>) -> Response {
    (StatusCode::OK, [(header::CONTENT_TYPE, PROTOBUF)], body).into_response()
}

async fn handle_proposal(State(state): State<Arc<MockState>>, body: Bytes) -> Response {
    state.counters.proposals.fetch_add(1, Ordering::SeqCst);
    if state.config.http_error {
        return (StatusCode::INTERNAL_SERVER_ERROR, "peer unavailable").into_response();
    }

    let Ok(signed) = wire::SignedProposal::decode(body.as_ref()) else {
        return (StatusCode::BAD_REQUEST, "bad signed proposal").into_response();
    };
    let Ok(proposal) = wire::Proposal::decode(signed.proposal_bytes.as_slice()) else {
        return (StatusCode::BAD_REQUEST, "bad proposal").into_response();
    };
    let header = proposal.header.unwrap_or_default();
    state.counters.tx_ids.lock().unwrap().push(header.tx_id);

    let input = proposal.input.unwrap_or_default();
    let response = wire::ProposalResponse {
        status: state.config.endorse_status,
        message: if state.config.endorse_status >= 400 { "chaincode error".into() } else { String::new() },
        payload: format!("{}:{}", input.function, input.args.len()).into_bytes(),
        endorsement: Some(wire::Endorsement {
            endorser: b"mock-peer".to_vec(),
            signature: vec![1, 2, 3],
        }),
    };
    protobuf(response.encode_to_vec())
}

async fn handle_broadcast(State(state): State<Arc<MockState>>, body: Bytes) -> Response {
    state.counters.broadcasts.fetch_add(1, Ordering::SeqCst);
    if wire::Envelope::decode(body.as_ref()).is_err() {
        return (StatusCode::BAD_REQUEST, "bad envelope").into_response();
    }
    let response = wire::BroadcastResponse {
        status: 200,
        info: String::new(),
    };
    protobuf(response.encode_to_vec())
}

async fn handle_commit(State(state): State<Arc<MockState>>, UrlPath(tx_id): UrlPath<String>) -> Response {
    let polls = state.counters.commit_polls.fetch_add(1, Ordering::SeqCst);
    if polls < state.config.pending_polls {
        return StatusCode::NOT_FOUND.into_response();
    }
    let status = wire::CommitStatus {
        tx_id: state.config.commit_tx_id.clone().unwrap_or(tx_id),
        block_number: 5,
        validation_code: 0,
    };
    protobuf(status.encode_to_vec())
}

/// Serve a mock node on an ephemeral local port.
pub async fn start_mock_node(config: MockNodeConfig) -> MockNode {
    let counters = Arc::new(MockCounters::default());
    let state = Arc::new(MockState {
        config,
        counters: counters.clone(),
    });

    let app = Router::new()
        .route("/v1/proposals", post(handle_proposal))
        .route("/v1/broadcast", post(handle_broadcast))
        .route("/v1/transactions/{tx_id}/commit", get(handle_commit))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    MockNode { addr, counters }
}
