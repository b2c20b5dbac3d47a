//! HTTP transport carrying protobuf bodies.
//!
//! # Endpoints
//! - `POST {peer}/v1/proposals` with a `SignedProposal`, answers `ProposalResponse`
//! - `POST {orderer}/v1/broadcast` with an `Envelope`, answers `BroadcastResponse`
//! - `GET {peer}/v1/transactions/{tx_id}/commit` answers `CommitStatus`, or 404
//!   while the transaction is not committed yet

use std::collections::HashSet;
use std::time::Duration;

use futures_util::future::BoxFuture;
use prost::Message;
use reqwest::StatusCode;
use tokio::time::interval;
use url::Url;

use crate::network::{Endpoint, NetworkTopology, OrdererEndpoint, PeerEndpoint};
use crate::transaction::proposal::SignedProposal;
use crate::transaction::transport::{CommitListener, Endorser, Orderer};
use crate::transaction::types::{
    CommitEvent, EndorsementResponse, OrderingAck, TransportError, TransportResult,
};
use crate::transaction::wire;

const PROTOBUF: &str = "application/x-protobuf";

/// Interval between commit status polls.
pub const DEFAULT_COMMIT_POLL: Duration = Duration::from_millis(500);

/// Speaks to peers and orderers over HTTP.
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    commit_poll: Duration,
}

impl HttpTransport {
    /// Build a transport trusting every TLS root named in `topology`.
    pub fn new(topology: &NetworkTopology) -> TransportResult<Self> {
        // Peers and orderers are dialled directly.
        let mut builder = reqwest::Client::builder().no_proxy();
        let mut seen = HashSet::new();

        let roots = topology
            .all_peers()
            .iter()
            .filter_map(|p| p.tls_root_cert())
            .chain(topology.orderers().iter().filter_map(|o| o.tls_root_cert()));

        for pem in roots {
            if !seen.insert(pem) {
                continue;
            }
            let certs = reqwest::Certificate::from_pem_bundle(pem.as_bytes())
                .map_err(|e| TransportError::Endpoint(format!("invalid TLS root: {}", e)))?;
            for cert in certs {
                builder = builder.add_root_certificate(cert);
            }
        }

        let client = builder
            .build()
            .map_err(|e| TransportError::Request(e.to_string()))?;

        tracing::debug!(tls_roots = seen.len(), "HTTP transport ready");

        Ok(Self {
            client,
            commit_poll: DEFAULT_COMMIT_POLL,
        })
    }

    /// Override the commit poll interval.
    pub fn with_commit_poll(mut self, poll: Duration) -> Self {
        self.commit_poll = poll;
        self
    }
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("commit_poll", &self.commit_poll)
            .finish_non_exhaustive()
    }
}

fn endpoint_url<E: Endpoint>(endpoint: &E, path: &str) -> TransportResult<Url> {
    endpoint
        .base_url()?
        .join(path)
        .map_err(|e| TransportError::Endpoint(format!("{}: {}", endpoint.name(), e)))
}

async fn post(client: &reqwest::Client, url: Url, body: Vec<u8>) -> TransportResult<Vec<u8>> {
    let response = client
        .post(url)
        .header(reqwest::header::CONTENT_TYPE, PROTOBUF)
        .body(body)
        .send()
        .await
        .map_err(|e| TransportError::Request(e.to_string()))?;

    read_body(response).await
}

async fn read_body(response: reqwest::Response) -> TransportResult<Vec<u8>> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(TransportError::Status {
            status: status.as_u16(),
            body,
        });
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| TransportError::Request(e.to_string()))?;
    Ok(bytes.to_vec())
}

fn decode<M: Message + Default>(what: &str, bytes: &[u8]) -> TransportResult<M> {
    M::decode(bytes).map_err(|e| TransportError::Decode(format!("{}: {}", what, e)))
}

impl Endorser for HttpTransport {
    fn process_proposal(
        &self,
        peer: &PeerEndpoint,
        proposal: &SignedProposal,
    ) -> BoxFuture<'static, TransportResult<EndorsementResponse>> {
        let client = self.client.clone();
        let url = endpoint_url(peer, "v1/proposals");
        let body = proposal.to_wire().encode_to_vec();
        let name = peer.name.clone();

        Box::pin(async move {
            let bytes = post(&client, url?, body).await?;
            let response: wire::ProposalResponse = decode("proposal response", &bytes)?;
            Ok(EndorsementResponse::from_wire(&name, response))
        })
    }
}

impl Orderer for HttpTransport {
    fn broadcast(
        &self,
        orderer: &OrdererEndpoint,
        envelope: &wire::Envelope,
    ) -> BoxFuture<'static, TransportResult<OrderingAck>> {
        let client = self.client.clone();
        let url = endpoint_url(orderer, "v1/broadcast");
        let body = envelope.encode_to_vec();
        let name = orderer.name.clone();

        Box::pin(async move {
            let bytes = post(&client, url?, body).await?;
            let response: wire::BroadcastResponse = decode("broadcast response", &bytes)?;
            Ok(OrderingAck {
                orderer: name,
                status: response.status,
                info: response.info,
            })
        })
    }
}

impl CommitListener for HttpTransport {
    fn wait_for_commit(
        &self,
        peer: &PeerEndpoint,
        tx_id: &str,
    ) -> BoxFuture<'static, TransportResult<CommitEvent>> {
        let client = self.client.clone();
        let url = endpoint_url(peer, &format!("v1/transactions/{}/commit", tx_id));
        let name = peer.name.clone();
        let expected = tx_id.to_string();
        let poll = self.commit_poll;

        Box::pin(async move {
            let url = url?;
            let mut ticker = interval(poll);

            loop {
                ticker.tick().await;

                let response = client
                    .get(url.clone())
                    .header(reqwest::header::ACCEPT, PROTOBUF)
                    .send()
                    .await
                    .map_err(|e| TransportError::Request(e.to_string()))?;

                if response.status() == StatusCode::NOT_FOUND {
                    tracing::trace!(peer = %name, "Transaction not committed yet");
                    continue;
                }

                let bytes = read_body(response).await?;
                let status: wire::CommitStatus = decode("commit status", &bytes)?;
                if status.tx_id != expected {
                    return Err(TransportError::Decode(format!(
                        "commit status for '{}' while waiting for '{}'",
                        status.tx_id, expected
                    )));
                }
                return Ok(CommitEvent {
                    tx_id: status.tx_id,
                    block_number: status.block_number,
                    validation_code: status.validation_code,
                    peer: name,
                });
            }
        })
    }
}
