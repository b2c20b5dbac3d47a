//! Transaction client: propose, collect, submit, observe.
//!
//! # Responsibilities
//! - Build and sign proposals with the active identity
//! - Collect endorsements from peers in parallel
//! - Submit endorsed envelopes to the ordering service with failover
//! - Return a handle that observes the commit event
//! - Run read-only queries against a peer subset

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use tokio::time::timeout;

use crate::identity::Identity;
use crate::network::{NetworkTopology, PeerEndpoint};
use crate::observability::metrics;
use crate::transaction::collect;
use crate::transaction::commit::{self, CommitHandle};
use crate::transaction::proposal::{build_envelope, Proposal, SignedProposal};
use crate::transaction::transport::Transport;
use crate::transaction::types::{
    CollectPolicy, EndorsementResponse, OrderingAck, PeerExclusion, SubmittedTransaction, TxError,
    TxResult, STATUS_OK,
};
use crate::transaction::wire;

/// Default per-peer proposal timeout.
pub const DEFAULT_PROPOSAL_TIMEOUT: Duration = Duration::from_millis(1000);

/// Default wait for an ordering acknowledgment.
pub const DEFAULT_SUBMIT_TIMEOUT: Duration = Duration::from_secs(3);

/// Default wait for a commit event.
pub const DEFAULT_COMMIT_TIMEOUT: Duration = Duration::from_secs(30);

/// Tunables for a [`TransactionClient`].
#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub channel_id: String,
    pub chaincode: String,
    pub proposal_timeout: Duration,
    pub submit_timeout: Duration,
    pub commit_timeout: Duration,
    pub collect_policy: CollectPolicy,
}

impl ClientSettings {
    pub fn new(channel_id: impl Into<String>, chaincode: impl Into<String>) -> Self {
        Self {
            channel_id: channel_id.into(),
            chaincode: chaincode.into(),
            proposal_timeout: DEFAULT_PROPOSAL_TIMEOUT,
            submit_timeout: DEFAULT_SUBMIT_TIMEOUT,
            commit_timeout: DEFAULT_COMMIT_TIMEOUT,
            collect_policy: CollectPolicy::WaitForAll,
        }
    }
}

/// Submits transactions and queries on one channel.
///
/// Identity and chaincode can be swapped while calls are in flight; each call
/// works on the snapshot it loaded at its start.
pub struct TransactionClient {
    identity: ArcSwap<Identity>,
    chaincode: ArcSwap<String>,
    topology: Arc<NetworkTopology>,
    channel_id: String,
    proposal_timeout: Duration,
    submit_timeout: Duration,
    commit_timeout: Duration,
    collect_policy: CollectPolicy,
    transport: Transport,
}

impl TransactionClient {
    pub fn new(
        identity: Identity,
        topology: Arc<NetworkTopology>,
        settings: ClientSettings,
        transport: Transport,
    ) -> TxResult<Self> {
        if settings.channel_id.is_empty() {
            return Err(TxError::InvalidArgument("channel id is empty".to_string()));
        }
        if settings.chaincode.is_empty() {
            return Err(TxError::InvalidArgument("chaincode name is empty".to_string()));
        }
        if settings.proposal_timeout.is_zero()
            || settings.submit_timeout.is_zero()
            || settings.commit_timeout.is_zero()
        {
            return Err(TxError::InvalidArgument("timeouts must be positive".to_string()));
        }

        tracing::info!(
            channel = %settings.channel_id,
            chaincode = %settings.chaincode,
            identity = %identity.display_name(),
            org = %identity.org_id(),
            peers = topology.all_peers().len(),
            "Transaction client initialized"
        );

        Ok(Self {
            identity: ArcSwap::from_pointee(identity),
            chaincode: ArcSwap::from_pointee(settings.chaincode),
            topology,
            channel_id: settings.channel_id,
            proposal_timeout: settings.proposal_timeout,
            submit_timeout: settings.submit_timeout,
            commit_timeout: settings.commit_timeout,
            collect_policy: settings.collect_policy,
            transport,
        })
    }

    /// Snapshot of the active identity.
    pub fn identity(&self) -> Arc<Identity> {
        self.identity.load_full()
    }

    /// Replace the identity used by subsequent calls.
    pub fn set_identity(&self, identity: Identity) {
        tracing::info!(identity = %identity.display_name(), org = %identity.org_id(), "Identity switched");
        self.identity.store(Arc::new(identity));
    }

    pub fn chaincode(&self) -> Arc<String> {
        self.chaincode.load_full()
    }

    /// Target a different chaincode for subsequent calls.
    pub fn set_chaincode(&self, name: &str) -> TxResult<()> {
        if name.is_empty() {
            return Err(TxError::InvalidArgument("chaincode name is empty".to_string()));
        }
        self.chaincode.store(Arc::new(name.to_string()));
        Ok(())
    }

    pub fn channel_id(&self) -> &str {
        &self.channel_id
    }

    pub fn topology(&self) -> &NetworkTopology {
        &self.topology
    }

    /// Submit `function(args)` endorsed by every known peer.
    pub async fn send_transaction(&self, function: &str, args: &[Vec<u8>]) -> TxResult<CommitHandle> {
        self.send_transaction_to(None, function, args).await
    }

    /// Submit `function(args)` endorsed by `peers`, or every known peer.
    ///
    /// Succeeds once the ordering service accepted the envelope. Peers that
    /// timed out, failed or disagreed are listed in the handle's exclusions.
    pub async fn send_transaction_to(
        &self,
        peers: Option<&[PeerEndpoint]>,
        function: &str,
        args: &[Vec<u8>],
    ) -> TxResult<CommitHandle> {
        let identity = self.identity.load_full();
        let peers = match peers {
            Some(peers) => peers.to_vec(),
            None => self.topology.all_peers().to_vec(),
        };

        let signed = self.prepare(&identity, function, args)?;
        metrics::record_proposal("invoke");
        tracing::debug!(tx_id = %signed.tx_id, function = %function, peers = peers.len(), "Sending proposal");

        let outcomes = collect::dispatch(
            &self.transport.endorser,
            &peers,
            &signed,
            self.proposal_timeout,
            self.collect_policy,
        )
        .await;
        let (endorsements, mut excluded) = collect::partition(outcomes);
        let (endorsements, inconsistent) = collect::select_consistent(endorsements);
        excluded.extend(inconsistent);

        if endorsements.is_empty() {
            tracing::warn!(tx_id = %signed.tx_id, excluded = excluded.len(), "No endorsement gathered");
            metrics::record_submission("rejected");
            return Err(TxError::ProposalRejected { excluded });
        }

        let envelope = build_envelope(&signed, &endorsements, &identity)?;

        let endorsing_peers: Vec<PeerEndpoint> = peers
            .iter()
            .filter(|p| endorsements.iter().any(|e| e.peer == p.name))
            .cloned()
            .collect();
        let listener = commit::spawn_listener(
            self.transport.commits.clone(),
            endorsing_peers,
            signed.tx_id.clone(),
        );

        let ordering_ack = match self.submit(&envelope).await {
            Ok(ack) => ack,
            Err(e) => {
                drop(listener);
                metrics::record_submission("failed");
                return Err(e);
            }
        };

        tracing::info!(
            tx_id = %signed.tx_id,
            endorsements = endorsements.len(),
            excluded = excluded.len(),
            orderer = %ordering_ack.orderer,
            "Transaction submitted"
        );
        metrics::record_submission("accepted");

        let transaction = SubmittedTransaction {
            tx_id: signed.tx_id,
            endorsements,
            excluded,
            ordering_ack,
        };
        Ok(CommitHandle::new(transaction, listener, self.commit_timeout))
    }

    /// Evaluate `function(args)` without submitting anything.
    ///
    /// Without a subset the peers of the identity's organization are asked.
    /// Every answer is returned verbatim, error statuses included; peers that
    /// timed out or failed are dropped.
    pub async fn query_peers(
        &self,
        peers: Option<&[PeerEndpoint]>,
        function: &str,
        args: &[Vec<u8>],
    ) -> TxResult<Vec<EndorsementResponse>> {
        let identity = self.identity.load_full();
        let peers = match peers {
            Some([]) => {
                return Err(TxError::InvalidArgument("peer subset is empty".to_string()));
            }
            Some(peers) => peers.to_vec(),
            None => self.topology.peers_of(identity.org_id()).to_vec(),
        };

        let signed = self.prepare(&identity, function, args)?;
        if peers.is_empty() {
            return Err(TxError::InvalidArgument(format!(
                "no peers known for organization '{}'",
                identity.org_id()
            )));
        }
        metrics::record_proposal("query");
        tracing::debug!(tx_id = %signed.tx_id, function = %function, peers = peers.len(), "Sending query");

        let outcomes = collect::dispatch(
            &self.transport.endorser,
            &peers,
            &signed,
            self.proposal_timeout,
            CollectPolicy::WaitForAll,
        )
        .await;

        let mut responses = Vec::with_capacity(outcomes.len());
        let mut excluded = Vec::new();
        for outcome in outcomes {
            match outcome.result {
                Ok(response) => responses.push(response),
                Err(reason) => excluded.push(PeerExclusion {
                    peer: outcome.peer,
                    reason,
                }),
            }
        }

        if responses.is_empty() {
            tracing::warn!(tx_id = %signed.tx_id, excluded = excluded.len(), "Query reached no peer");
            return Err(TxError::ProposalFailed { excluded });
        }
        Ok(responses)
    }

    fn prepare(&self, identity: &Identity, function: &str, args: &[Vec<u8>]) -> TxResult<SignedProposal> {
        let chaincode = self.chaincode.load();
        let proposal = Proposal::new(
            &self.channel_id,
            chaincode.as_str(),
            function,
            args,
            identity,
            self.proposal_timeout,
        )?;
        proposal.sign(identity)
    }

    /// Try each orderer in profile order until one accepts.
    async fn submit(&self, envelope: &wire::Envelope) -> TxResult<OrderingAck> {
        let orderers = self.topology.orderers();
        if orderers.is_empty() {
            return Err(TxError::SubmissionFailed("no orderer configured".to_string()));
        }

        let mut last_error = String::new();
        for (i, orderer) in orderers.iter().enumerate() {
            let fut = self.transport.orderer.broadcast(orderer, envelope);
            match timeout(self.submit_timeout, fut).await {
                Ok(Ok(ack)) if ack.status == STATUS_OK => return Ok(ack),
                Ok(Ok(ack)) => {
                    tracing::warn!(orderer_idx = i, orderer = %orderer.name, status = ack.status, info = %ack.info, "Envelope refused, trying next orderer");
                    last_error = format!("{} refused with status {}: {}", orderer.name, ack.status, ack.info);
                }
                Ok(Err(e)) => {
                    tracing::warn!(orderer_idx = i, orderer = %orderer.name, error = %e, "Broadcast error, trying next orderer");
                    last_error = format!("{}: {}", orderer.name, e);
                }
                Err(_) => {
                    tracing::warn!(orderer_idx = i, orderer = %orderer.name, "Broadcast timeout, trying next orderer");
                    last_error = format!("{}: no acknowledgment within {:?}", orderer.name, self.submit_timeout);
                }
            }
        }

        Err(TxError::SubmissionFailed(last_error))
    }
}

impl std::fmt::Debug for TransactionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionClient")
            .field("channel_id", &self.channel_id)
            .field("chaincode", &self.chaincode.load().as_str())
            .field("identity", &self.identity.load().display_name())
            .field("proposal_timeout", &self.proposal_timeout)
            .field("submit_timeout", &self.submit_timeout)
            .field("commit_timeout", &self.commit_timeout)
            .field("collect_policy", &self.collect_policy)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::load_x509;
    use crate::network::{NetworkProfile, OrdererEndpoint, ProfileFormat};
    use crate::transaction::transport::{CommitListener, Endorser, Orderer};
    use crate::transaction::types::{CommitEvent, TransportResult};
    use futures_util::future::BoxFuture;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Echo {
        endorse_calls: AtomicUsize,
        broadcasts: AtomicUsize,
    }

    impl Endorser for Echo {
        fn process_proposal(&self, peer: &PeerEndpoint, _: &SignedProposal) -> BoxFuture<'static, TransportResult<EndorsementResponse>> {
            self.endorse_calls.fetch_add(1, Ordering::SeqCst);
            let peer = peer.name.clone();
            Box::pin(async move {
                Ok(EndorsementResponse {
                    peer,
                    status: 200,
                    message: String::new(),
                    payload: b"ok".to_vec(),
                    endorser: Vec::new(),
                    signature: Vec::new(),
                })
            })
        }
    }

    impl Orderer for Echo {
        fn broadcast(&self, orderer: &OrdererEndpoint, _: &wire::Envelope) -> BoxFuture<'static, TransportResult<OrderingAck>> {
            self.broadcasts.fetch_add(1, Ordering::SeqCst);
            let orderer = orderer.name.clone();
            Box::pin(async move { Ok(OrderingAck { orderer, status: 200, info: String::new() }) })
        }
    }

    impl CommitListener for Echo {
        fn wait_for_commit(&self, peer: &PeerEndpoint, tx_id: &str) -> BoxFuture<'static, TransportResult<CommitEvent>> {
            let peer = peer.name.clone();
            let tx_id = tx_id.to_string();
            Box::pin(async move { Ok(CommitEvent { tx_id, block_number: 1, validation_code: 0, peer }) })
        }
    }

    fn topology() -> Arc<NetworkTopology> {
        let profile = NetworkProfile::parse(
            r#"
[[organizations]]
id = "Org1MSP"
peers = ["peer0"]
orderers = ["orderer0"]

[[organizations]]
id = "Org2MSP"
peers = ["peer1"]

[[peers]]
name = "peer0"
url = "localhost:7051"

[[peers]]
name = "peer1"
url = "localhost:8051"

[[orderers]]
name = "orderer0"
url = "localhost:7050"
"#,
            ProfileFormat::Toml,
        )
        .unwrap();
        Arc::new(NetworkTopology::from_profile(&profile, Path::new(".")).unwrap())
    }

    fn identity(org: &str) -> Identity {
        let certified = rcgen::generate_simple_self_signed(vec!["user1".to_string()]).unwrap();
        load_x509(&certified.key_pair.serialize_pem(), &certified.cert.pem(), org, None).unwrap()
    }

    fn client() -> (TransactionClient, Arc<Echo>) {
        let echo = Arc::new(Echo::default());
        let transport = Transport {
            endorser: echo.clone(),
            orderer: echo.clone(),
            commits: echo.clone(),
        };
        let client = TransactionClient::new(
            identity("Org1MSP"),
            topology(),
            ClientSettings::new("mychannel", "basic"),
            transport,
        )
        .unwrap();
        (client, echo)
    }

    #[test]
    fn test_settings_validated() {
        let echo = Arc::new(Echo::default());
        let transport = Transport {
            endorser: echo.clone(),
            orderer: echo.clone(),
            commits: echo,
        };
        let result = TransactionClient::new(
            identity("Org1MSP"),
            topology(),
            ClientSettings::new("", "basic"),
            transport,
        );
        assert!(matches!(result, Err(TxError::InvalidArgument(_))));
    }

    #[test]
    fn test_zero_submit_timeout_rejected() {
        let echo = Arc::new(Echo::default());
        let mut settings = ClientSettings::new("mychannel", "basic");
        settings.submit_timeout = Duration::ZERO;
        let transport = Transport {
            endorser: echo.clone(),
            orderer: echo.clone(),
            commits: echo,
        };
        let result = TransactionClient::new(identity("Org1MSP"), topology(), settings, transport);
        assert!(matches!(result, Err(TxError::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn test_send_transaction_reaches_all_peers() {
        let (client, echo) = client();
        let handle = client.send_transaction("Store", &[b"k".to_vec()]).await.unwrap();
        assert_eq!(echo.endorse_calls.load(Ordering::SeqCst), 2);
        assert_eq!(echo.broadcasts.load(Ordering::SeqCst), 1);
        assert_eq!(handle.transaction().endorsements.len(), 2);
        let event = handle.wait().await.unwrap();
        assert!(event.is_valid());
    }

    #[tokio::test]
    async fn test_empty_function_makes_no_calls() {
        let (client, echo) = client();
        let result = client.send_transaction("", &[]).await;
        assert!(matches!(result, Err(TxError::InvalidArgument(_))));
        let result = client.query_peers(None, "", &[]).await;
        assert!(matches!(result, Err(TxError::InvalidArgument(_))));
        assert_eq!(echo.endorse_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_query_defaults_to_own_org() {
        let (client, echo) = client();
        let responses = client.query_peers(None, "Get", &[]).await.unwrap();
        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0].peer, "peer0");
        assert_eq!(echo.endorse_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_query_empty_subset_rejected() {
        let (client, echo) = client();
        let result = client.query_peers(Some(&[]), "Get", &[]).await;
        assert!(matches!(result, Err(TxError::InvalidArgument(_))));
        assert_eq!(echo.endorse_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_set_identity_switches_org() {
        let (client, _) = client();
        client.set_identity(identity("Org2MSP"));
        assert_eq!(client.identity().org_id(), "Org2MSP");
        let responses = client.query_peers(None, "Get", &[]).await.unwrap();
        assert_eq!(responses[0].peer, "peer1");
    }

    #[test]
    fn test_set_chaincode() {
        let (client, _) = client();
        client.set_chaincode("other").unwrap();
        assert_eq!(client.chaincode().as_str(), "other");
        assert!(matches!(client.set_chaincode(""), Err(TxError::InvalidArgument(_))));
    }
}
