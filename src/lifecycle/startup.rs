//! Startup orchestration.
//!
//! # Responsibilities
//! - Initialize logging and metrics from configuration
//! - Load the identity, resolve the network topology, build the transport
//! - Assemble a ready `TransactionClient`
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal, no partially built client
//! - Phases run in order and each failure names its phase

use std::net::SocketAddr;
use std::sync::Arc;

use thiserror::Error;

use crate::config::{ClientConfig, ConfigError, IdentityConfig, IdentityKind, ObservabilityConfig};
use crate::identity::{
    load_anonymous_files, load_x509_files, Credential, CredentialEngine, Identity, IdentityError,
};
use crate::network::{NetworkTopology, TopologyError};
use crate::observability;
use crate::transaction::{
    ClientSettings, HttpTransport, TransactionClient, Transport, TransportError, TxError,
};

/// Display name for anonymous identities configured without one.
const ANONYMOUS_NAME: &str = "anonymous";

/// A startup phase failed.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("identity: {0}")]
    Identity(#[from] IdentityError),

    #[error("network topology: {0}")]
    Topology(#[from] TopologyError),

    #[error("transport: {0}")]
    Transport(#[from] TransportError),

    #[error("client: {0}")]
    Client(#[from] TxError),

    #[error("anonymous identities need a credential engine")]
    MissingEngine,
}

/// Install logging and, when enabled, the metrics exporter.
pub fn init_observability(config: &ObservabilityConfig) {
    if !observability::init_logging(&config.log_level) {
        tracing::debug!("Logging already initialized");
    }

    if config.metrics_enabled {
        match config.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => observability::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }
}

/// Load the configured identity.
///
/// `engine` is required for anonymous identities and ignored otherwise.
pub fn load_identity(
    config: &IdentityConfig,
    engine: Option<Arc<dyn CredentialEngine>>,
) -> Result<Identity, StartupError> {
    match config.kind {
        IdentityKind::X509 => {
            let key = config
                .private_key_path
                .as_deref()
                .ok_or(IdentityError::MissingField("private_key_path"))?;
            let cert = config
                .certificate_path
                .as_deref()
                .ok_or(IdentityError::MissingField("certificate_path"))?;

            let identity = load_x509_files(key, cert, &config.org_id, config.name.as_deref())?;
            if config.verify_key_pair {
                if let Credential::X509(credential) = identity.credential() {
                    credential.check_key_pair()?;
                    tracing::debug!("Private key matches certificate");
                }
            }
            Ok(identity)
        }
        IdentityKind::Anonymous => {
            let engine = engine.ok_or(StartupError::MissingEngine)?;
            let signer_config = config
                .signer_config_path
                .as_deref()
                .ok_or(IdentityError::MissingField("signer_config_path"))?;
            let issuer_key = config
                .issuer_public_key_path
                .as_deref()
                .ok_or(IdentityError::MissingField("issuer_public_key_path"))?;
            let revocation_key = config
                .revocation_public_key_path
                .as_deref()
                .ok_or(IdentityError::MissingField("revocation_public_key_path"))?;

            Ok(load_anonymous_files(
                signer_config,
                issuer_key,
                revocation_key,
                &config.org_id,
                config.role,
                config.name.as_deref().unwrap_or(ANONYMOUS_NAME),
                engine,
            )?)
        }
    }
}

/// Client settings derived from configuration.
pub fn client_settings(config: &ClientConfig) -> ClientSettings {
    let client = &config.client;
    ClientSettings {
        channel_id: client.channel.clone(),
        chaincode: client.chaincode.clone(),
        proposal_timeout: client.proposal_timeout(),
        submit_timeout: client.submit_timeout(),
        commit_timeout: client.commit_timeout(),
        collect_policy: client.collect_policy(),
    }
}

/// Build a client speaking HTTP to the configured network.
pub fn connect(
    config: &ClientConfig,
    engine: Option<Arc<dyn CredentialEngine>>,
) -> Result<TransactionClient, StartupError> {
    // 1. Identity
    let identity = load_identity(&config.identity, engine)?;

    // 2. Topology
    let topology = Arc::new(NetworkTopology::resolve(&config.network.profile_path)?);
    if topology.organization(identity.org_id()).is_none() {
        tracing::warn!(
            org_id = %identity.org_id(),
            "Identity organization not declared in network profile"
        );
    }

    // 3. Transport
    let transport = Transport::unified(HttpTransport::new(&topology)?);

    // 4. Client
    Ok(TransactionClient::new(
        identity,
        topology,
        client_settings(config),
        transport,
    )?)
}
