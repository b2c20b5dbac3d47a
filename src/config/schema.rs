//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::transaction::CollectPolicy;

/// Root configuration for the ledger client.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ClientConfig {
    /// Channel, chaincode and timing.
    pub client: ClientSection,

    /// Credential to sign with.
    pub identity: IdentityConfig,

    /// Network profile location.
    pub network: NetworkConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Channel and transaction timing.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientSection {
    pub channel: String,
    pub chaincode: String,

    /// Per-peer proposal timeout.
    pub proposal_timeout_ms: u64,

    /// Per-orderer broadcast timeout.
    pub submit_timeout_ms: u64,

    /// How long to wait for the commit event.
    pub commit_timeout_secs: u64,

    /// Endorsements to wait for before submitting. 0 = every peer.
    pub min_endorsements: usize,
}

impl Default for ClientSection {
    fn default() -> Self {
        Self {
            channel: String::new(),
            chaincode: String::new(),
            proposal_timeout_ms: 1000,
            submit_timeout_ms: 3000,
            commit_timeout_secs: 30,
            min_endorsements: 0,
        }
    }
}

impl ClientSection {
    pub fn proposal_timeout(&self) -> Duration {
        Duration::from_millis(self.proposal_timeout_ms)
    }

    pub fn submit_timeout(&self) -> Duration {
        Duration::from_millis(self.submit_timeout_ms)
    }

    pub fn commit_timeout(&self) -> Duration {
        Duration::from_secs(self.commit_timeout_secs)
    }

    pub fn collect_policy(&self) -> CollectPolicy {
        CollectPolicy::from_min(self.min_endorsements)
    }
}

/// Which credential family the identity uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum IdentityKind {
    #[default]
    X509,
    Anonymous,
}

/// Credential artifacts.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct IdentityConfig {
    pub kind: IdentityKind,

    /// Display name. X.509 identities fall back to the certificate subject.
    pub name: Option<String>,

    /// Organization (MSP) identifier.
    pub org_id: String,

    // X.509
    pub private_key_path: Option<PathBuf>,
    pub certificate_path: Option<PathBuf>,

    /// Check that the private key matches the certificate at startup.
    pub verify_key_pair: bool,

    // Anonymous
    pub signer_config_path: Option<PathBuf>,
    pub issuer_public_key_path: Option<PathBuf>,
    pub revocation_public_key_path: Option<PathBuf>,
    pub role: i32,
}

/// Network profile location.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct NetworkConfig {
    /// TOML, or YAML when the extension is `.yaml`/`.yml`.
    pub profile_path: PathBuf,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
