//! Network profile document schema.
//!
//! Mirrors the shape of a ledger connection profile: organizations reference
//! peers and orderers by name, and nodes are declared once at the top level.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::network::types::{TopologyError, TopologyResult};

/// Root of a network profile.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct NetworkProfile {
    /// Client-side defaults.
    pub client: ProfileClient,

    /// Organizations in priority order.
    pub organizations: Vec<OrganizationEntry>,

    /// Peer declarations.
    pub peers: Vec<NodeEntry>,

    /// Orderer declarations.
    pub orderers: Vec<NodeEntry>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProfileClient {
    /// Organization the client belongs to.
    pub organization: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OrganizationEntry {
    /// Organization (MSP) identifier.
    pub id: String,

    /// Names of peers owned by this organization.
    #[serde(default)]
    pub peers: Vec<String>,

    /// Names of orderers reachable through this organization.
    #[serde(default)]
    pub orderers: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NodeEntry {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub tls_ca_cert: Option<TlsCertRef>,
}

/// TLS root certificate, either inline or by file reference.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TlsCertRef {
    Path(PathBuf),
    Pem(String),
}

impl TlsCertRef {
    /// Resolve to PEM text. Relative paths are taken from `base_dir`.
    pub fn load(&self, base_dir: &Path) -> TopologyResult<String> {
        match self {
            TlsCertRef::Pem(pem) => Ok(pem.clone()),
            TlsCertRef::Path(path) => {
                let full = if path.is_absolute() {
                    path.clone()
                } else {
                    base_dir.join(path)
                };
                std::fs::read_to_string(&full).map_err(|source| TopologyError::Io {
                    path: full.display().to_string(),
                    source,
                })
            }
        }
    }
}

/// Profile document encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileFormat {
    Toml,
    Yaml,
}

impl ProfileFormat {
    /// Pick the format from a file extension; anything but `.yaml`/`.yml` is TOML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => ProfileFormat::Yaml,
            _ => ProfileFormat::Toml,
        }
    }
}

impl NetworkProfile {
    pub fn parse(content: &str, format: ProfileFormat) -> TopologyResult<Self> {
        match format {
            ProfileFormat::Toml => {
                toml::from_str(content).map_err(|e| TopologyError::Parse(e.to_string()))
            }
            ProfileFormat::Yaml => {
                serde_yaml::from_str(content).map_err(|e| TopologyError::Parse(e.to_string()))
            }
        }
    }
}
