//! Resolved network topology.
//!
//! # Responsibilities
//! - Turn a network profile into endpoints tagged with their owning org
//! - Answer peer/orderer lookups; never mutated after `resolve`

use std::collections::{HashMap, HashSet};
use std::path::Path;

use crate::network::endpoint::{base_url, OrdererEndpoint, PeerEndpoint};
use crate::network::profile::{NetworkProfile, NodeEntry, ProfileFormat};
use crate::network::types::{TopologyError, TopologyResult};

/// One organization's endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Organization {
    pub id: String,
    pub peers: Vec<PeerEndpoint>,
    pub orderers: Vec<OrdererEndpoint>,
}

/// Read-only lookup table of organizations, peers and orderers.
///
/// Safe for unsynchronized concurrent reads; share it behind an `Arc`.
#[derive(Debug, Clone, Default)]
pub struct NetworkTopology {
    organizations: Vec<Organization>,
    all_peers: Vec<PeerEndpoint>,
    orderers: Vec<OrdererEndpoint>,
    default_org: Option<String>,
}

impl NetworkTopology {
    /// Load and resolve a profile file (TOML, or YAML by extension).
    pub fn resolve(path: &Path) -> TopologyResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| TopologyError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let profile = NetworkProfile::parse(&content, ProfileFormat::from_path(path))?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));

        let topology = Self::from_profile(&profile, base_dir)?;
        tracing::info!(
            path = %path.display(),
            organizations = topology.organizations.len(),
            peers = topology.all_peers.len(),
            orderers = topology.orderers.len(),
            "Network topology resolved"
        );
        Ok(topology)
    }

    /// Resolve an already parsed profile. TLS paths are relative to `base_dir`.
    pub fn from_profile(profile: &NetworkProfile, base_dir: &Path) -> TopologyResult<Self> {
        let peer_decls = index_nodes(&profile.peers, "peer")?;
        let orderer_decls = index_nodes(&profile.orderers, "orderer")?;

        let mut organizations = Vec::with_capacity(profile.organizations.len());
        let mut org_ids = HashSet::new();
        // peer name -> owning org
        let mut peer_owner: HashMap<&str, &str> = HashMap::new();
        let mut referenced_orderers = HashSet::new();

        for org in &profile.organizations {
            if org.id.trim().is_empty() {
                return Err(TopologyError::MalformedConfig(
                    "organization with empty id".to_string(),
                ));
            }
            if !org_ids.insert(org.id.as_str()) {
                return Err(TopologyError::MalformedConfig(format!(
                    "organization '{}' declared twice",
                    org.id
                )));
            }

            let mut peers = Vec::with_capacity(org.peers.len());
            for name in &org.peers {
                let entry = peer_decls.get(name.as_str()).ok_or_else(|| {
                    TopologyError::MalformedConfig(format!(
                        "organization '{}' references undeclared peer '{}'",
                        org.id, name
                    ))
                })?;
                if let Some(owner) = peer_owner.insert(name.as_str(), org.id.as_str()) {
                    return Err(TopologyError::MalformedConfig(format!(
                        "peer '{}' listed by both '{}' and '{}'",
                        name, owner, org.id
                    )));
                }
                peers.push(PeerEndpoint {
                    name: entry.name.clone(),
                    address: entry.url.clone(),
                    tls_root_cert: load_tls(entry, base_dir)?,
                    org_id: org.id.clone(),
                });
            }

            let mut orderers = Vec::with_capacity(org.orderers.len());
            for name in &org.orderers {
                let entry = orderer_decls.get(name.as_str()).ok_or_else(|| {
                    TopologyError::MalformedConfig(format!(
                        "organization '{}' references undeclared orderer '{}'",
                        org.id, name
                    ))
                })?;
                referenced_orderers.insert(name.as_str());
                orderers.push(OrdererEndpoint {
                    name: entry.name.clone(),
                    address: entry.url.clone(),
                    tls_root_cert: load_tls(entry, base_dir)?,
                    org_id: org.id.clone(),
                });
            }

            organizations.push(Organization {
                id: org.id.clone(),
                peers,
                orderers,
            });
        }

        if let Some(orphan) = profile
            .peers
            .iter()
            .find(|p| !peer_owner.contains_key(p.name.as_str()))
        {
            return Err(TopologyError::MalformedConfig(format!(
                "peer '{}' is not owned by any organization",
                orphan.name
            )));
        }
        if let Some(orphan) = profile
            .orderers
            .iter()
            .find(|o| !referenced_orderers.contains(o.name.as_str()))
        {
            return Err(TopologyError::MalformedConfig(format!(
                "orderer '{}' is not reachable through any organization",
                orphan.name
            )));
        }

        let default_org = match &profile.client.organization {
            Some(org) if !org_ids.contains(org.as_str()) => {
                return Err(TopologyError::UnknownOrg(org.clone()));
            }
            other => other.clone(),
        };

        let all_peers = organizations
            .iter()
            .flat_map(|org| org.peers.iter())
            .cloned()
            .collect();

        // First owner wins for orderers shared between organizations.
        let mut seen = HashSet::new();
        let orderers = organizations
            .iter()
            .flat_map(|org| org.orderers.iter())
            .filter(|o| seen.insert(o.name.clone()))
            .cloned()
            .collect();

        Ok(Self {
            organizations,
            all_peers,
            orderers,
            default_org,
        })
    }

    /// Peers owned by `org_id`, in profile order. Empty for unknown orgs.
    pub fn peers_of(&self, org_id: &str) -> &[PeerEndpoint] {
        self.organization(org_id)
            .map(|org| org.peers.as_slice())
            .unwrap_or(&[])
    }

    /// Every peer across all organizations, in profile order.
    pub fn all_peers(&self) -> &[PeerEndpoint] {
        &self.all_peers
    }

    /// Ordering nodes, deduplicated, in profile order.
    pub fn orderers(&self) -> &[OrdererEndpoint] {
        &self.orderers
    }

    pub fn organizations(&self) -> &[Organization] {
        &self.organizations
    }

    pub fn organization(&self, org_id: &str) -> Option<&Organization> {
        self.organizations.iter().find(|org| org.id == org_id)
    }

    /// Look a peer up by name.
    pub fn peer(&self, name: &str) -> Option<&PeerEndpoint> {
        self.all_peers.iter().find(|p| p.name == name)
    }

    /// Organization named in the profile's client section.
    pub fn default_org(&self) -> Option<&str> {
        self.default_org.as_deref()
    }
}

fn index_nodes<'a>(
    nodes: &'a [NodeEntry],
    kind: &str,
) -> TopologyResult<HashMap<&'a str, &'a NodeEntry>> {
    let mut index = HashMap::with_capacity(nodes.len());
    for node in nodes {
        if node.name.trim().is_empty() || node.url.trim().is_empty() {
            return Err(TopologyError::MalformedConfig(format!(
                "{} entry needs both name and url",
                kind
            )));
        }
        base_url(&node.url)?;
        if index.insert(node.name.as_str(), node).is_some() {
            return Err(TopologyError::MalformedConfig(format!(
                "{} '{}' declared twice",
                kind, node.name
            )));
        }
    }
    Ok(index)
}

fn load_tls(entry: &NodeEntry, base_dir: &Path) -> TopologyResult<Option<String>> {
    entry
        .tls_ca_cert
        .as_ref()
        .map(|cert| cert.load(base_dir))
        .transpose()
}
