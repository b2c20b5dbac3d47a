//! Addressable network endpoints.

use url::Url;

use crate::network::types::{TopologyError, TopologyResult};

/// An endorsing peer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PeerEndpoint {
    /// Unique peer name from the profile.
    pub name: String,
    /// Address as written in the profile (`grpcs://host:port`, `host:port`, ...).
    pub address: String,
    /// PEM bundle of the TLS roots trusted for this peer.
    pub tls_root_cert: Option<String>,
    /// Organization owning this peer.
    pub org_id: String,
}

/// An ordering service node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OrdererEndpoint {
    pub name: String,
    pub address: String,
    pub tls_root_cert: Option<String>,
    pub org_id: String,
}

/// Common view over peers and orderers.
pub trait Endpoint {
    fn name(&self) -> &str;
    fn address(&self) -> &str;
    fn tls_root_cert(&self) -> Option<&str>;

    /// HTTP base URL for this endpoint.
    ///
    /// `grpcs://` and `https://` map to `https`, `grpc://` and bare
    /// `host:port` map to `http`.
    fn base_url(&self) -> TopologyResult<Url> {
        base_url(self.address())
    }
}

impl Endpoint for PeerEndpoint {
    fn name(&self) -> &str {
        &self.name
    }

    fn address(&self) -> &str {
        &self.address
    }

    fn tls_root_cert(&self) -> Option<&str> {
        self.tls_root_cert.as_deref()
    }
}

impl Endpoint for OrdererEndpoint {
    fn name(&self) -> &str {
        &self.name
    }

    fn address(&self) -> &str {
        &self.address
    }

    fn tls_root_cert(&self) -> Option<&str> {
        self.tls_root_cert.as_deref()
    }
}

pub(crate) fn base_url(address: &str) -> TopologyResult<Url> {
    let (scheme, rest) = match address.split_once("://") {
        Some(("grpcs", rest)) | Some(("https", rest)) => ("https", rest),
        Some(("grpc", rest)) | Some(("http", rest)) => ("http", rest),
        Some((other, _)) => {
            return Err(TopologyError::MalformedConfig(format!(
                "unsupported scheme '{}' in address '{}'",
                other, address
            )))
        }
        None => ("http", address),
    };

    let url = Url::parse(&format!("{}://{}", scheme, rest)).map_err(|e| {
        TopologyError::MalformedConfig(format!("invalid address '{}': {}", address, e))
    })?;
    if url.host_str().is_none() {
        return Err(TopologyError::MalformedConfig(format!(
            "address '{}' has no host",
            address
        )));
    }
    Ok(url)
}
