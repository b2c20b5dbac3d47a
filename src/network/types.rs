//! Topology error definitions.

use thiserror::Error;

/// Errors raised while resolving a network profile.
#[derive(Debug, Error)]
pub enum TopologyError {
    /// The profile or a referenced TLS certificate could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The profile is not valid TOML/YAML for the expected schema.
    #[error("failed to parse network profile: {0}")]
    Parse(String),

    /// The profile parsed but is semantically inconsistent.
    #[error("malformed network profile: {0}")]
    MalformedConfig(String),

    /// An organization was referenced that the profile does not declare.
    #[error("unknown organization '{0}'")]
    UnknownOrg(String),
}

/// Result type for topology operations.
pub type TopologyResult<T> = Result<T, TopologyError>;
