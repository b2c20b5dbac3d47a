//! Identity error definitions.

use thiserror::Error;

/// Errors that can occur while loading or using a signing identity.
///
/// Every loader is all-or-nothing: any of these aborts construction and no
/// partial [`Identity`](crate::identity::Identity) is returned.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// A credential artifact could not be read from disk.
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Private or public key material is missing or not parseable.
    #[error("malformed key: {0}")]
    MalformedKey(String),

    /// Certificate is missing or not parseable.
    #[error("malformed certificate: {0}")]
    MalformedCert(String),

    /// Structured credential config is missing, empty or badly encoded.
    #[error("malformed credential config: {0}")]
    MalformedConfig(String),

    /// A binary credential blob does not match its schema.
    #[error("malformed {what}: {reason}")]
    MalformedProtobuf { what: &'static str, reason: String },

    /// A required field is absent or empty.
    #[error("missing required field '{0}'")]
    MissingField(&'static str),

    /// Private key does not belong to the certificate.
    #[error("private key does not match certificate public key")]
    KeyMismatch,

    /// Signature production failed.
    #[error("signing failed: {0}")]
    Signing(String),

    /// Signature did not verify.
    #[error("signature verification failed: {0}")]
    Verification(String),

    /// The credential engine reported an error.
    #[error("credential engine error: {0}")]
    Engine(String),
}

/// Result type for identity operations.
pub type IdentityResult<T> = Result<T, IdentityError>;
