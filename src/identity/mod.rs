//! Signing identities.
//!
//! # Data Flow
//! ```text
//! On-disk / in-memory artifacts
//!     → x509.rs (PEM key + certificate)          ┐
//!     → anonymous.rs (signer config + issuer key ├→ Identity (immutable)
//!        + revocation key, engine-backed)        ┘
//!     → TransactionClient signs proposals and envelopes with it
//! ```
//!
//! # Design Decisions
//! - `Credential` is a closed enum: exactly one variant is populated
//! - Loading is all-or-nothing; no partially built identity escapes
//! - Identities are never mutated; swapping one means replacing the `Arc`

pub mod anonymous;
pub mod engine;
pub mod types;
pub mod wire;
pub mod x509;

use std::path::Path;

use prost::Message;

pub use anonymous::{load_anonymous, load_anonymous_files, AnonymousArtifacts, AnonymousCredential};
pub use engine::CredentialEngine;
pub use types::{IdentityError, IdentityResult};
pub use x509::{load_x509, load_x509_files, X509Credential};

/// The two supported credential kinds.
#[derive(Debug, Clone)]
pub enum Credential {
    X509(X509Credential),
    Anonymous(AnonymousCredential),
}

/// Credential material plus organizational metadata.
#[derive(Debug, Clone)]
pub struct Identity {
    display_name: String,
    org_id: String,
    credential: Credential,
}

impl Identity {
    /// Bundle a parsed credential with its metadata.
    ///
    /// Fails if `org_id` or `display_name` is empty.
    pub fn new(
        display_name: impl Into<String>,
        org_id: impl Into<String>,
        credential: Credential,
    ) -> IdentityResult<Self> {
        let display_name = display_name.into();
        let org_id = org_id.into();
        if org_id.trim().is_empty() {
            return Err(IdentityError::MissingField("org_id"));
        }
        if display_name.trim().is_empty() {
            return Err(IdentityError::MissingField("display_name"));
        }
        Ok(Self {
            display_name,
            org_id,
            credential,
        })
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Organizational membership identifier (MSP id).
    pub fn org_id(&self) -> &str {
        &self.org_id
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    /// Short label for logs.
    pub fn kind(&self) -> &'static str {
        match self.credential {
            Credential::X509(_) => "x509",
            Credential::Anonymous(_) => "anonymous",
        }
    }

    /// Sign arbitrary bytes.
    pub fn sign(&self, message: &[u8]) -> IdentityResult<Vec<u8>> {
        match &self.credential {
            Credential::X509(c) => c.sign(message),
            Credential::Anonymous(c) => c.sign(message),
        }
    }

    /// Verify a signature produced by this identity.
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> IdentityResult<()> {
        match &self.credential {
            Credential::X509(c) => c.verify(message, signature),
            Credential::Anonymous(c) => c.verify(message, signature),
        }
    }

    /// Serialized creator placed in proposal headers.
    pub fn creator_bytes(&self) -> IdentityResult<Vec<u8>> {
        let id_bytes = match &self.credential {
            Credential::X509(c) => c.certificate_pem().as_bytes().to_vec(),
            Credential::Anonymous(c) => wire::SerializedAnonymousIdentity {
                ou: c.organizational_unit().to_string(),
                role: c.role(),
                proof: c.identity_proof()?,
            }
            .encode_to_vec(),
        };

        Ok(wire::SerializedIdentity {
            mspid: self.org_id.clone(),
            id_bytes,
        }
        .encode_to_vec())
    }
}

pub(crate) fn read_text(path: &Path) -> IdentityResult<String> {
    std::fs::read_to_string(path).map_err(|source| IdentityError::Io {
        path: path.display().to_string(),
        source,
    })
}

pub(crate) fn read_bytes(path: &Path) -> IdentityResult<Vec<u8>> {
    std::fs::read(path).map_err(|source| IdentityError::Io {
        path: path.display().to_string(),
        source,
    })
}
