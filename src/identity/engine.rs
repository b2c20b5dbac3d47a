//! Credential engine seam.
//!
//! The pairing-based proof system behind anonymous credentials lives outside
//! this crate. An implementation is handed to the anonymous loader and bundled
//! into the resulting identity, which calls back into it for every signature.

use std::fmt;

use crate::identity::anonymous::{AnonymousCredential, IssuerPublicKey, RevocationPublicKey};
use crate::identity::types::IdentityResult;

/// Zero-knowledge signing capability for anonymous credentials.
pub trait CredentialEngine: Send + Sync + fmt::Debug {
    /// Produce a signature over `message` proving possession of `credential`.
    fn sign(&self, credential: &AnonymousCredential, message: &[u8]) -> IdentityResult<Vec<u8>>;

    /// Verify a signature using only public material.
    fn verify(
        &self,
        issuer_key: &IssuerPublicKey,
        revocation_key: &RevocationPublicKey,
        message: &[u8],
        signature: &[u8],
    ) -> IdentityResult<()>;

    /// Proof bytes embedded in the serialized creator (pseudonym and
    /// attribute disclosure).
    fn identity_proof(&self, credential: &AnonymousCredential) -> IdentityResult<Vec<u8>>;
}
