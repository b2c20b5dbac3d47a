//! Anonymous (idemix-style) credentials and their loader.
//!
//! # Data Flow
//! ```text
//! SignerConfig (JSON: Sk, Cred, credential_revocation_information, ou)
//!     + IssuerPublicKey (protobuf)
//!     + RevocationPublicKey (PEM, P-384 SPKI)
//!     → decode + structural checks (all-or-nothing)
//!     → AnonymousCredential bundled with a CredentialEngine
//! ```
//!
//! # Security
//! - The secret scalar is zeroized on drop and never logged

use std::path::Path;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use p384::pkcs8::DecodePublicKey;
use prost::Message;
use serde::Deserialize;
use zeroize::Zeroizing;

use crate::identity::engine::CredentialEngine;
use crate::identity::types::{IdentityError, IdentityResult};
use crate::identity::{read_bytes, read_text, wire, Credential, Identity};

/// Length of a serialized scalar on the credential curve.
pub const SECRET_SCALAR_LEN: usize = 32;

/// Issuer public key, decoded and structurally checked.
#[derive(Debug, Clone)]
pub struct IssuerPublicKey {
    inner: wire::IssuerPublicKey,
    raw: Vec<u8>,
}

impl IssuerPublicKey {
    pub fn from_bytes(bytes: &[u8]) -> IdentityResult<Self> {
        let inner = wire::IssuerPublicKey::decode(bytes).map_err(|e| malformed("issuer public key", e))?;

        let missing = if inner.h_sk.is_none() {
            Some("h_sk")
        } else if inner.h_rand.is_none() {
            Some("h_rand")
        } else if inner.w.is_none() {
            Some("w")
        } else {
            None
        };
        if let Some(field) = missing {
            return Err(IdentityError::MalformedProtobuf {
                what: "issuer public key",
                reason: format!("missing {}", field),
            });
        }
        if inner.h_attrs.len() != inner.attribute_names.len() {
            return Err(IdentityError::MalformedProtobuf {
                what: "issuer public key",
                reason: format!(
                    "{} attribute bases for {} attribute names",
                    inner.h_attrs.len(),
                    inner.attribute_names.len()
                ),
            });
        }

        Ok(Self {
            inner,
            raw: bytes.to_vec(),
        })
    }

    pub fn attribute_names(&self) -> &[String] {
        &self.inner.attribute_names
    }

    /// Digest the issuer committed to, as carried in the key.
    pub fn hash(&self) -> &[u8] {
        &self.inner.hash
    }

    pub fn as_proto(&self) -> &wire::IssuerPublicKey {
        &self.inner
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.raw
    }
}

/// Long-term revocation authority key (P-384).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevocationPublicKey(p384::PublicKey);

impl RevocationPublicKey {
    pub fn from_pem(pem: &str) -> IdentityResult<Self> {
        p384::PublicKey::from_public_key_pem(pem.trim())
            .map(Self)
            .map_err(|e| IdentityError::MalformedKey(format!("revocation public key: {}", e)))
    }

    pub fn as_key(&self) -> &p384::PublicKey {
        &self.0
    }
}

/// Holder's secret scalar.
#[derive(Clone)]
pub struct SecretScalar(Zeroizing<Vec<u8>>);

impl SecretScalar {
    fn from_base64(encoded: &str) -> IdentityResult<Self> {
        let bytes = Zeroizing::new(
            STANDARD
                .decode(encoded.trim())
                .map_err(|e| IdentityError::MalformedConfig(format!("Sk is not valid base64: {}", e)))?,
        );
        if bytes.len() != SECRET_SCALAR_LEN {
            return Err(IdentityError::MalformedConfig(format!(
                "Sk must be {} bytes, got {}",
                SECRET_SCALAR_LEN,
                bytes.len()
            )));
        }
        Ok(Self(bytes))
    }

    pub fn expose(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Debug for SecretScalar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretScalar(..)")
    }
}

/// Issuer-signed credential over the holder's attributes.
#[derive(Debug, Clone)]
pub struct CredentialBlob {
    inner: wire::Credential,
    raw: Vec<u8>,
}

impl CredentialBlob {
    fn from_bytes(bytes: &[u8], issuer_key: &IssuerPublicKey) -> IdentityResult<Self> {
        let inner = wire::Credential::decode(bytes).map_err(|e| malformed("credential", e))?;

        if inner.a.is_none() || inner.b.is_none() || inner.e.is_empty() || inner.s.is_empty() {
            return Err(IdentityError::MalformedProtobuf {
                what: "credential",
                reason: "signature elements incomplete".to_string(),
            });
        }
        if inner.attrs.len() != issuer_key.attribute_names().len() {
            return Err(IdentityError::MalformedProtobuf {
                what: "credential",
                reason: format!(
                    "{} attributes but issuer key defines {}",
                    inner.attrs.len(),
                    issuer_key.attribute_names().len()
                ),
            });
        }

        Ok(Self {
            inner,
            raw: bytes.to_vec(),
        })
    }

    pub fn as_proto(&self) -> &wire::Credential {
        &self.inner
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.raw
    }
}

/// Per-epoch non-revocation material.
#[derive(Debug, Clone)]
pub struct RevocationInfo {
    inner: wire::CredentialRevocationInformation,
    raw: Vec<u8>,
}

impl RevocationInfo {
    fn from_bytes(bytes: &[u8]) -> IdentityResult<Self> {
        let inner = wire::CredentialRevocationInformation::decode(bytes)
            .map_err(|e| malformed("credential revocation information", e))?;

        if inner.epoch_pk.is_none() || inner.epoch_pk_sig.is_empty() {
            return Err(IdentityError::MalformedProtobuf {
                what: "credential revocation information",
                reason: "epoch key or its signature missing".to_string(),
            });
        }

        Ok(Self {
            inner,
            raw: bytes.to_vec(),
        })
    }

    pub fn epoch(&self) -> i64 {
        self.inner.epoch
    }

    pub fn as_proto(&self) -> &wire::CredentialRevocationInformation {
        &self.inner
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.raw
    }
}

/// Everything needed to sign anonymously. Immutable once built.
#[derive(Debug, Clone)]
pub struct AnonymousCredential {
    issuer_key: IssuerPublicKey,
    revocation_key: RevocationPublicKey,
    secret: SecretScalar,
    credential: CredentialBlob,
    revocation_info: RevocationInfo,
    organizational_unit: String,
    role: i32,
    engine: Arc<dyn CredentialEngine>,
}

impl AnonymousCredential {
    pub fn sign(&self, message: &[u8]) -> IdentityResult<Vec<u8>> {
        self.engine.sign(self, message)
    }

    pub fn verify(&self, message: &[u8], signature: &[u8]) -> IdentityResult<()> {
        self.engine
            .verify(&self.issuer_key, &self.revocation_key, message, signature)
    }

    pub fn identity_proof(&self) -> IdentityResult<Vec<u8>> {
        self.engine.identity_proof(self)
    }

    pub fn issuer_key(&self) -> &IssuerPublicKey {
        &self.issuer_key
    }

    pub fn revocation_key(&self) -> &RevocationPublicKey {
        &self.revocation_key
    }

    pub fn secret(&self) -> &SecretScalar {
        &self.secret
    }

    pub fn credential(&self) -> &CredentialBlob {
        &self.credential
    }

    pub fn revocation_info(&self) -> &RevocationInfo {
        &self.revocation_info
    }

    pub fn organizational_unit(&self) -> &str {
        &self.organizational_unit
    }

    pub fn role(&self) -> i32 {
        self.role
    }
}

/// Raw inputs for [`load_anonymous`].
#[derive(Debug, Clone, Copy)]
pub struct AnonymousArtifacts<'a> {
    /// Signer config JSON.
    pub signer_config: &'a [u8],
    /// Protobuf-encoded issuer public key.
    pub issuer_public_key: &'a [u8],
    /// PEM-armored revocation public key.
    pub revocation_public_key_pem: &'a str,
}

#[derive(Deserialize)]
struct SignerConfig {
    #[serde(rename = "Sk")]
    sk: Option<String>,
    #[serde(rename = "Cred")]
    cred: Option<String>,
    credential_revocation_information: Option<String>,
    organizational_unit_identifier: Option<String>,
}

/// Build an anonymous-credential identity.
pub fn load_anonymous(
    artifacts: AnonymousArtifacts<'_>,
    org_id: &str,
    role: i32,
    display_name: &str,
    engine: Arc<dyn CredentialEngine>,
) -> IdentityResult<Identity> {
    let config: SignerConfig = serde_json::from_slice(artifacts.signer_config)
        .map_err(|e| IdentityError::MalformedConfig(e.to_string()))?;

    let sk = required(config.sk, "Sk")?;
    let cred = required(config.cred, "Cred")?;
    let cri = required(
        config.credential_revocation_information,
        "credential_revocation_information",
    )?;
    let ou = required(
        config.organizational_unit_identifier,
        "organizational_unit_identifier",
    )?;
    if role < 0 {
        return Err(IdentityError::MalformedConfig(format!("invalid role {}", role)));
    }

    let issuer_key = IssuerPublicKey::from_bytes(artifacts.issuer_public_key)?;
    let revocation_key = RevocationPublicKey::from_pem(artifacts.revocation_public_key_pem)?;
    let secret = SecretScalar::from_base64(&sk)?;
    let credential = CredentialBlob::from_bytes(&decode_field(&cred, "Cred")?, &issuer_key)?;
    let revocation_info = RevocationInfo::from_bytes(&decode_field(
        &cri,
        "credential_revocation_information",
    )?)?;

    let credential = AnonymousCredential {
        issuer_key,
        revocation_key,
        secret,
        credential,
        revocation_info,
        organizational_unit: ou,
        role,
        engine,
    };

    let identity = Identity::new(display_name, org_id, Credential::Anonymous(credential))?;
    tracing::info!(
        name = %identity.display_name(),
        org_id = %identity.org_id(),
        role = role,
        "Anonymous credential identity loaded"
    );
    Ok(identity)
}

/// Build an anonymous-credential identity from the three artifact files.
pub fn load_anonymous_files(
    signer_config_path: &Path,
    issuer_public_key_path: &Path,
    revocation_public_key_path: &Path,
    org_id: &str,
    role: i32,
    display_name: &str,
    engine: Arc<dyn CredentialEngine>,
) -> IdentityResult<Identity> {
    let signer_config = read_bytes(signer_config_path)?;
    let issuer_public_key = read_bytes(issuer_public_key_path)?;
    let revocation_public_key_pem = read_text(revocation_public_key_path)?;

    load_anonymous(
        AnonymousArtifacts {
            signer_config: &signer_config,
            issuer_public_key: &issuer_public_key,
            revocation_public_key_pem: &revocation_public_key_pem,
        },
        org_id,
        role,
        display_name,
        engine,
    )
}

fn required(value: Option<String>, field: &'static str) -> IdentityResult<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(IdentityError::MissingField(field)),
    }
}

fn decode_field(encoded: &str, field: &str) -> IdentityResult<Vec<u8>> {
    STANDARD
        .decode(encoded.trim())
        .map_err(|e| IdentityError::MalformedConfig(format!("{} is not valid base64: {}", field, e)))
}

fn malformed(what: &'static str, err: prost::DecodeError) -> IdentityError {
    IdentityError::MalformedProtobuf {
        what,
        reason: err.to_string(),
    }
}
