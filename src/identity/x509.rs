//! Certificate-based credentials and their loader.
//!
//! # Security
//! - Private keys are never logged or serialized
//! - Load-time policy is permissive: the key is not checked against the
//!   certificate unless [`X509Credential::check_key_pair`] is called

use std::path::Path;

use p256::ecdsa::signature::{Signer, Verifier};
use p256::ecdsa::{Signature, SigningKey, VerifyingKey};
use p256::pkcs8::DecodePrivateKey;
use p256::SecretKey;
use rustls_pemfile::Item;
use x509_parser::extensions::GeneralName;

use crate::identity::types::{IdentityError, IdentityResult};
use crate::identity::{read_text, Credential, Identity};

/// P-256 signing key plus the certificate that vouches for it.
#[derive(Clone)]
pub struct X509Credential {
    signing_key: SigningKey,
    certificate_pem: String,
    certificate_key: VerifyingKey,
    subject: String,
    alt_name: Option<String>,
}

impl X509Credential {
    /// Parse a PEM private key (PKCS#8 or SEC1) and a PEM certificate.
    pub fn from_pem(private_key_pem: &str, certificate_pem: &str) -> IdentityResult<Self> {
        let secret = parse_private_key(private_key_pem)?;
        let parsed = parse_certificate(certificate_pem)?;

        Ok(Self {
            signing_key: SigningKey::from(secret),
            certificate_pem: certificate_pem.to_string(),
            certificate_key: parsed.key,
            subject: parsed.subject,
            alt_name: parsed.alt_name,
        })
    }

    /// ECDSA-P256/SHA-256 signature, low-S normalised, DER encoded.
    pub fn sign(&self, message: &[u8]) -> IdentityResult<Vec<u8>> {
        let signature: Signature = self
            .signing_key
            .try_sign(message)
            .map_err(|e| IdentityError::Signing(e.to_string()))?;
        // Peers reject high-S signatures.
        let signature = signature.normalize_s().unwrap_or(signature);
        Ok(signature.to_der().as_bytes().to_vec())
    }

    /// Verify a DER signature against the certificate's public key.
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> IdentityResult<()> {
        let signature = Signature::from_der(signature)
            .map_err(|e| IdentityError::Verification(format!("bad DER signature: {}", e)))?;
        self.certificate_key
            .verify(message, &signature)
            .map_err(|e| IdentityError::Verification(e.to_string()))
    }

    /// Confirm the private key belongs to the certificate.
    pub fn check_key_pair(&self) -> IdentityResult<()> {
        if *self.signing_key.verifying_key() == self.certificate_key {
            Ok(())
        } else {
            Err(IdentityError::KeyMismatch)
        }
    }

    pub fn certificate_pem(&self) -> &str {
        &self.certificate_pem
    }

    /// Public key taken from the certificate.
    pub fn certificate_key(&self) -> &VerifyingKey {
        &self.certificate_key
    }

    /// Certificate subject in RFC 4514 form.
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// First textual subject alternative name, if any.
    pub fn alt_name(&self) -> Option<&str> {
        self.alt_name.as_deref()
    }
}

impl std::fmt::Debug for X509Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("X509Credential")
            .field("subject", &self.subject)
            .finish_non_exhaustive()
    }
}

/// Build an identity from in-memory PEM material.
///
/// When `display_name` is `None` the certificate subject is used, then the
/// first subject alternative name, then `org_id`.
pub fn load_x509(
    private_key_pem: &str,
    certificate_pem: &str,
    org_id: &str,
    display_name: Option<&str>,
) -> IdentityResult<Identity> {
    let credential = X509Credential::from_pem(private_key_pem, certificate_pem)?;
    let name = display_name
        .filter(|name| !name.trim().is_empty())
        .or_else(|| Some(credential.subject()).filter(|s| !s.is_empty()))
        .or_else(|| credential.alt_name())
        .unwrap_or(org_id)
        .to_string();

    let identity = Identity::new(name, org_id, Credential::X509(credential))?;
    tracing::info!(
        name = %identity.display_name(),
        org_id = %identity.org_id(),
        "X.509 identity loaded"
    );
    Ok(identity)
}

/// Build an identity from a private key file and a certificate file.
pub fn load_x509_files(
    private_key_path: &Path,
    certificate_path: &Path,
    org_id: &str,
    display_name: Option<&str>,
) -> IdentityResult<Identity> {
    let key = read_text(private_key_path)?;
    let cert = read_text(certificate_path)?;
    load_x509(&key, &cert, org_id, display_name)
}

fn parse_private_key(pem: &str) -> IdentityResult<SecretKey> {
    let mut reader = pem.as_bytes();
    loop {
        match rustls_pemfile::read_one(&mut reader) {
            Ok(Some(Item::Pkcs8Key(key))) => {
                return SecretKey::from_pkcs8_der(key.secret_pkcs8_der())
                    .map_err(|e| IdentityError::MalformedKey(format!("PKCS#8: {}", e)));
            }
            Ok(Some(Item::Sec1Key(key))) => {
                return SecretKey::from_sec1_der(key.secret_sec1_der())
                    .map_err(|e| IdentityError::MalformedKey(format!("SEC1: {}", e)));
            }
            Ok(Some(_)) => continue,
            Ok(None) => {
                return Err(IdentityError::MalformedKey(
                    "no private key block found".to_string(),
                ))
            }
            Err(e) => return Err(IdentityError::MalformedKey(e.to_string())),
        }
    }
}

struct ParsedCertificate {
    key: VerifyingKey,
    subject: String,
    alt_name: Option<String>,
}

fn parse_certificate(pem: &str) -> IdentityResult<ParsedCertificate> {
    let mut reader = pem.as_bytes();
    let der = loop {
        match rustls_pemfile::read_one(&mut reader) {
            Ok(Some(Item::X509Certificate(der))) => break der,
            Ok(Some(_)) => continue,
            Ok(None) => {
                return Err(IdentityError::MalformedCert(
                    "no certificate block found".to_string(),
                ))
            }
            Err(e) => return Err(IdentityError::MalformedCert(e.to_string())),
        }
    };

    let (_, cert) = x509_parser::parse_x509_certificate(der.as_ref())
        .map_err(|e| IdentityError::MalformedCert(e.to_string()))?;

    let key_bytes = cert.public_key().subject_public_key.data.as_ref();
    let key = VerifyingKey::from_sec1_bytes(key_bytes).map_err(|_| {
        IdentityError::MalformedCert("certificate public key is not a P-256 key".to_string())
    })?;

    let alt_name = cert
        .subject_alternative_name()
        .ok()
        .flatten()
        .and_then(|san| {
            san.value.general_names.iter().find_map(|name| match name {
                GeneralName::DNSName(s) | GeneralName::RFC822Name(s) | GeneralName::URI(s) => {
                    Some(s.to_string())
                }
                _ => None,
            })
        });

    Ok(ParsedCertificate {
        key,
        subject: cert.subject().to_string(),
        alt_name,
    })
}
