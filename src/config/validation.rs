//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check that the selected identity kind has its artifacts
//! - Validate value ranges (timeouts > 0, addresses parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ClientConfig → Result<(), Vec<ValidationError>>
//! - File existence is checked later, when the artifacts are loaded

use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::config::schema::{ClientConfig, IdentityKind};

/// A single semantic problem, tagged with the offending field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Check a parsed config, collecting every problem.
pub fn validate_config(config: &ClientConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let client = &config.client;
    if client.channel.trim().is_empty() {
        errors.push(ValidationError::new("client.channel", "must not be empty"));
    }
    if client.chaincode.trim().is_empty() {
        errors.push(ValidationError::new("client.chaincode", "must not be empty"));
    }
    if client.proposal_timeout_ms == 0 {
        errors.push(ValidationError::new("client.proposal_timeout_ms", "must be positive"));
    }
    if client.submit_timeout_ms == 0 {
        errors.push(ValidationError::new("client.submit_timeout_ms", "must be positive"));
    }
    if client.commit_timeout_secs == 0 {
        errors.push(ValidationError::new("client.commit_timeout_secs", "must be positive"));
    }

    let identity = &config.identity;
    if identity.org_id.trim().is_empty() {
        errors.push(ValidationError::new("identity.org_id", "must not be empty"));
    }
    match identity.kind {
        IdentityKind::X509 => {
            require_path(&mut errors, "identity.private_key_path", &identity.private_key_path);
            require_path(&mut errors, "identity.certificate_path", &identity.certificate_path);
        }
        IdentityKind::Anonymous => {
            require_path(&mut errors, "identity.signer_config_path", &identity.signer_config_path);
            require_path(&mut errors, "identity.issuer_public_key_path", &identity.issuer_public_key_path);
            require_path(
                &mut errors,
                "identity.revocation_public_key_path",
                &identity.revocation_public_key_path,
            );
        }
    }

    if config.network.profile_path.as_os_str().is_empty() {
        errors.push(ValidationError::new("network.profile_path", "must be set"));
    }

    let observability = &config.observability;
    if !LOG_LEVELS.contains(&observability.log_level.as_str()) {
        errors.push(ValidationError::new(
            "observability.log_level",
            format!("unknown level '{}'", observability.log_level),
        ));
    }
    if observability.metrics_enabled && observability.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn require_path(errors: &mut Vec<ValidationError>, field: &'static str, path: &Option<PathBuf>) {
    match path {
        Some(p) if !p.as_os_str().is_empty() => {}
        _ => errors.push(ValidationError::new(field, "required for this identity kind")),
    }
}
