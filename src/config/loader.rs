//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::ClientConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load and validate configuration from a TOML file.
///
/// Relative artifact paths are resolved against the config file's directory.
pub fn load_config(path: &Path) -> Result<ClientConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let mut config = parse_config(&content)?;

    if let Some(base) = path.parent() {
        resolve_paths(&mut config, base);
    }

    Ok(config)
}

/// Parse and validate configuration text.
pub fn parse_config(content: &str) -> Result<ClientConfig, ConfigError> {
    let config: ClientConfig = toml::from_str(content).map_err(ConfigError::Parse)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

fn resolve_paths(config: &mut ClientConfig, base: &Path) {
    let identity = &mut config.identity;
    for path in [
        &mut identity.private_key_path,
        &mut identity.certificate_path,
        &mut identity.signer_config_path,
        &mut identity.issuer_public_key_path,
        &mut identity.revocation_public_key_path,
    ]
    .into_iter()
    .flatten()
    {
        if path.is_relative() {
            *path = base.join(&*path);
        }
    }

    if config.network.profile_path.is_relative() {
        config.network.profile_path = base.join(&config.network.profile_path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const MINIMAL: &str = r#"
[client]
channel = "mychannel"
chaincode = "basic"

[identity]
org_id = "Org1MSP"
private_key_path = "keys/user.key"
certificate_path = "/abs/user.pem"

[network]
profile_path = "network.toml"
"#;

    #[test]
    fn test_parse_minimal() {
        let config = parse_config(MINIMAL).unwrap();
        assert_eq!(config.client.chaincode, "basic");
    }

    #[test]
    fn test_parse_error() {
        assert!(matches!(parse_config("[client"), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_validation_error_display() {
        let err = parse_config("[client]\nchannel = \"c\"\n").unwrap_err();
        let text = err.to_string();
        assert!(text.starts_with("Validation failed: "));
        assert!(text.contains("client.chaincode: must not be empty"));
    }

    #[test]
    fn test_relative_paths_resolved() {
        let mut config = parse_config(MINIMAL).unwrap();
        resolve_paths(&mut config, Path::new("/etc/ledger"));
        assert_eq!(
            config.identity.private_key_path,
            Some(PathBuf::from("/etc/ledger/keys/user.key"))
        );
        assert_eq!(config.identity.certificate_path, Some(PathBuf::from("/abs/user.pem")));
        assert_eq!(config.network.profile_path, PathBuf::from("/etc/ledger/network.toml"));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            load_config(Path::new("/nonexistent/client.toml")),
            Err(ConfigError::Io(_))
        ));
    }
}
