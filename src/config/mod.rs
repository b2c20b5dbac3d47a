//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! client config file (TOML)
//!     → loader.rs (parse & deserialize, resolve relative paths)
//!     → validation.rs (semantic checks)
//!     → ClientConfig (validated, immutable)
//!     → lifecycle::startup builds identity, topology and client from it
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{ClientConfig, IdentityConfig, IdentityKind, ObservabilityConfig};
pub use validation::{validate_config, ValidationError};
