//! Network topology subsystem.
//!
//! # Data Flow
//! ```text
//! network profile (TOML/YAML)
//!     → profile.rs (parse & deserialize)
//!     → topology.rs (resolve names, tag endpoints with their org)
//!     → NetworkTopology (read-only, shared via Arc)
//!     → TransactionClient picks peers/orderers from it
//! ```
//!
//! # Design Decisions
//! - Loaded once; no mutation after resolution
//! - Profile order is preserved for every peer/orderer listing
//! - Unknown organizations resolve to an empty peer list on lookup

pub mod endpoint;
pub mod profile;
pub mod topology;
pub mod types;

pub use endpoint::{Endpoint, OrdererEndpoint, PeerEndpoint};
pub use profile::{NetworkProfile, ProfileFormat};
pub use topology::{NetworkTopology, Organization};
pub use types::{TopologyError, TopologyResult};
