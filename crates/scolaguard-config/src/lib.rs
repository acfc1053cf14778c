//! # Scolaguard Config
//!
//! Configuration structures loaded from environment variables:
//!
//! - [`jwt`]: JWT verification configuration
//! - [`cors`]: CORS (Cross-Origin Resource Sharing) configuration
//! - [`audit`]: audit recorder queue and sensitive resources
//! - [`registry`]: module registry behaviour and request limits
//! - [`server`]: listen addresses
//!
//! # Example
//!
//! ```ignore
//! use scolaguard_config::{AuditConfig, JwtConfig, RegistryConfig};
//!
//! let jwt_config = JwtConfig::from_env();
//! let audit_config = AuditConfig::from_env();
//! let registry_config = RegistryConfig::from_env();
//! ```

pub mod audit;
pub mod cors;
pub mod jwt;
pub mod registry;
pub mod server;

pub use audit::AuditConfig;
pub use cors::CorsConfig;
pub use jwt::JwtConfig;
pub use registry::RegistryConfig;
pub use server::ServerConfig;

/// Parse a boolean flag the way every config in this crate does.
pub(crate) fn parse_flag(value: &str) -> bool {
    let value = value.trim().to_lowercase();
    value == "true" || value == "1"
}

/// Split a comma separated list, dropping blanks.
pub(crate) fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
