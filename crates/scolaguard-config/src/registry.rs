//! Module registry configuration.
//!
//! # Environment Variables
//!
//! - `MODULE_BOOTSTRAP_ENABLED`: allow a dependency check to pass for a
//!   tenant/level that has no module rows yet (default: true)
//! - `MODULE_CACHE_TTL_SECONDS`: TTL of cached module rows when Redis is configured (default: 60)
//! - `REQUEST_BODY_LIMIT_BYTES`: largest body the guard buffers for scope checks (default: 1 MiB)

use std::env;

use crate::parse_flag;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegistryConfig {
    pub bootstrap_enabled: bool,
    pub cache_ttl_seconds: u64,
    pub body_limit_bytes: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            bootstrap_enabled: true,
            cache_ttl_seconds: 60,
            body_limit_bytes: 1024 * 1024,
        }
    }
}

impl RegistryConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            bootstrap_enabled: env::var("MODULE_BOOTSTRAP_ENABLED")
                .map(|v| parse_flag(&v))
                .unwrap_or(defaults.bootstrap_enabled),
            cache_ttl_seconds: env::var("MODULE_CACHE_TTL_SECONDS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.cache_ttl_seconds),
            body_limit_bytes: env::var("REQUEST_BODY_LIMIT_BYTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.body_limit_bytes),
        }
    }

    /// Same settings with the bootstrap exception switched off.
    pub fn strict(self) -> Self {
        Self {
            bootstrap_enabled: false,
            ..self
        }
    }
}
