//! Redis cache configuration.

use std::env;
use std::time::Duration;

/// Redis cache configuration loaded from environment variables.
///
/// # Environment Variables
///
/// - `REDIS_URL`: Redis connection URL. Caching is off when unset.
/// - `MODULE_CACHE_TTL_SECONDS`: TTL for cached module rows (default: `60`)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheConfig {
    pub redis_url: String,
    pub default_ttl_seconds: u64,
}

impl CacheConfig {
    /// `None` when `REDIS_URL` is not set.
    pub fn from_env() -> Option<Self> {
        let redis_url = env::var("REDIS_URL").ok().filter(|url| !url.trim().is_empty())?;

        Some(Self {
            redis_url,
            default_ttl_seconds: env::var("MODULE_CACHE_TTL_SECONDS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(60),
        })
    }

    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl_seconds)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            redis_url: "redis://127.0.0.1:6379".into(),
            default_ttl_seconds: 60,
        }
    }
}
