//! # Scolaguard Cache
//!
//! Redis-based caching for module rows.
//!
//! - [`RedisCache`]: connection-managed client with JSON values
//! - [`CacheConfig`]: settings loaded from the environment
//! - [`keys`]: cache key layout for module lookups
//!
//! # Example
//!
//! ```ignore
//! use scolaguard_cache::{CacheConfig, RedisCache, keys};
//!
//! if let Some(config) = CacheConfig::from_env() {
//!     let cache = RedisCache::new(&config.redis_url, config.default_ttl()).await?;
//!     let module: Option<Module> = cache.get(&keys::modules::by_type(tenant, level, module_type)).await;
//! }
//! ```

pub mod config;
pub mod keys;
pub mod redis;

pub use config::CacheConfig;
pub use redis::{CacheError, RedisCache};
