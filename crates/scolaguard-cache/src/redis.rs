//! Redis cache client.
//!
//! Values are stored as JSON. Read errors degrade to a miss so a Redis outage
//! falls back to the backing store instead of failing the request.

use redis::{AsyncCommands, Client, aio::ConnectionManager};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, instrument};

/// Redis cache client with a managed, reconnecting connection.
#[derive(Clone)]
pub struct RedisCache {
    conn: ConnectionManager,
    default_ttl: Duration,
}

impl std::fmt::Debug for RedisCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisCache")
            .field("default_ttl", &self.default_ttl)
            .finish_non_exhaustive()
    }
}

/// Failure talking to Redis or encoding a cached value.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Redis connection error: {0}")]
    Connection(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl RedisCache {
    /// Connects to Redis and returns a cache handle.
    ///
    /// # Arguments
    ///
    /// * `redis_url` - Connection URL, e.g. "redis://localhost:6379"
    /// * `default_ttl` - Lifetime of every entry written with [`Self::set`]
    ///
    /// # Errors
    ///
    /// Returns `CacheError::Connection` if the URL is invalid or Redis is unreachable.
    pub async fn new(redis_url: &str, default_ttl: Duration) -> Result<Self, CacheError> {
        let client = Client::open(redis_url)?;
        let conn = ConnectionManager::new(client).await?;

        Ok(Self { conn, default_ttl })
    }

    /// Reads the JSON value cached under `key`.
    ///
    /// Returns `None` on a miss, a Redis error or an undecodable value.
    #[instrument(skip(self), fields(cache.operation = "GET"))]
    pub async fn get<T>(&self, key: &str) -> Option<T>
    where
        T: for<'de> Deserialize<'de>,
    {
        let mut conn = self.conn.clone();

        let raw = match conn.get::<_, Option<String>>(key).await {
            Ok(raw) => raw,
            Err(e) => {
                error!(cache.key = %key, error = %e, "Redis GET error");
                return None;
            }
        };
        let Some(raw) = raw else {
            debug!(cache.key = %key, "Cache miss");
            return None;
        };

        serde_json::from_str(&raw)
            .map_err(|e| error!(cache.key = %key, error = %e, "Dropping undecodable cache entry"))
            .ok()
    }

    /// Stores `value` as JSON under `key` for the default TTL.
    ///
    /// TTLs below one second are rounded up to one second.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::Serialization` if `value` cannot be encoded and
    /// `CacheError::Connection` if the write fails.
    #[instrument(skip(self, value), fields(cache.operation = "SETEX"))]
    pub async fn set<T>(&self, key: &str, value: &T) -> Result<(), CacheError>
    where
        T: Serialize,
    {
        let mut conn = self.conn.clone();
        let json = serde_json::to_string(value)?;
        let ttl = self.default_ttl.as_secs().max(1);

        conn.set_ex::<_, _, ()>(key, json, ttl).await?;
        debug!(cache.key = %key, cache.ttl_secs = ttl, "Cache set");
        Ok(())
    }

    /// Deletes every key matching `pattern` and returns how many were removed.
    ///
    /// # Warning
    ///
    /// Walks the keyspace with SCAN in batches of 100, so it does not block
    /// Redis but takes longer the more keys exist.
    #[instrument(skip(self), fields(cache.operation = "SCAN_DEL"))]
    pub async fn invalidate_pattern(&self, pattern: &str) -> Result<u64, CacheError> {
        let mut conn = self.conn.clone();
        let mut cursor: u64 = 0;
        let mut deleted: u64 = 0;

        loop {
            let (next_cursor, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(100)
                .query_async(&mut conn)
                .await?;

            if !keys.is_empty() {
                let count: u64 = conn.del(&keys).await?;
                deleted += count;
            }

            cursor = next_cursor;
            if cursor == 0 {
                break;
            }
        }

        debug!(cache.pattern = %pattern, cache.deleted = %deleted, "Pattern invalidation complete");

        Ok(deleted)
    }
}
