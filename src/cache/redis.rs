//! Redis-backed cache store.
//!
//! Views are stored as plain string values with a server-side expiry
//! (`SET key value EX ttl`), so every process sharing the instance sees the
//! same entries and the same invalidations.

use std::time::Duration;

use ::redis::AsyncCommands;
use ::redis::aio::MultiplexedConnection;
use async_trait::async_trait;

use super::store::{CacheError, CacheStore};

#[derive(Clone)]
pub struct RedisCacheStore {
    conn: MultiplexedConnection,
}

impl RedisCacheStore {
    /// Connects to `url` (`redis://[:<password>@]<host>:<port>[/<db>]`).
    pub async fn connect(url: &str) -> Result<Self, CacheError> {
        let client = ::redis::Client::open(url)
            .map_err(|err| CacheError::backend(format!("failed to create Redis client: {err}")))?;
        let conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|err| CacheError::backend(format!("failed to connect to Redis: {err}")))?;
        Ok(Self { conn })
    }
}

fn map_redis_error(op: &str, key: &str, err: ::redis::RedisError) -> CacheError {
    CacheError::backend(format!("redis {op} `{key}` failed: {err}"))
}

#[async_trait]
impl CacheStore for RedisCacheStore {
    fn backend(&self) -> &'static str {
        "redis"
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.conn.clone();
        conn.get::<_, Option<String>>(key)
            .await
            .map_err(|err| map_redis_error("GET", key, err))
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        // EX rejects zero; such an entry would be expired on arrival anyway.
        let seconds = ttl.as_secs();
        if seconds == 0 {
            return self.evict(key).await;
        }
        let mut conn = self.conn.clone();
        conn.set_ex::<_, _, ()>(key, value, seconds)
            .await
            .map_err(|err| map_redis_error("SET", key, err))
    }

    async fn evict(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(key)
            .await
            .map_err(|err| map_redis_error("DEL", key, err))
    }
}
