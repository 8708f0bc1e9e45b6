//! Cache storage port and its in-process adapters.
//!
//! Stores hold opaque serialized strings under rendered keys. They know
//! nothing about records or callers; the view cache on top decides what goes in.

use std::sync::RwLock;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use lru::LruCache;
use metrics::counter;
use thiserror::Error;

use super::METRIC_EVICT_TOTAL;
use super::config::CacheConfig;
use super::lock::{rw_read, rw_write};

const SOURCE: &str = "cache::store";

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache backend error: {message}")]
    Backend { message: String },
    #[error("cached value could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),
}

impl CacheError {
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }
}

/// Key/value storage with per-entry expiry.
///
/// Implementations must be safe to share across request tasks. Callers treat
/// every error as a miss, so adapters report failures rather than retrying.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Short backend name used in logs.
    fn backend(&self) -> &'static str;

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError>;

    async fn evict(&self, key: &str) -> Result<(), CacheError>;
}

#[derive(Clone)]
struct Entry {
    value: String,
    /// `None` when the TTL reaches past what `Instant` can represent.
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

/// Process-local LRU store with absolute expiry per entry.
///
/// Expired entries are dropped lazily when read. Entries pushed out by the
/// capacity bound are counted on `todo_api_cache_evict_total`.
pub struct MemoryCacheStore {
    entries: RwLock<LruCache<String, Entry>>,
}

impl MemoryCacheStore {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            entries: RwLock::new(LruCache::new(config.capacity_non_zero())),
        }
    }

    /// Number of entries held, expired ones included.
    pub fn len(&self) -> usize {
        rw_read(&self.entries, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let now = Instant::now();
        let mut entries = rw_write(&self.entries, SOURCE, "get");
        match entries.get(key) {
            Some(entry) if !entry.is_expired(now) => Ok(Some(entry.value.clone())),
            Some(_) => {
                entries.pop(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        let entry = Entry {
            value,
            expires_at: Instant::now().checked_add(ttl),
        };
        let displaced = rw_write(&self.entries, SOURCE, "set").push(key.to_string(), entry);
        // `push` also returns the old pair when the key was already present.
        if displaced.is_some_and(|(displaced_key, _)| displaced_key != key) {
            counter!(METRIC_EVICT_TOTAL).increment(1);
        }
        Ok(())
    }

    async fn evict(&self, key: &str) -> Result<(), CacheError> {
        rw_write(&self.entries, SOURCE, "evict").pop(key);
        Ok(())
    }
}

/// Store used when caching is disabled. Every read misses.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopCacheStore;

#[async_trait]
impl CacheStore for NoopCacheStore {
    fn backend(&self) -> &'static str {
        "disabled"
    }

    async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
        Ok(None)
    }

    async fn set(&self, _key: &str, _value: String, _ttl: Duration) -> Result<(), CacheError> {
        Ok(())
    }

    async fn evict(&self, _key: &str) -> Result<(), CacheError> {
        Ok(())
    }
}
