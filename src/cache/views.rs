//! Typed cache-aside access to task list views.
//!
//! Wraps a [`CacheStore`] with JSON encoding, hit/miss accounting and the
//! rule that a cache failure is only ever a miss.

use std::sync::Arc;

use metrics::counter;
use tracing::{debug, warn};

use crate::domain::todos::TodoItemRecord;

use super::config::{CacheConfig, InvalidationPolicy};
use super::keys::CacheKey;
use super::store::{CacheError, CacheStore, NoopCacheStore};
use super::{METRIC_ERROR_TOTAL, METRIC_HIT_TOTAL, METRIC_INVALIDATE_TOTAL, METRIC_MISS_TOTAL};

const TARGET: &str = "cache::views";

#[derive(Clone)]
pub struct TodoViewCache {
    store: Arc<dyn CacheStore>,
    config: CacheConfig,
}

impl TodoViewCache {
    pub fn new(store: Arc<dyn CacheStore>, config: CacheConfig) -> Self {
        Self { store, config }
    }

    /// A cache that never holds anything.
    pub fn disabled() -> Self {
        Self::new(Arc::new(NoopCacheStore), CacheConfig::default())
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn policy(&self) -> InvalidationPolicy {
        self.config.invalidation
    }

    pub fn backend(&self) -> &'static str {
        self.store.backend()
    }

    /// Returns the cached view, or `None` on a miss or any cache failure.
    pub async fn get(&self, key: &CacheKey) -> Option<Vec<TodoItemRecord>> {
        let rendered = key.render();
        let view = key.view().as_str();

        let raw = match self.store.get(&rendered).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                counter!(METRIC_MISS_TOTAL, "view" => view).increment(1);
                debug!(target = TARGET, key = %rendered, "cache miss");
                return None;
            }
            Err(err) => {
                self.record_failure("get", &rendered, &err);
                counter!(METRIC_MISS_TOTAL, "view" => view).increment(1);
                return None;
            }
        };

        match serde_json::from_str::<Vec<TodoItemRecord>>(&raw) {
            Ok(records) => {
                counter!(METRIC_HIT_TOTAL, "view" => view).increment(1);
                debug!(target = TARGET, key = %rendered, count = records.len(), "cache hit");
                Some(records)
            }
            Err(err) => {
                self.record_failure("decode", &rendered, &CacheError::from(err));
                counter!(METRIC_MISS_TOTAL, "view" => view).increment(1);
                // An undecodable entry would miss on every read until it expires.
                if let Err(err) = self.store.evict(&rendered).await {
                    self.record_failure("evict", &rendered, &err);
                }
                None
            }
        }
    }

    /// Stores `records` under `key` with the configured TTL. Failures are logged.
    pub async fn put(&self, key: &CacheKey, records: &[TodoItemRecord]) {
        let rendered = key.render();
        let encoded = match serde_json::to_string(records) {
            Ok(encoded) => encoded,
            Err(err) => {
                self.record_failure("encode", &rendered, &CacheError::from(err));
                return;
            }
        };

        if let Err(err) = self.store.set(&rendered, encoded, self.config.ttl).await {
            self.record_failure("set", &rendered, &err);
        }
    }

    /// Drops `key` regardless of policy. Failures are logged.
    pub async fn invalidate(&self, key: &CacheKey) {
        let rendered = key.render();
        match self.store.evict(&rendered).await {
            Ok(()) => {
                counter!(METRIC_INVALIDATE_TOTAL, "view" => key.view().as_str()).increment(1);
                debug!(target = TARGET, key = %rendered, "cache entry invalidated");
            }
            Err(err) => self.record_failure("evict", &rendered, &err),
        }
    }

    fn record_failure(&self, op: &'static str, key: &str, err: &CacheError) {
        counter!(METRIC_ERROR_TOTAL, "op" => op).increment(1);
        warn!(
            target = TARGET,
            op,
            key,
            backend = self.store.backend(),
            error = %err,
            "cache operation failed; continuing without cache"
        );
    }
}
