//! Cache layer for task list views.
//!
//! Reads follow a cache-aside pattern: the service asks [`TodoViewCache`] for
//! a caller's view, falls back to the store on a miss and fills the cache with
//! the result. Entries expire after a TTL and, under the default
//! [`InvalidationPolicy::OnWrite`], are also evicted by successful writes.
//!
//! ## Configuration
//!
//! ```toml
//! [cache]
//! enabled = true
//! backend = "memory"      # or "redis" with the `redis` feature
//! ttl_seconds = 600
//! capacity = 1024
//! invalidation = "on_write"
//! ```

mod config;
mod keys;
mod lock;
#[cfg(feature = "redis")]
mod redis;
mod store;
mod views;

pub use config::{CacheBackend, CacheConfig, InvalidationPolicy};
pub use keys::{CacheKey, CacheView};
#[cfg(feature = "redis")]
pub use self::redis::RedisCacheStore;
pub use store::{CacheError, CacheStore, MemoryCacheStore, NoopCacheStore};
pub use views::TodoViewCache;

pub const METRIC_HIT_TOTAL: &str = "todo_api_cache_hit_total";
pub const METRIC_MISS_TOTAL: &str = "todo_api_cache_miss_total";
pub const METRIC_EVICT_TOTAL: &str = "todo_api_cache_evict_total";
pub const METRIC_INVALIDATE_TOTAL: &str = "todo_api_cache_invalidate_total";
pub const METRIC_ERROR_TOTAL: &str = "todo_api_cache_error_total";
