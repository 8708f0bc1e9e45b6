//! Construction of the list-view cache from settings.

use std::sync::Arc;

use tracing::info;

use crate::cache::{
    CacheBackend, CacheConfig, CacheStore, MemoryCacheStore, NoopCacheStore, TodoViewCache,
};
use crate::config::CacheSettings;

use super::error::InfraError;

pub async fn build_view_cache(settings: &CacheSettings) -> Result<TodoViewCache, InfraError> {
    let config = CacheConfig::from(settings);

    let store: Arc<dyn CacheStore> = if !settings.enabled {
        Arc::new(NoopCacheStore)
    } else {
        match settings.backend {
            CacheBackend::Memory => Arc::new(MemoryCacheStore::new(&config)),
            CacheBackend::Redis => connect_redis(settings).await?,
        }
    };

    info!(
        target = "infra::cache::build_view_cache",
        backend = store.backend(),
        ttl_seconds = config.ttl.as_secs(),
        invalidation = config.invalidation.as_str(),
        "list-view cache ready"
    );

    Ok(TodoViewCache::new(store, config))
}

#[cfg(feature = "redis")]
async fn connect_redis(settings: &CacheSettings) -> Result<Arc<dyn CacheStore>, InfraError> {
    let url = settings
        .redis_url
        .as_deref()
        .ok_or_else(|| InfraError::configuration("cache.redis_url is required for redis"))?;
    let store = crate::cache::RedisCacheStore::connect(url)
        .await
        .map_err(|err| InfraError::configuration(err.to_string()))?;
    Ok(Arc::new(store))
}

#[cfg(not(feature = "redis"))]
async fn connect_redis(_settings: &CacheSettings) -> Result<Arc<dyn CacheStore>, InfraError> {
    Err(InfraError::configuration(
        "cache.backend = \"redis\" requires building with the `redis` feature",
    ))
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroUsize;
    use std::time::Duration;

    use super::*;
    use crate::cache::InvalidationPolicy;

    fn settings(enabled: bool) -> CacheSettings {
        CacheSettings {
            enabled,
            backend: CacheBackend::Memory,
            redis_url: None,
            ttl: Duration::from_secs(30),
            capacity: NonZeroUsize::new(8).expect("non-zero"),
            invalidation: InvalidationPolicy::TtlOnly,
        }
    }

    #[tokio::test]
    async fn disabled_cache_uses_noop_store() {
        let cache = build_view_cache(&settings(false)).await.expect("cache");
        assert_eq!(cache.backend(), "disabled");
    }

    #[tokio::test]
    async fn memory_backend_carries_settings() {
        let cache = build_view_cache(&settings(true)).await.expect("cache");
        assert_eq!(cache.backend(), "memory");
        assert_eq!(cache.config().ttl, Duration::from_secs(30));
        assert_eq!(cache.policy(), InvalidationPolicy::TtlOnly);
    }
}
