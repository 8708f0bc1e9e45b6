//! Cache configuration.
//!
//! Controls which backend holds the list views, how long entries live and
//! whether writes evict the affected views.

use std::fmt::{Display, Formatter};
use std::num::NonZeroUsize;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_TTL: Duration = Duration::from_secs(600);
pub const DEFAULT_CAPACITY: usize = 1024;

/// Where cached views are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheBackend {
    /// Process-local LRU. Entries are lost on restart and not shared.
    #[default]
    Memory,
    /// Shared Redis instance. Requires the `redis` cargo feature.
    Redis,
}

impl CacheBackend {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Redis => "redis",
        }
    }
}

impl FromStr for CacheBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "redis" => Ok(Self::Redis),
            other => Err(format!("unknown cache backend `{other}`")),
        }
    }
}

impl Display for CacheBackend {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// When cached list views are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InvalidationPolicy {
    /// Successful writes evict the views they affect.
    #[default]
    OnWrite,
    /// Views live until their TTL runs out, even across writes.
    TtlOnly,
}

impl InvalidationPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OnWrite => "on_write",
            Self::TtlOnly => "ttl_only",
        }
    }

    pub fn evicts_on_write(self) -> bool {
        matches!(self, Self::OnWrite)
    }
}

impl FromStr for InvalidationPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "on_write" => Ok(Self::OnWrite),
            "ttl_only" => Ok(Self::TtlOnly),
            other => Err(format!("unknown invalidation policy `{other}`")),
        }
    }
}

impl Display for InvalidationPolicy {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Runtime cache parameters handed to the list-view cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Expiry applied to every stored view.
    pub ttl: Duration,
    /// Maximum entries held by the in-memory backend.
    pub capacity: usize,
    pub invalidation: InvalidationPolicy,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_TTL,
            capacity: DEFAULT_CAPACITY,
            invalidation: InvalidationPolicy::default(),
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            ttl: settings.ttl,
            capacity: settings.capacity.get(),
            invalidation: settings.invalidation,
        }
    }
}

impl CacheConfig {
    /// Returns the capacity as NonZeroUsize, clamping to 1 if zero.
    pub fn capacity_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.capacity).unwrap_or(NonZeroUsize::MIN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let config = CacheConfig::default();
        assert_eq!(config.ttl, Duration::from_secs(600));
        assert_eq!(config.capacity, 1024);
        assert_eq!(config.invalidation, InvalidationPolicy::OnWrite);
    }

    #[test]
    fn non_zero_clamps_to_min() {
        let config = CacheConfig {
            capacity: 0,
            ..Default::default()
        };
        assert_eq!(config.capacity_non_zero().get(), 1);
    }

    #[test]
    fn parses_policy_spellings() {
        assert_eq!("on_write".parse(), Ok(InvalidationPolicy::OnWrite));
        assert_eq!("TTL-only".parse(), Ok(InvalidationPolicy::TtlOnly));
        assert!("never".parse::<InvalidationPolicy>().is_err());
    }

    #[test]
    fn parses_backend_names() {
        assert_eq!("Redis".parse(), Ok(CacheBackend::Redis));
        assert_eq!(" memory ".parse(), Ok(CacheBackend::Memory));
        assert!("memcached".parse::<CacheBackend>().is_err());
    }
}
