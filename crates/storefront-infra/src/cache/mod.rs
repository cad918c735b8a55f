//! Cache implementations - Redis and in-memory fallback.

use std::time::Duration;

mod memory;

pub use memory::InMemoryCache;

#[cfg(feature = "redis")]
mod redis;
#[cfg(feature = "redis")]
pub use self::redis::{RedisCache, RedisConfig};

/// Cache policy for user records.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// How long a cached user may be served. `None` keeps entries until evicted.
    pub user_ttl: Option<Duration>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            user_ttl: Some(Duration::from_secs(300)),
        }
    }
}

impl CacheConfig {
    /// Load from `USER_CACHE_TTL_SECS`; `0` disables expiry.
    pub fn from_env() -> Self {
        match std::env::var("USER_CACHE_TTL_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
        {
            Some(0) => Self { user_ttl: None },
            Some(secs) => Self {
                user_ttl: Some(Duration::from_secs(secs)),
            },
            None => Self::default(),
        }
    }
}
