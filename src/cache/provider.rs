//! Cache provider selection
//!
//! Uses enum dispatch for zero-cost abstraction over the concrete stores.
//! `ResilientCache` wraps whichever variant the configuration selects and
//! layers the circuit breaker on top; the provider itself is unprotected.

use super::errors::CacheResult;
use super::providers::{MemoryCacheStore, NoOpCacheStore};
use super::traits::{CacheStore, MessageHandler, MessageTransport};
use crate::config::CacheConfig;
use tracing::{info, warn};

#[cfg(feature = "cache-redis")]
use super::providers::RedisCacheStore;

/// Concrete store chosen from configuration
#[derive(Debug, Clone)]
pub enum CacheProvider {
    /// Redis or Dragonfly (boxed to reduce enum size)
    #[cfg(feature = "cache-redis")]
    Redis(Box<RedisCacheStore>),

    /// In-process store
    Memory(MemoryCacheStore),

    /// Always miss, always succeed
    NoOp(NoOpCacheStore),
}

impl CacheProvider {
    /// Create a provider from configuration with graceful degradation
    ///
    /// If Redis is configured but fails to connect, logs a warning and
    /// returns a NoOp provider instead. Startup never fails because of the cache.
    pub async fn from_config_graceful(config: &CacheConfig) -> Self {
        if !config.enabled {
            info!("Cache disabled by configuration");
            return Self::noop();
        }

        match config.backend.to_lowercase().as_str() {
            // Dragonfly speaks the Redis protocol
            "redis" | "dragonfly" => Self::create_redis_backend(config).await,
            "memory" | "in-memory" => {
                info!(backend = "memory", "In-memory cache provider initialized");
                Self::memory()
            }
            "noop" => Self::noop(),
            other => {
                warn!(backend = other, "Unknown cache backend, falling back to NoOp");
                Self::noop()
            }
        }
    }

    /// Attempt to create a Redis backend, falling back to NoOp on failure
    #[cfg(feature = "cache-redis")]
    async fn create_redis_backend(config: &CacheConfig) -> Self {
        match RedisCacheStore::from_config(&config.redis).await {
            Ok(store) => {
                info!(
                    backend = "redis",
                    "Distributed cache provider initialized successfully"
                );
                Self::Redis(Box::new(store))
            }
            Err(e) => {
                warn!(
                    error = %e,
                    "Failed to connect to Redis, falling back to NoOp cache (graceful degradation)"
                );
                Self::noop()
            }
        }
    }

    /// Fallback when cache-redis feature is not enabled
    #[cfg(not(feature = "cache-redis"))]
    async fn create_redis_backend(_config: &CacheConfig) -> Self {
        warn!("Redis cache backend requested but 'cache-redis' feature not enabled, using NoOp");
        Self::noop()
    }

    /// Create a NoOp provider (for explicit opt-out or testing)
    pub fn noop() -> Self {
        Self::NoOp(NoOpCacheStore::new())
    }

    /// Create a fresh in-process provider
    pub fn memory() -> Self {
        Self::Memory(MemoryCacheStore::new())
    }

    /// Check if caching is actually enabled (not NoOp)
    pub fn is_enabled(&self) -> bool {
        !matches!(self, Self::NoOp(_))
    }

    /// Whether state is shared across processes
    ///
    /// NoOp counts as distributed since it holds no state at all.
    pub fn is_distributed(&self) -> bool {
        match self {
            #[cfg(feature = "cache-redis")]
            Self::Redis(_) => true,
            Self::Memory(_) => false,
            Self::NoOp(_) => true,
        }
    }
}

impl CacheStore for CacheProvider {
    fn is_ready(&self) -> bool {
        match self {
            #[cfg(feature = "cache-redis")]
            Self::Redis(s) => s.is_ready(),
            Self::Memory(s) => s.is_ready(),
            Self::NoOp(s) => s.is_ready(),
        }
    }

    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        match self {
            #[cfg(feature = "cache-redis")]
            Self::Redis(s) => s.get(key).await,
            Self::Memory(s) => s.get(key).await,
            Self::NoOp(s) => s.get(key).await,
        }
    }

    async fn set_with_expiry(&self, key: &str, ttl_seconds: u64, value: &str) -> CacheResult<()> {
        match self {
            #[cfg(feature = "cache-redis")]
            Self::Redis(s) => s.set_with_expiry(key, ttl_seconds, value).await,
            Self::Memory(s) => s.set_with_expiry(key, ttl_seconds, value).await,
            Self::NoOp(s) => s.set_with_expiry(key, ttl_seconds, value).await,
        }
    }

    async fn set_no_expiry(&self, key: &str, value: &str) -> CacheResult<()> {
        match self {
            #[cfg(feature = "cache-redis")]
            Self::Redis(s) => s.set_no_expiry(key, value).await,
            Self::Memory(s) => s.set_no_expiry(key, value).await,
            Self::NoOp(s) => s.set_no_expiry(key, value).await,
        }
    }

    async fn delete(&self, key: &str) -> CacheResult<u64> {
        match self {
            #[cfg(feature = "cache-redis")]
            Self::Redis(s) => s.delete(key).await,
            Self::Memory(s) => s.delete(key).await,
            Self::NoOp(s) => s.delete(key).await,
        }
    }

    async fn exists(&self, key: &str) -> CacheResult<u64> {
        match self {
            #[cfg(feature = "cache-redis")]
            Self::Redis(s) => s.exists(key).await,
            Self::Memory(s) => s.exists(key).await,
            Self::NoOp(s) => s.exists(key).await,
        }
    }

    async fn expire(&self, key: &str, ttl_seconds: u64) -> CacheResult<bool> {
        match self {
            #[cfg(feature = "cache-redis")]
            Self::Redis(s) => s.expire(key, ttl_seconds).await,
            Self::Memory(s) => s.expire(key, ttl_seconds).await,
            Self::NoOp(s) => s.expire(key, ttl_seconds).await,
        }
    }

    async fn ttl(&self, key: &str) -> CacheResult<i64> {
        match self {
            #[cfg(feature = "cache-redis")]
            Self::Redis(s) => s.ttl(key).await,
            Self::Memory(s) => s.ttl(key).await,
            Self::NoOp(s) => s.ttl(key).await,
        }
    }

    async fn health_check(&self) -> CacheResult<bool> {
        match self {
            #[cfg(feature = "cache-redis")]
            Self::Redis(s) => s.health_check().await,
            Self::Memory(s) => s.health_check().await,
            Self::NoOp(s) => s.health_check().await,
        }
    }

    fn provider_name(&self) -> &'static str {
        match self {
            #[cfg(feature = "cache-redis")]
            Self::Redis(s) => s.provider_name(),
            Self::Memory(s) => s.provider_name(),
            Self::NoOp(s) => s.provider_name(),
        }
    }
}

impl MessageTransport for CacheProvider {
    async fn publish(&self, channel: &str, message: &str) -> CacheResult<u64> {
        match self {
            #[cfg(feature = "cache-redis")]
            Self::Redis(s) => s.publish(channel, message).await,
            Self::Memory(s) => s.publish(channel, message).await,
            Self::NoOp(s) => s.publish(channel, message).await,
        }
    }

    async fn subscribe(&self, channel: &str, handler: MessageHandler) -> CacheResult<()> {
        match self {
            #[cfg(feature = "cache-redis")]
            Self::Redis(s) => s.subscribe(channel, handler).await,
            Self::Memory(s) => s.subscribe(channel, handler).await,
            Self::NoOp(s) => s.subscribe(channel, handler).await,
        }
    }
}
