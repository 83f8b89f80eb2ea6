//! No-op cache provider
//!
//! Always returns None/success. Used when caching is disabled or
//! when Redis is unavailable at startup (graceful degradation).

use crate::cache::errors::CacheResult;
use crate::cache::traits::{CacheStore, MessageHandler, MessageTransport};

/// No-op cache store that never caches anything
///
/// All reads miss, all writes succeed silently, published messages reach nobody.
#[derive(Debug, Clone, Default)]
pub struct NoOpCacheStore;

impl NoOpCacheStore {
    /// Create a new no-op cache store
    pub fn new() -> Self {
        Self
    }
}

impl CacheStore for NoOpCacheStore {
    fn is_ready(&self) -> bool {
        true
    }

    async fn get(&self, _key: &str) -> CacheResult<Option<String>> {
        Ok(None)
    }

    async fn set_with_expiry(&self, _key: &str, _ttl_seconds: u64, _value: &str) -> CacheResult<()> {
        Ok(())
    }

    async fn set_no_expiry(&self, _key: &str, _value: &str) -> CacheResult<()> {
        Ok(())
    }

    async fn delete(&self, _key: &str) -> CacheResult<u64> {
        Ok(0)
    }

    async fn exists(&self, _key: &str) -> CacheResult<u64> {
        Ok(0)
    }

    async fn expire(&self, _key: &str, _ttl_seconds: u64) -> CacheResult<bool> {
        Ok(false)
    }

    async fn ttl(&self, _key: &str) -> CacheResult<i64> {
        Ok(-2)
    }

    fn provider_name(&self) -> &'static str {
        "noop"
    }
}

impl MessageTransport for NoOpCacheStore {
    async fn publish(&self, _channel: &str, _message: &str) -> CacheResult<u64> {
        Ok(0)
    }

    async fn subscribe(&self, _channel: &str, _handler: MessageHandler) -> CacheResult<()> {
        Ok(())
    }
}
