//! Store double with scripted failures and per-operation call counts

use dashmap::DashMap;
use resilient_cache::cache::{
    CacheError, CacheResult, CacheStore, MemoryCacheStore, MessageHandler, MessageTransport,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// In-memory store that can be told to fail
///
/// Clones share state, so a test can keep a handle after moving one into the cache.
#[derive(Debug, Clone, Default)]
pub struct ScriptedStore {
    inner: MemoryCacheStore,
    failing: Arc<AtomicBool>,
    fail_next: Arc<AtomicUsize>,
    calls: Arc<DashMap<&'static str, usize>>,
}

impl ScriptedStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that fails every operation until told otherwise
    pub fn failing() -> Self {
        let store = Self::new();
        store.set_failing(true);
        store
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Fail the next `count` operations, then recover
    pub fn fail_next(&self, count: usize) {
        self.fail_next.store(count, Ordering::SeqCst);
    }

    /// Times `operation` reached the store
    pub fn calls(&self, operation: &str) -> usize {
        self.calls.get(operation).map(|count| *count).unwrap_or(0)
    }

    /// Every operation that reached the store
    pub fn total_calls(&self) -> usize {
        self.calls.iter().map(|entry| *entry.value()).sum()
    }

    pub fn inner(&self) -> &MemoryCacheStore {
        &self.inner
    }

    fn begin(&self, operation: &'static str) -> CacheResult<()> {
        *self.calls.entry(operation).or_insert(0) += 1;

        let scripted = self
            .fail_next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();

        if scripted || self.failing.load(Ordering::SeqCst) {
            return Err(CacheError::ConnectionError(format!(
                "scripted failure during {operation}"
            )));
        }
        Ok(())
    }
}

impl CacheStore for ScriptedStore {
    fn is_ready(&self) -> bool {
        self.inner.is_ready()
    }

    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        self.begin("get")?;
        self.inner.get(key).await
    }

    async fn set_with_expiry(&self, key: &str, ttl_seconds: u64, value: &str) -> CacheResult<()> {
        self.begin("set")?;
        self.inner.set_with_expiry(key, ttl_seconds, value).await
    }

    async fn set_no_expiry(&self, key: &str, value: &str) -> CacheResult<()> {
        self.begin("set")?;
        self.inner.set_no_expiry(key, value).await
    }

    async fn delete(&self, key: &str) -> CacheResult<u64> {
        self.begin("delete")?;
        self.inner.delete(key).await
    }

    async fn exists(&self, key: &str) -> CacheResult<u64> {
        self.begin("exists")?;
        self.inner.exists(key).await
    }

    async fn expire(&self, key: &str, ttl_seconds: u64) -> CacheResult<bool> {
        self.begin("expire")?;
        self.inner.expire(key, ttl_seconds).await
    }

    async fn ttl(&self, key: &str) -> CacheResult<i64> {
        self.begin("ttl")?;
        self.inner.ttl(key).await
    }

    fn provider_name(&self) -> &'static str {
        "scripted"
    }
}

impl MessageTransport for ScriptedStore {
    async fn publish(&self, channel: &str, message: &str) -> CacheResult<u64> {
        self.begin("publish")?;
        self.inner.publish(channel, message).await
    }

    async fn subscribe(&self, channel: &str, handler: MessageHandler) -> CacheResult<()> {
        self.begin("subscribe")?;
        self.inner.subscribe(channel, handler).await
    }
}
