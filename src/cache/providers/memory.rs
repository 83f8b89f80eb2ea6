//! In-process cache provider
//!
//! `DashMap`-backed store with Redis-compatible TTL semantics and synchronous
//! in-process pub/sub. Suited to single-instance deployments and tests; state
//! is not shared across processes.
//!
//! Expired entries are dropped lazily when they are next touched.

use crate::cache::errors::{CacheError, CacheResult};
use crate::cache::traits::{check_ttl, CacheStore, MessageHandler, MessageTransport};
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

#[derive(Debug, Clone)]
struct MemoryEntry {
    value: String,
    expires_at: Option<Instant>,
}

impl MemoryEntry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// In-memory cache store
///
/// Cloning shares the underlying map, subscribers and readiness flag.
#[derive(Clone, Default)]
pub struct MemoryCacheStore {
    entries: Arc<DashMap<String, MemoryEntry>>,
    subscribers: Arc<DashMap<String, Vec<MessageHandler>>>,
    not_ready: Arc<AtomicBool>,
}

impl std::fmt::Debug for MemoryCacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCacheStore")
            .field("entries", &self.entries.len())
            .field("channels", &self.subscribers.len())
            .field("ready", &self.is_ready())
            .finish()
    }
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate the connection going away or coming back
    pub fn set_ready(&self, ready: bool) {
        self.not_ready.store(!ready, Ordering::Release);
    }

    /// Number of live (unexpired) entries
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .iter()
            .filter(|entry| !entry.is_expired(now))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Raw stored string for a physical key
    pub fn raw(&self, key: &str) -> Option<String> {
        self.live_entry(key).map(|entry| entry.value)
    }

    fn live_entry(&self, key: &str) -> Option<MemoryEntry> {
        let now = Instant::now();
        let entry = self.entries.get(key).map(|e| e.value().clone())?;
        if entry.is_expired(now) {
            self.entries.remove_if(key, |_, e| e.is_expired(now));
            return None;
        }
        Some(entry)
    }

    fn insert(&self, key: &str, value: &str, expires_at: Option<Instant>) {
        self.entries.insert(
            key.to_string(),
            MemoryEntry {
                value: value.to_string(),
                expires_at,
            },
        );
    }
}

/// Deadline `ttl_seconds` from now, rejecting values the clock cannot hold
fn expiry_deadline(command: &str, ttl_seconds: u64) -> CacheResult<Instant> {
    check_ttl(command, ttl_seconds)?;
    Instant::now()
        .checked_add(Duration::from_secs(ttl_seconds))
        .ok_or_else(|| {
            CacheError::InvalidArgument(format!("invalid expire time in '{command}' command"))
        })
}

impl CacheStore for MemoryCacheStore {
    fn is_ready(&self) -> bool {
        !self.not_ready.load(Ordering::Acquire)
    }

    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let result = self.live_entry(key).map(|entry| entry.value);

        if result.is_some() {
            debug!(key = key, "Cache HIT");
        } else {
            debug!(key = key, "Cache MISS");
        }

        Ok(result)
    }

    async fn set_with_expiry(&self, key: &str, ttl_seconds: u64, value: &str) -> CacheResult<()> {
        if ttl_seconds == 0 {
            return Err(CacheError::BackendError(
                "invalid expire time in 'setex' command".to_string(),
            ));
        }

        let expires_at = expiry_deadline("setex", ttl_seconds)?;
        self.insert(key, value, Some(expires_at));
        debug!(key = key, ttl_seconds = ttl_seconds, "Cache SET");
        Ok(())
    }

    async fn set_no_expiry(&self, key: &str, value: &str) -> CacheResult<()> {
        self.insert(key, value, None);
        debug!(key = key, "Cache SET (no expiry)");
        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<u64> {
        let existed = self.live_entry(key).is_some();
        self.entries.remove(key);
        debug!(key = key, "Cache DEL");
        Ok(u64::from(existed))
    }

    async fn exists(&self, key: &str) -> CacheResult<u64> {
        Ok(u64::from(self.live_entry(key).is_some()))
    }

    async fn expire(&self, key: &str, ttl_seconds: u64) -> CacheResult<bool> {
        if self.live_entry(key).is_none() {
            return Ok(false);
        }

        // Like Redis, a non-positive expiry deletes the key
        if ttl_seconds == 0 {
            self.entries.remove(key);
            return Ok(true);
        }

        let expires_at = expiry_deadline("expire", ttl_seconds)?;
        Ok(match self.entries.get_mut(key) {
            Some(mut entry) => {
                entry.expires_at = Some(expires_at);
                true
            }
            None => false,
        })
    }

    async fn ttl(&self, key: &str) -> CacheResult<i64> {
        let Some(entry) = self.live_entry(key) else {
            return Ok(-2);
        };

        Ok(match entry.expires_at {
            None => -1,
            Some(at) => {
                let remaining = at.saturating_duration_since(Instant::now());
                // Round up so a fresh key reports its full TTL, never more
                remaining.as_millis().div_ceil(1000) as i64
            }
        })
    }

    fn provider_name(&self) -> &'static str {
        "memory"
    }
}

impl MessageTransport for MemoryCacheStore {
    async fn publish(&self, channel: &str, message: &str) -> CacheResult<u64> {
        // Clone handlers out so none runs while the map shard is locked
        let handlers = self
            .subscribers
            .get(channel)
            .map(|handlers| handlers.value().clone())
            .unwrap_or_default();

        for handler in &handlers {
            handler(message.to_string(), channel.to_string());
        }

        debug!(channel = channel, receivers = handlers.len(), "PUBLISH");
        Ok(handlers.len() as u64)
    }

    async fn subscribe(&self, channel: &str, handler: MessageHandler) -> CacheResult<()> {
        self.subscribers
            .entry(channel.to_string())
            .or_default()
            .push(handler);
        debug!(channel = channel, "SUBSCRIBE");
        Ok(())
    }
}
