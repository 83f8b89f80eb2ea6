//! Backing store and transport capability traits
//!
//! These are the only surfaces the resilience layer needs from a key-value
//! store. Keys handed to them are already physical (prefixed) keys and values
//! are already encoded strings.

use super::errors::{CacheError, CacheResult};
use std::future::Future;
use std::sync::Arc;

/// Longest expiry any store accepts, in seconds
///
/// Redis keeps expiry as an `i64` millisecond timestamp, so larger values are
/// rejected with headroom left for the current time.
pub const MAX_TTL_SECONDS: u64 = i64::MAX as u64 / 2_000;

/// Reject a TTL no store can represent
pub(crate) fn check_ttl(command: &str, ttl_seconds: u64) -> CacheResult<()> {
    if ttl_seconds > MAX_TTL_SECONDS {
        return Err(CacheError::InvalidArgument(format!(
            "invalid expire time in '{command}' command: {ttl_seconds}s exceeds {MAX_TTL_SECONDS}s"
        )));
    }
    Ok(())
}

/// Callback registered with a transport, invoked with `(message, channel)`
pub type MessageHandler = Arc<dyn Fn(String, String) + Send + Sync>;

/// Key-value store operations consumed by `ResilientCache`
///
/// Implemented by concrete providers (Redis, in-memory, NoOp).
/// TTL values follow the Redis convention: remaining seconds, `-1` for a key
/// without expiry, `-2` for a missing key.
pub trait CacheStore: Send + Sync {
    /// Whether the underlying connection reports ready
    fn is_ready(&self) -> bool;

    /// Get the raw stored value, `Ok(None)` on miss
    fn get(&self, key: &str) -> impl Future<Output = CacheResult<Option<String>>> + Send;

    /// Store a value that expires after `ttl_seconds`
    fn set_with_expiry(
        &self,
        key: &str,
        ttl_seconds: u64,
        value: &str,
    ) -> impl Future<Output = CacheResult<()>> + Send;

    /// Store a value without expiry
    fn set_no_expiry(
        &self,
        key: &str,
        value: &str,
    ) -> impl Future<Output = CacheResult<()>> + Send;

    /// Delete a key, returning the number of keys removed
    fn delete(&self, key: &str) -> impl Future<Output = CacheResult<u64>> + Send;

    /// Number of the given keys that exist (0 or 1)
    fn exists(&self, key: &str) -> impl Future<Output = CacheResult<u64>> + Send;

    /// Set a new expiry on an existing key; `false` when the key is missing
    fn expire(&self, key: &str, ttl_seconds: u64)
        -> impl Future<Output = CacheResult<bool>> + Send;

    /// Remaining time to live in seconds (`-1` no expiry, `-2` missing)
    fn ttl(&self, key: &str) -> impl Future<Output = CacheResult<i64>> + Send;

    /// Check if the backend answers
    fn health_check(&self) -> impl Future<Output = CacheResult<bool>> + Send {
        let ready = self.is_ready();
        async move { Ok(ready) }
    }

    /// Get the name of the store provider
    fn provider_name(&self) -> &'static str;
}

/// Publish/subscribe operations consumed by the pub/sub facade
///
/// Channel names are passed through literally; they never carry the key prefix.
pub trait MessageTransport: Send + Sync {
    /// Publish an encoded message, returning the number of receivers reached
    fn publish(&self, channel: &str, message: &str)
        -> impl Future<Output = CacheResult<u64>> + Send;

    /// Register a handler for every message arriving on `channel`
    fn subscribe(
        &self,
        channel: &str,
        handler: MessageHandler,
    ) -> impl Future<Output = CacheResult<()>> + Send;
}
