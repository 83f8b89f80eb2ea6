//! Cache-aside orchestration with circuit breaker protection
//!
//! `ResilientCache` owns one configuration snapshot, one key codec, one store
//! handle and one circuit breaker. Every operation consults the same gate
//! (`store.is_ready() && breaker.is_available()`) before touching the store,
//! and every store outcome is fed back into the breaker.
//!
//! While the gate is shut, operations return their "nothing cached" answers
//! instead of errors: reads miss, writes are skipped, `get_ttl` reports `-2`.

use super::codec::KeyCodec;
use super::errors::{CacheError, CacheResult};
use super::provider::CacheProvider;
use super::traits::CacheStore;
use crate::config::CacheConfig;
use crate::logging::log_cache_operation;
use crate::resilience::CircuitBreaker;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use tracing::{debug, warn};

/// Outcome of a guarded cache read
#[derive(Debug)]
enum CacheLookup<V> {
    /// Key present
    Hit(V),
    /// Key absent (or stored JSON null)
    Miss,
    /// Gate shut, store not consulted
    Unavailable,
    /// Store or decode failure on the cache path
    Failed(CacheError),
}

/// Cache-aside layer over a [`CacheStore`]
pub struct ResilientCache<S: CacheStore = CacheProvider> {
    config: CacheConfig,
    codec: KeyCodec,
    store: S,
    circuit_breaker: CircuitBreaker,
}

impl<S: CacheStore + std::fmt::Debug> std::fmt::Debug for ResilientCache<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResilientCache")
            .field("key_prefix", &self.codec.prefix())
            .field("store", &self.store)
            .field("circuit_state", &self.circuit_breaker.state())
            .finish()
    }
}

impl ResilientCache<CacheProvider> {
    /// Build the provider selected by `config` and wrap it
    ///
    /// Never fails: an unreachable or unknown backend degrades to the NoOp provider.
    pub async fn connect(config: CacheConfig) -> Self {
        let store = CacheProvider::from_config_graceful(&config).await;
        log_cache_operation(
            "connect",
            store.provider_name(),
            config.key_prefix.as_str(),
            "initialized",
            None,
        );
        Self::new(config, store)
    }

    /// Replace configuration, provider and breaker wholesale
    ///
    /// Taking `&mut self` means no operation can be in flight meanwhile.
    pub async fn reinitialize(&mut self, config: CacheConfig) {
        let previous = self.store.provider_name();
        *self = Self::connect(config).await;
        log_cache_operation(
            "reinitialize",
            self.store.provider_name(),
            self.codec.prefix(),
            "reinitialized",
            Some(previous),
        );
    }
}

impl<S: CacheStore> ResilientCache<S> {
    /// Wrap an existing store; the breaker starts Closed
    pub fn new(config: CacheConfig, store: S) -> Self {
        let codec = KeyCodec::new(config.key_prefix.clone());
        let circuit_breaker = CircuitBreaker::new(
            format!("cache:{}", store.provider_name()),
            config.circuit_breaker.to_resilience_config(),
        );

        Self {
            config,
            codec,
            store,
            circuit_breaker,
        }
    }

    /// Swap in a new configuration and store with a fresh breaker
    pub fn reconfigure(&mut self, config: CacheConfig, store: S) {
        *self = Self::new(config, store);
    }

    /// Copy of the active configuration
    pub fn config(&self) -> CacheConfig {
        self.config.clone()
    }

    pub fn codec(&self) -> &KeyCodec {
        &self.codec
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn circuit_breaker(&self) -> &CircuitBreaker {
        &self.circuit_breaker
    }

    /// The gate consulted before every operation
    pub fn is_ready(&self) -> bool {
        self.store.is_ready() && self.circuit_breaker.is_available()
    }

    /// Get a value, decoding stored JSON
    pub async fn get(&self, key: &str) -> CacheResult<Option<Value>> {
        self.get_with(key, true).await
    }

    /// Get a value; with `parse_json` false the raw stored string is returned
    pub async fn get_with(&self, key: &str, parse_json: bool) -> CacheResult<Option<Value>> {
        match self.lookup(key).await {
            CacheLookup::Hit(raw) => match KeyCodec::decode(raw, parse_json) {
                Value::Null => Ok(None),
                value => Ok(Some(value)),
            },
            CacheLookup::Miss | CacheLookup::Unavailable => Ok(None),
            CacheLookup::Failed(e) => Err(e),
        }
    }

    /// Get a value deserialized into `T`
    ///
    /// A stored value that does not fit `T` is a `SerializationError`; it does
    /// not count against the breaker.
    pub async fn get_as<T: DeserializeOwned>(&self, key: &str) -> CacheResult<Option<T>> {
        match self.lookup(key).await {
            CacheLookup::Hit(raw) => Self::decode_hit(raw, true),
            CacheLookup::Miss | CacheLookup::Unavailable => Ok(None),
            CacheLookup::Failed(e) => Err(e),
        }
    }

    /// Store a value with the configured default TTL
    pub async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> CacheResult<()> {
        self.set_with_ttl(key, value, None).await
    }

    /// Store a value
    ///
    /// `ttl` of `Some(0)` stores without expiry, `None` uses `default_ttl_seconds`.
    pub async fn set_with_ttl<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        ttl: Option<u64>,
    ) -> CacheResult<()> {
        if !self.is_ready() {
            debug!(key = key, "Cache unavailable, skipping SET");
            return Ok(());
        }

        let encoded = KeyCodec::encode(value)?;
        self.write(key, &encoded, ttl).await
    }

    /// Return the cached value, or compute, cache and return it
    pub async fn get_or_set<T, E, F, Fut>(&self, key: &str, compute: F) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.get_or_set_with(key, None, true, compute).await
    }

    /// Cache-aside read with explicit TTL and decoding
    ///
    /// Cache-path errors are never surfaced: a failing read falls back to
    /// `compute`, and a failing write is logged and dropped. Errors from
    /// `compute` itself propagate unchanged. JSON null results are not cached.
    pub async fn get_or_set_with<T, E, F, Fut>(
        &self,
        key: &str,
        ttl: Option<u64>,
        parse_json: bool,
        compute: F,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let lookup = match self.lookup(key).await {
            CacheLookup::Hit(raw) => match Self::decode_hit::<T>(raw, parse_json) {
                Ok(Some(value)) => CacheLookup::Hit(value),
                Ok(None) => CacheLookup::Miss,
                Err(e) => CacheLookup::Failed(e),
            },
            CacheLookup::Miss => CacheLookup::Miss,
            CacheLookup::Unavailable => CacheLookup::Unavailable,
            CacheLookup::Failed(e) => CacheLookup::Failed(e),
        };

        match lookup {
            CacheLookup::Hit(value) => return Ok(value),
            CacheLookup::Unavailable => return compute().await,
            CacheLookup::Failed(e) => {
                debug!(key = key, error = %e, "Cache read failed, computing value");
            }
            CacheLookup::Miss => {}
        }

        let value = compute().await?;
        self.write_through(key, &value, ttl).await;
        Ok(value)
    }

    /// Delete a key, returning how many keys were removed
    pub async fn delete(&self, key: &str) -> CacheResult<u64> {
        if !self.is_ready() {
            debug!(key = key, "Cache unavailable, skipping DEL");
            return Ok(0);
        }

        let result = self.store.delete(&self.codec.physical_key(key)).await;
        self.track("delete", key, result)
    }

    pub async fn exists(&self, key: &str) -> CacheResult<bool> {
        if !self.is_ready() {
            return Ok(false);
        }

        let result = self.store.exists(&self.codec.physical_key(key)).await;
        self.track("exists", key, result).map(|count| count > 0)
    }

    /// Set a new expiry on an existing key
    pub async fn set_ttl(&self, key: &str, ttl_seconds: u64) -> CacheResult<bool> {
        if !self.is_ready() {
            return Ok(false);
        }

        let result = self
            .store
            .expire(&self.codec.physical_key(key), ttl_seconds)
            .await;
        self.track("set_ttl", key, result)
    }

    /// Remaining TTL in seconds; `-1` without expiry, `-2` missing or unavailable
    pub async fn get_ttl(&self, key: &str) -> CacheResult<i64> {
        if !self.is_ready() {
            return Ok(-2);
        }

        let result = self.store.ttl(&self.codec.physical_key(key)).await;
        self.track("get_ttl", key, result)
    }

    /// Probe the store; `false` while the breaker is open
    pub async fn health_check(&self) -> CacheResult<bool> {
        if !self.circuit_breaker.is_available() {
            return Ok(false);
        }

        let result = self.store.health_check().await;
        self.track("health_check", "", result)
    }

    /// Feed a store outcome into the breaker
    pub(super) fn track<R>(
        &self,
        operation: &'static str,
        key: &str,
        result: CacheResult<R>,
    ) -> CacheResult<R> {
        match &result {
            Ok(_) => self.circuit_breaker.record_success(),
            Err(e) => {
                if e.is_store_error() {
                    self.circuit_breaker.record_failure();
                }
                warn!(
                    operation = operation,
                    key = key,
                    provider = self.store.provider_name(),
                    error = %e,
                    "Cache store operation failed"
                );
            }
        }
        result
    }

    async fn lookup(&self, key: &str) -> CacheLookup<String> {
        if !self.is_ready() {
            debug!(key = key, "Cache unavailable, treating as miss");
            return CacheLookup::Unavailable;
        }

        let result = self.store.get(&self.codec.physical_key(key)).await;
        match self.track("get", key, result) {
            Ok(Some(raw)) => CacheLookup::Hit(raw),
            Ok(None) => CacheLookup::Miss,
            Err(e) => CacheLookup::Failed(e),
        }
    }

    /// Decode a stored string into `T`; stored JSON null reads as a miss
    fn decode_hit<T: DeserializeOwned>(raw: String, parse_json: bool) -> CacheResult<Option<T>> {
        if !parse_json {
            return Ok(Some(serde_json::from_value(Value::String(raw))?));
        }

        if let Ok(value) = serde_json::from_str::<Value>(&raw) {
            if value.is_null() {
                return Ok(None);
            }
            if let Ok(typed) = serde_json::from_value(value) {
                return Ok(Some(typed));
            }
        }

        // Strings are stored verbatim, so "42" may have been the string "42"
        Ok(Some(serde_json::from_value(Value::String(raw))?))
    }

    async fn write(&self, key: &str, encoded: &str, ttl: Option<u64>) -> CacheResult<()> {
        let physical = self.codec.physical_key(key);
        let ttl_seconds = ttl.unwrap_or(self.config.default_ttl_seconds);

        let result = if ttl_seconds == 0 {
            self.store.set_no_expiry(&physical, encoded).await
        } else {
            self.store
                .set_with_expiry(&physical, ttl_seconds, encoded)
                .await
        };
        self.track("set", key, result)
    }

    /// Best-effort write after a compute; failures are logged only
    async fn write_through<T: Serialize>(&self, key: &str, value: &T, ttl: Option<u64>) {
        if !self.is_ready() {
            debug!(key = key, "Cache unavailable, not caching computed value");
            return;
        }

        let encoded = match serde_json::to_value(value) {
            Ok(Value::Null) => return,
            Ok(json) => KeyCodec::encode_value(&json),
            Err(e) => {
                warn!(key = key, error = %e, "Computed value is not serializable, not caching");
                return;
            }
        };

        if let Err(e) = self.write(key, &encoded, ttl).await {
            debug!(key = key, error = %e, "Best-effort cache write dropped");
        }
    }
}
