//! Shared helpers for integration tests

#![allow(dead_code)]

pub mod scripted_store;

pub use scripted_store::ScriptedStore;

use resilient_cache::config::{CacheConfig, CircuitBreakerSettings};

/// Configuration used across integration tests: `app:` prefix, 60s default TTL
pub fn test_config() -> CacheConfig {
    CacheConfig {
        backend: "memory".to_string(),
        key_prefix: "app:".to_string(),
        default_ttl_seconds: 60,
        circuit_breaker: CircuitBreakerSettings {
            failure_threshold: 3,
            recovery_timeout_ms: 30_000,
        },
        ..CacheConfig::default()
    }
}
