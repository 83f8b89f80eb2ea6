//! ResilientCache against a live Redis (requires `--features test-services`)
//!
//! Reads `REDIS_URL` (default `redis://localhost:6379`) and skips when the
//! server is unreachable.

#![cfg(feature = "test-services")]

use resilient_cache::cache::{CacheStore, ResilientCache};
use resilient_cache::config::CacheConfig;
use serde_json::{json, Value};
use std::convert::Infallible;
use std::sync::{Arc, Mutex};
use std::time::Duration;

async fn redis_cache() -> Option<ResilientCache> {
    let mut config = CacheConfig {
        backend: "redis".to_string(),
        key_prefix: format!("it:{}:", uuid::Uuid::new_v4()),
        default_ttl_seconds: 60,
        ..CacheConfig::default()
    };
    if let Ok(url) = std::env::var("REDIS_URL") {
        config.redis.url = url;
    }

    let cache = ResilientCache::connect(config).await;
    if cache.store().provider_name() != "redis" {
        eprintln!("Skipping Redis test (not available)");
        return None;
    }
    Some(cache)
}

#[tokio::test]
async fn test_cache_aside_against_redis() {
    let Some(cache) = redis_cache().await else { return };

    let first: Result<Value, Infallible> = cache
        .get_or_set("profile", || async { Ok(json!({"name": "ada"})) })
        .await;
    let second: Result<Value, Infallible> = cache
        .get_or_set("profile", || async { Ok(json!({"name": "other"})) })
        .await;
    assert_eq!(first.unwrap(), second.unwrap());

    let ttl = cache.get_ttl("profile").await.unwrap();
    assert!(ttl > 0 && ttl <= 60);
    assert_eq!(cache.delete("profile").await.unwrap(), 1);
    assert_eq!(cache.get_ttl("profile").await.unwrap(), -2);
}

#[tokio::test]
async fn test_pubsub_against_redis() {
    let Some(cache) = redis_cache().await else { return };
    let channel = format!("it:channel:{}", uuid::Uuid::new_v4());

    let received = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&received);
    cache
        .subscribe(&channel, move |value| sink.lock().unwrap().push(value))
        .await
        .unwrap();

    cache.publish(&channel, &json!({"event": "created"})).await.unwrap();

    for _ in 0..20 {
        if !received.lock().unwrap().is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    assert_eq!(*received.lock().unwrap(), vec![json!({"event": "created"})]);
}

#[tokio::test]
async fn test_health_check_against_redis() {
    let Some(cache) = redis_cache().await else { return };
    assert!(cache.health_check().await.unwrap());
}
