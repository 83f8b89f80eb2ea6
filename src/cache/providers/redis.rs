//! Redis cache provider
//!
//! Uses `redis::aio::ConnectionManager` for async multiplexed connections with
//! automatic reconnection. Subscriptions use a dedicated pub/sub connection per
//! channel, drained by a spawned task. Requires the `cache-redis` feature flag.

use crate::cache::errors::{CacheError, CacheResult};
use crate::cache::traits::{check_ttl, CacheStore, MessageHandler, MessageTransport};
use crate::config::{redact_url, RedisConfig};
use futures::StreamExt;
use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use redis::IntoConnectionInfo;
use tracing::{debug, warn};

/// Redis-backed cache store using ConnectionManager
#[derive(Clone)]
pub struct RedisCacheStore {
    client: redis::Client,
    connection_manager: ConnectionManager,
}

impl std::fmt::Debug for RedisCacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisCacheStore")
            .field("connection_manager", &"ConnectionManager")
            .finish()
    }
}

impl RedisCacheStore {
    /// Create a new Redis cache store from configuration
    pub async fn from_config(config: &RedisConfig) -> CacheResult<Self> {
        let mut connection_info = config.url.as_str().into_connection_info().map_err(|e| {
            CacheError::ConnectionError(format!("Invalid Redis URL: {}", e))
        })?;
        if let Some(database) = config.database {
            connection_info.redis.db = database;
        }

        let client = redis::Client::open(connection_info).map_err(|e| {
            CacheError::ConnectionError(format!("Failed to create Redis client: {}", e))
        })?;

        let manager_config = ConnectionManagerConfig::new()
            .set_connection_timeout(config.connection_timeout())
            .set_response_timeout(config.response_timeout());

        let connection_manager = ConnectionManager::new_with_config(client.clone(), manager_config)
            .await
            .map_err(|e| {
                CacheError::ConnectionError(format!("Failed to connect to Redis: {}", e))
            })?;

        debug!(url = %redact_url(&config.url), "Redis cache store connected");

        Ok(Self {
            client,
            connection_manager,
        })
    }
}

impl CacheStore for RedisCacheStore {
    fn is_ready(&self) -> bool {
        // ConnectionManager reconnects on its own; failures surface per command
        true
    }

    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let mut conn = self.connection_manager.clone();
        let result: Option<String> = redis::cmd("GET")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(|e| CacheError::from(e).context("Redis GET failed"))?;

        if result.is_some() {
            debug!(key = key, "Cache HIT");
        } else {
            debug!(key = key, "Cache MISS");
        }

        Ok(result)
    }

    async fn set_with_expiry(&self, key: &str, ttl_seconds: u64, value: &str) -> CacheResult<()> {
        check_ttl("setex", ttl_seconds)?;
        let mut conn = self.connection_manager.clone();

        redis::cmd("SETEX")
            .arg(key)
            .arg(ttl_seconds)
            .arg(value)
            .query_async::<()>(&mut conn)
            .await
            .map_err(|e| CacheError::from(e).context("Redis SETEX failed"))?;

        debug!(key = key, ttl_seconds = ttl_seconds, "Cache SET");
        Ok(())
    }

    async fn set_no_expiry(&self, key: &str, value: &str) -> CacheResult<()> {
        let mut conn = self.connection_manager.clone();

        redis::cmd("SET")
            .arg(key)
            .arg(value)
            .query_async::<()>(&mut conn)
            .await
            .map_err(|e| CacheError::from(e).context("Redis SET failed"))?;

        debug!(key = key, "Cache SET (no expiry)");
        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<u64> {
        let mut conn = self.connection_manager.clone();

        let removed: u64 = redis::cmd("DEL")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(|e| CacheError::from(e).context("Redis DEL failed"))?;

        debug!(key = key, removed = removed, "Cache DEL");
        Ok(removed)
    }

    async fn exists(&self, key: &str) -> CacheResult<u64> {
        let mut conn = self.connection_manager.clone();

        redis::cmd("EXISTS")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(|e| CacheError::from(e).context("Redis EXISTS failed"))
    }

    async fn expire(&self, key: &str, ttl_seconds: u64) -> CacheResult<bool> {
        check_ttl("expire", ttl_seconds)?;
        let mut conn = self.connection_manager.clone();

        let updated: i64 = redis::cmd("EXPIRE")
            .arg(key)
            .arg(ttl_seconds)
            .query_async(&mut conn)
            .await
            .map_err(|e| CacheError::from(e).context("Redis EXPIRE failed"))?;

        Ok(updated == 1)
    }

    async fn ttl(&self, key: &str) -> CacheResult<i64> {
        let mut conn = self.connection_manager.clone();

        redis::cmd("TTL")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(|e| CacheError::from(e).context("Redis TTL failed"))
    }

    async fn health_check(&self) -> CacheResult<bool> {
        let mut conn = self.connection_manager.clone();
        let pong: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| CacheError::from(e).context("Redis PING failed"))?;

        Ok(pong == "PONG")
    }

    fn provider_name(&self) -> &'static str {
        "redis"
    }
}

impl MessageTransport for RedisCacheStore {
    async fn publish(&self, channel: &str, message: &str) -> CacheResult<u64> {
        let mut conn = self.connection_manager.clone();

        let receivers: u64 = redis::cmd("PUBLISH")
            .arg(channel)
            .arg(message)
            .query_async(&mut conn)
            .await
            .map_err(|e| CacheError::from(e).context("Redis PUBLISH failed"))?;

        debug!(channel = channel, receivers = receivers, "PUBLISH");
        Ok(receivers)
    }

    async fn subscribe(&self, channel: &str, handler: MessageHandler) -> CacheResult<()> {
        let mut pubsub = self
            .client
            .get_async_pubsub()
            .await
            .map_err(|e| CacheError::from(e).context("Redis pub/sub connection failed"))?;

        pubsub
            .subscribe(channel)
            .await
            .map_err(|e| CacheError::from(e).context("Redis SUBSCRIBE failed"))?;

        debug!(channel = channel, "SUBSCRIBE");

        let subscribed = channel.to_string();
        tokio::spawn(async move {
            let mut messages = pubsub.into_on_message();
            while let Some(msg) = messages.next().await {
                let channel = msg.get_channel_name().to_string();
                match msg.get_payload::<String>() {
                    Ok(payload) => handler(payload, channel),
                    Err(e) => warn!(channel = %channel, error = %e, "Dropping undecodable message"),
                }
            }
            debug!(channel = %subscribed, "Subscription stream closed");
        });

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_invalid_url_is_connection_error() {
        let config = RedisConfig {
            url: "not-a-redis-url".to_string(),
            ..RedisConfig::default()
        };
        let err = RedisCacheStore::from_config(&config).await.unwrap_err();
        assert!(matches!(err, CacheError::ConnectionError(_)));
    }

    #[test]
    fn test_oversized_ttl_rejected_before_command() {
        let err = check_ttl("setex", u64::MAX).unwrap_err();
        assert!(matches!(err, CacheError::InvalidArgument(_)));
        assert!(check_ttl("expire", crate::cache::MAX_TTL_SECONDS).is_ok());
    }

    // Integration tests require a running Redis instance (behind test-services feature)
    #[cfg(feature = "test-services")]
    mod integration {
        use super::*;
        use std::sync::Arc;
        use std::time::Duration;

        fn test_redis_config() -> RedisConfig {
            RedisConfig {
                url: std::env::var("REDIS_URL")
                    .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
                ..RedisConfig::default()
            }
        }

        async fn connect() -> Option<RedisCacheStore> {
            match RedisCacheStore::from_config(&test_redis_config()).await {
                Ok(store) => Some(store),
                Err(e) => {
                    warn!("Skipping Redis test (not available): {}", e);
                    None
                }
            }
        }

        #[tokio::test]
        async fn test_redis_crud_operations() {
            let Some(store) = connect().await else { return };

            let key = format!("test:crud:{}", uuid::Uuid::new_v4());
            let value = r#"{"name":"test","version":"1.0"}"#;

            store.set_with_expiry(&key, 60, value).await.unwrap();
            assert_eq!(store.get(&key).await.unwrap(), Some(value.to_string()));
            assert_eq!(store.exists(&key).await.unwrap(), 1);

            assert_eq!(store.delete(&key).await.unwrap(), 1);
            assert_eq!(store.get(&key).await.unwrap(), None);
        }

        #[tokio::test]
        async fn test_redis_ttl_conventions() {
            let Some(store) = connect().await else { return };

            let key = format!("test:ttl:{}", uuid::Uuid::new_v4());
            assert_eq!(store.ttl(&key).await.unwrap(), -2);

            store.set_no_expiry(&key, "v").await.unwrap();
            assert_eq!(store.ttl(&key).await.unwrap(), -1);

            assert!(store.expire(&key, 30).await.unwrap());
            let ttl = store.ttl(&key).await.unwrap();
            assert!(ttl > 0 && ttl <= 30);

            store.delete(&key).await.unwrap();
        }

        #[tokio::test]
        async fn test_redis_ttl_expiry() {
            let Some(store) = connect().await else { return };

            let key = format!("test:expiry:{}", uuid::Uuid::new_v4());
            store.set_with_expiry(&key, 1, "temporary").await.unwrap();
            assert!(store.get(&key).await.unwrap().is_some());

            tokio::time::sleep(Duration::from_millis(1500)).await;
            assert!(store.get(&key).await.unwrap().is_none());
        }

        #[tokio::test]
        async fn test_redis_pubsub_roundtrip() {
            let Some(store) = connect().await else { return };

            let channel = format!("test:channel:{}", uuid::Uuid::new_v4());
            let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
            store
                .subscribe(
                    &channel,
                    Arc::new(move |message: String, _channel: String| {
                        let _ = tx.send(message);
                    }),
                )
                .await
                .unwrap();

            assert_eq!(store.publish(&channel, "ping").await.unwrap(), 1);
            let received = tokio::time::timeout(Duration::from_secs(2), rx.recv())
                .await
                .unwrap();
            assert_eq!(received.as_deref(), Some("ping"));
        }

        #[tokio::test]
        async fn test_redis_health_check() {
            let Some(store) = connect().await else { return };
            assert!(store.health_check().await.unwrap());
        }
    }
}
