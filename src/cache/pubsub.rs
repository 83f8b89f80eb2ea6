//! Publish/subscribe through the resilient cache
//!
//! Shares the cache's availability gate, breaker and value encoding. Channel
//! names are never prefixed.

use super::codec::KeyCodec;
use super::errors::CacheResult;
use super::resilient::ResilientCache;
use super::traits::{CacheStore, MessageHandler, MessageTransport};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

impl<S: CacheStore + MessageTransport> ResilientCache<S> {
    /// Publish a message; skipped silently while the cache is unavailable
    pub async fn publish<T: Serialize + ?Sized>(&self, channel: &str, message: &T) -> CacheResult<()> {
        if !self.is_ready() {
            debug!(channel = channel, "Cache unavailable, skipping PUBLISH");
            return Ok(());
        }

        let encoded = KeyCodec::encode(message)?;
        let result = self.store().publish(channel, &encoded).await;
        self.track("publish", channel, result)?;
        Ok(())
    }

    /// Register `callback` for messages on `channel`
    ///
    /// Each message is decoded as JSON when it parses, otherwise handed over as
    /// a string. Registration is skipped while the cache is unavailable and is
    /// not retried later.
    pub async fn subscribe<F>(&self, channel: &str, callback: F) -> CacheResult<()>
    where
        F: Fn(Value) + Send + Sync + 'static,
    {
        if !self.is_ready() {
            debug!(channel = channel, "Cache unavailable, skipping SUBSCRIBE");
            return Ok(());
        }

        let handler: MessageHandler = Arc::new(move |message: String, _channel: String| {
            callback(KeyCodec::decode(message, true));
        });

        let result = self.store().subscribe(channel, handler).await;
        self.track("subscribe", channel, result)
    }
}
