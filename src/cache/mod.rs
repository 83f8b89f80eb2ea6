//! # Resilient Cache
//!
//! Cache-aside access to a key-value store, protected by a circuit breaker.
//!
//! ## Architecture
//!
//! ```text
//! ResilientCache<S>                 <- gate, breaker, codec, get_or_set
//!   └── S: CacheStore + MessageTransport
//!         CacheProvider (enum)      <- zero-cost dispatch, picked from config
//!           ├── Redis(RedisCacheStore)    <- ConnectionManager-based async Redis
//!           ├── Memory(MemoryCacheStore)  <- in-process DashMap store
//!           └── NoOp(NoOpCacheStore)      <- always-miss, always-succeed fallback
//! ```
//!
//! ## Design Decisions
//!
//! - **Graceful degradation**: Redis failure at startup selects NoOp, never blocks startup
//! - **Fail fast while open**: an open breaker turns reads into misses and writes into no-ops
//! - **Best-effort writes**: `get_or_set` logs cache write failures and never propagates them
//! - **Literal keys**: physical key is `key_prefix + key`, channels are never prefixed
//!
//! ## Usage
//!
//! ```rust,no_run
//! use resilient_cache::config::CacheConfig;
//! use resilient_cache::ResilientCache;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let cache = ResilientCache::connect(CacheConfig::default()).await;
//!
//! let name: String = cache
//!     .get_or_set("user:42:name", || async {
//!         Ok::<_, std::io::Error>("Ada".to_string())
//!     })
//!     .await?;
//! assert_eq!(name, "Ada");
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod errors;
pub mod provider;
pub mod providers;
pub mod pubsub;
pub mod resilient;
pub mod traits;

pub use codec::KeyCodec;
pub use errors::{CacheError, CacheResult};
pub use provider::CacheProvider;
pub use providers::{MemoryCacheStore, NoOpCacheStore};
pub use resilient::ResilientCache;
pub use traits::{CacheStore, MessageHandler, MessageTransport, MAX_TTL_SECONDS};

#[cfg(feature = "cache-redis")]
pub use providers::RedisCacheStore;
