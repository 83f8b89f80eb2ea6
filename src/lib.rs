#![allow(clippy::doc_markdown)] // Allow technical terms like Redis, DashMap in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Resilient Cache
//!
//! Cache-aside layer over a remote key-value store with circuit breaker protection.
//!
//! ## Overview
//!
//! Application code asks for a value by logical key and supplies the
//! computation that produces it. The cache answers from the store when it can,
//! and otherwise runs the computation and stores the result on a best-effort
//! basis. When the store keeps failing, a circuit breaker stops calling it for a
//! recovery window so callers pay no timeout penalty during an outage.
//!
//! ## Module Organization
//!
//! - [`cache`] - `ResilientCache`, key codec, store traits and providers
//! - [`resilience`] - Lock-free circuit breaker
//! - [`config`] - Layered TOML + environment configuration
//! - [`logging`] - Structured logging setup
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use resilient_cache::config::ConfigLoader;
//! use resilient_cache::ResilientCache;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! resilient_cache::logging::init_structured_logging();
//!
//! let config = ConfigLoader::new_from_env()?.load()?;
//! let cache = ResilientCache::connect(config).await;
//!
//! cache.set_with_ttl("session:abc", &serde_json::json!({"user": 7}), Some(300)).await?;
//! let session = cache.get("session:abc").await?;
//! println!("session: {session:?}");
//! # Ok(())
//! # }
//! ```
//!
//! ## Testing
//!
//! ```bash
//! cargo test                            # Unit and integration tests
//! cargo test --features test-services   # Also run tests against REDIS_URL
//! ```

pub mod cache;
pub mod config;
pub mod logging;
pub mod resilience;

pub use cache::{
    CacheError, CacheProvider, CacheResult, CacheStore, KeyCodec, MessageTransport,
    ResilientCache,
};
pub use config::{CacheConfig, ConfigLoader, ConfigurationError};
pub use resilience::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
