//! # Resilience Module
//!
//! Circuit breaker protecting the cache backend. When the backend keeps failing
//! the breaker opens and the cache layer degrades to "always miss, never write"
//! until a fixed recovery window has passed.
//!
//! ## Usage
//!
//! ```rust
//! use resilient_cache::resilience::{CircuitBreaker, CircuitBreakerConfig};
//! use std::time::Duration;
//!
//! let config = CircuitBreakerConfig {
//!     failure_threshold: 3,
//!     recovery_timeout: Duration::from_secs(30),
//! };
//!
//! let circuit_breaker = CircuitBreaker::new("cache", config);
//!
//! for _ in 0..3 {
//!     circuit_breaker.record_failure();
//! }
//! assert!(!circuit_breaker.is_available());
//! ```

pub mod circuit_breaker;
pub mod config;
pub mod metrics;

pub use circuit_breaker::{CircuitBreaker, CircuitState};
pub use config::CircuitBreakerConfig;
pub use metrics::CircuitBreakerMetrics;
