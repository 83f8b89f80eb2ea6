//! Cache store implementations

pub mod memory;
pub mod noop;

#[cfg(feature = "cache-redis")]
pub mod redis;

pub use memory::MemoryCacheStore;
pub use noop::NoOpCacheStore;

#[cfg(feature = "cache-redis")]
pub use self::redis::RedisCacheStore;
