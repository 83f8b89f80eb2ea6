//! Cache error types

use thiserror::Error;

/// Errors that can occur during cache operations
#[derive(Debug, Error)]
pub enum CacheError {
    /// Failed to connect to cache backend
    #[error("Cache connection error: {0}")]
    ConnectionError(String),

    /// Failed to serialize a value into its stored representation
    #[error("Cache serialization error: {0}")]
    SerializationError(String),

    /// Cache operation timed out
    #[error("Cache operation timed out: {0}")]
    Timeout(String),

    /// Command rejected or failed by the backend
    #[error("Cache backend error: {0}")]
    BackendError(String),

    /// Argument no store would accept, rejected before the call
    #[error("Invalid cache argument: {0}")]
    InvalidArgument(String),
}

impl CacheError {
    /// Whether this error was surfaced by the store or transport
    ///
    /// Store errors count against the circuit breaker; serialization and
    /// argument errors are the caller's problem and never do.
    pub fn is_store_error(&self) -> bool {
        !matches!(
            self,
            Self::SerializationError(_) | Self::InvalidArgument(_)
        )
    }

    /// Prefix the message with what was being attempted, keeping the variant
    pub(crate) fn context(self, what: &str) -> Self {
        match self {
            Self::ConnectionError(e) => Self::ConnectionError(format!("{what}: {e}")),
            Self::SerializationError(e) => Self::SerializationError(format!("{what}: {e}")),
            Self::Timeout(e) => Self::Timeout(format!("{what}: {e}")),
            Self::BackendError(e) => Self::BackendError(format!("{what}: {e}")),
            Self::InvalidArgument(e) => Self::InvalidArgument(format!("{what}: {e}")),
        }
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(e: serde_json::Error) -> Self {
        Self::SerializationError(e.to_string())
    }
}

#[cfg(feature = "cache-redis")]
impl From<redis::RedisError> for CacheError {
    fn from(e: redis::RedisError) -> Self {
        if e.is_timeout() {
            Self::Timeout(e.to_string())
        } else if e.is_connection_dropped() || e.is_connection_refusal() || e.is_io_error() {
            Self::ConnectionError(e.to_string())
        } else {
            Self::BackendError(e.to_string())
        }
    }
}

/// Result type for cache operations
pub type CacheResult<T> = Result<T, CacheError>;
