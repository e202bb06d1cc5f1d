//! Error types for the cache
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Errors raised while constructing a cache.
///
/// Runtime operations never fail: a miss is `None`, removing an absent key is
/// a no-op and eviction is routine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Construction parameters were rejected
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// No Tokio runtime is available to host the reaper task
    #[error("Runtime unavailable: {0}")]
    Runtime(String),
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;
