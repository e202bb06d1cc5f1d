//! LRU TTL Cache - A bounded in-memory key-value cache
//!
//! Combines least-recently-used eviction with per-entry TTL expiry, plus a
//! background reaper that sweeps expired entries.

pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod tasks;

pub use cache::Cache;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::CacheConfig;
pub use error::{CacheError, Result};
pub use tasks::ReaperState;
