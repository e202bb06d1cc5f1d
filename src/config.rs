//! Configuration Module
//!
//! Construction parameters for a cache.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{CacheError, Result};

/// Cache configuration parameters.
///
/// Durations are (de)serialized as whole milliseconds so the struct can be
/// embedded in an application's own config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of entries the cache can hold
    pub capacity: usize,
    /// Period between background sweeps of expired entries
    #[serde(rename = "cleanup_interval_ms", with = "millis")]
    pub cleanup_interval: Duration,
    /// TTL used by `Cache::insert`
    #[serde(rename = "default_ttl_ms", with = "millis")]
    pub default_ttl: Duration,
}

impl CacheConfig {
    /// Creates a config with the given capacity and sweep interval and the
    /// default TTL.
    pub fn new(capacity: usize, cleanup_interval: Duration) -> Self {
        Self {
            capacity,
            cleanup_interval,
            ..Self::default()
        }
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_cleanup_interval(mut self, cleanup_interval: Duration) -> Self {
        self.cleanup_interval = cleanup_interval;
        self
    }

    pub fn with_default_ttl(mut self, default_ttl: Duration) -> Self {
        self.default_ttl = default_ttl;
        self
    }

    /// Checks that the parameters describe a usable cache.
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(CacheError::Config(
                "capacity must be greater than zero".to_string(),
            ));
        }
        if self.cleanup_interval.is_zero() {
            return Err(CacheError::Config(
                "cleanup interval must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: 1000,
            cleanup_interval: Duration::from_secs(1),
            default_ttl: Duration::from_secs(300),
        }
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        let ms = u64::try_from(value.as_millis()).unwrap_or(u64::MAX);
        serializer.serialize_u64(ms)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = CacheConfig::default();
        assert_eq!(config.capacity, 1000);
        assert_eq!(config.cleanup_interval, Duration::from_secs(1));
        assert_eq!(config.default_ttl, Duration::from_secs(300));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builders() {
        let config = CacheConfig::new(10, Duration::from_millis(250))
            .with_default_ttl(Duration::from_secs(5))
            .with_capacity(20);

        assert_eq!(config.capacity, 20);
        assert_eq!(config.cleanup_interval, Duration::from_millis(250));
        assert_eq!(config.default_ttl, Duration::from_secs(5));
    }

    #[test]
    fn test_config_rejects_zero_capacity() {
        let config = CacheConfig::default().with_capacity(0);
        assert!(matches!(config.validate(), Err(CacheError::Config(_))));
    }

    #[test]
    fn test_config_rejects_zero_interval() {
        let config = CacheConfig::default().with_cleanup_interval(Duration::ZERO);
        assert!(matches!(config.validate(), Err(CacheError::Config(_))));
    }

    #[test]
    fn test_config_deserialize_partial() {
        let config: CacheConfig =
            serde_json::from_str(r#"{"capacity":64,"cleanup_interval_ms":500}"#).unwrap();

        assert_eq!(config.capacity, 64);
        assert_eq!(config.cleanup_interval, Duration::from_millis(500));
        assert_eq!(config.default_ttl, Duration::from_secs(300));
    }

    #[test]
    fn test_config_serialize_as_millis() {
        let config = CacheConfig::new(8, Duration::from_secs(2));
        let json = serde_json::to_value(&config).unwrap();

        assert_eq!(json["capacity"], 8);
        assert_eq!(json["cleanup_interval_ms"], 2000);
        assert_eq!(json["default_ttl_ms"], 300_000);
    }
}
