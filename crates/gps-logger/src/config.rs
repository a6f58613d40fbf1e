//! Logger configuration

use crate::error::ConfigError;
use record_ring::MAX_ENCODED_LEN;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default configuration file, read when present
pub const DEFAULT_CONFIG_FILE: &str = "gps-logger.toml";

/// Environment variable prefix (`GPS_LOGGER_CAPACITY=16`)
pub const ENV_PREFIX: &str = "GPS_LOGGER";

/// Producer/consumer pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    /// Record ring capacity (default: 8)
    pub capacity: usize,
    /// Uplink byte ring size, power of two (default: 256)
    pub uplink_bytes: usize,
    /// Number of fixes the producer emits
    pub samples: u64,
    /// Delay between produced fixes in milliseconds
    pub producer_period_ms: u64,
    /// Consumer poll interval while the ring is empty
    pub consumer_period_ms: u64,
    /// Back-off before retrying a put on a full ring
    pub retry_backoff_ms: u64,
    /// Retries before a fix is dropped
    pub max_put_retries: u32,
    /// Replace sample timestamps with today's date
    pub live_stamp: bool,
    /// Maximum log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Emit JSON log lines
    pub json_logs: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            capacity: 8,
            uplink_bytes: 256,
            samples: 16,
            producer_period_ms: 1000,
            consumer_period_ms: 1500,
            retry_backoff_ms: 100,
            max_put_retries: 3,
            live_stamp: false,
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

impl LoggerConfig {
    /// Load from an optional file, then environment overrides
    ///
    /// Without an explicit path `gps-logger.toml` is used if it exists.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(p) => config::File::from(p).required(true),
            None => config::File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let config = config::Config::builder()
            .add_source(file)
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let loaded: Self = config.try_deserialize()?;
        loaded.validate()?;
        Ok(loaded)
    }

    /// Check values the rings would reject at runtime
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::Invalid("capacity must be non-zero".to_string()));
        }
        if !self.uplink_bytes.is_power_of_two() {
            return Err(ConfigError::Invalid(format!(
                "uplink_bytes {} is not a power of two",
                self.uplink_bytes
            )));
        }
        if self.uplink_bytes <= MAX_ENCODED_LEN {
            return Err(ConfigError::Invalid(format!(
                "uplink_bytes {} cannot hold a single frame of {} bytes",
                self.uplink_bytes,
                MAX_ENCODED_LEN + 1
            )));
        }
        if self.log_level.parse::<tracing::Level>().is_err() {
            return Err(ConfigError::Invalid(format!(
                "unknown log level {:?}",
                self.log_level
            )));
        }
        Ok(())
    }

    pub fn producer_period(&self) -> Duration {
        Duration::from_millis(self.producer_period_ms)
    }

    pub fn consumer_period(&self) -> Duration {
        Duration::from_millis(self.consumer_period_ms)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}
