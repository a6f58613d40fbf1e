//! Logger Error Types

use record_ring::{ByteRingError, RecordError, RingError};
use thiserror::Error;

/// Errors that stop the producer/consumer pipeline
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Ring error: {0}")]
    Ring(#[from] RingError),

    #[error("Record error: {0}")]
    Record(#[from] RecordError),

    #[error("Uplink error: {0}")]
    Uplink(#[from] ByteRingError),

    /// Uplink frame failed to round-trip through the byte ring
    #[error("Corrupt uplink frame: {0}")]
    CorruptFrame(String),

    /// A task panicked or was cancelled
    #[error("Task failed: {0}")]
    Join(String),
}

impl From<tokio::task::JoinError> for PipelineError {
    fn from(err: tokio::task::JoinError) -> Self {
        PipelineError::Join(err.to_string())
    }
}

/// Errors while loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::Load(err.to_string())
    }
}
