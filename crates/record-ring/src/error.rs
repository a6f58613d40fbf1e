//! Ring Error Types

use thiserror::Error;

/// Errors returned by the record rings
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RingError {
    /// Backing storage could not be obtained
    #[error("Cannot allocate ring storage for {capacity} slots: {reason}")]
    Allocation { capacity: usize, reason: String },

    /// Put rejected because every slot is occupied
    #[error("Ring is full ({capacity} records)")]
    Full { capacity: usize },

    /// Get attempted with no record available
    #[error("Ring is empty")]
    Empty,

    /// Operation on a ring whose storage was already released
    #[error("`{op}` called on a freed ring")]
    UseAfterFree { op: &'static str },
}

impl RingError {
    /// Full and empty are steady-state back-pressure signals, not faults
    pub fn is_recoverable(&self) -> bool {
        matches!(self, RingError::Full { .. } | RingError::Empty)
    }
}

/// Errors while encoding or decoding a record
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    /// Record does not fit the output buffer or cannot be serialized
    #[error("Record encoding failed: {0}")]
    Encode(String),

    /// Bytes do not hold a valid record
    #[error("Record decoding failed: {0}")]
    Decode(String),
}

/// Errors from the byte ring allocator
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ByteRingError {
    /// A transaction of the same direction is already open
    #[error("{0} transaction already in progress")]
    Busy(&'static str),

    /// Continue or commit requested without an open transaction
    #[error("No {0} transaction in progress")]
    NotStarted(&'static str),

    /// Commit or release larger than what was reserved
    #[error("Length {requested} exceeds the {available} bytes held by the transaction")]
    InvalidLength { requested: usize, available: usize },
}
