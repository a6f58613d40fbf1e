//! Bounded Record Ring
//!
//! Fixed-capacity FIFO queues of fixed-size records for handing samples
//! from a producer task to a consumer task, plus the byte ring allocator
//! used to stage encoded records.
//!
//! - [`RecordRing`]: single-owner ring with a per-ring [`FullPolicy`]
//! - [`spsc::channel`]: lock-free producer/consumer halves (reject on full)
//! - [`ByteRing`]: contiguous byte slice allocator over a power-of-two ring

mod buffer;
mod byte_ring;
mod error;
mod record;
pub mod spsc;
mod status;

pub use buffer::{FullPolicy, RecordRing, DEFAULT_CAPACITY};
pub use byte_ring::ByteRing;
pub use error::{ByteRingError, RecordError, RingError};
pub use record::{
    FixedField, GpsFix, LAT_DATA_SIZE, LON_DATA_SIZE, MAX_ENCODED_LEN, TIME_DATA_SIZE,
};
pub use status::{RingStatus, StatusSink, TracingSink};
