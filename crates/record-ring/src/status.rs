//! Ring status reporting

use serde::Serialize;
use tracing::debug;

/// Snapshot of ring occupancy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RingStatus {
    pub full: bool,
    pub empty: bool,
    pub size: usize,
    pub capacity: usize,
}

impl RingStatus {
    pub(crate) fn from_count(count: usize, capacity: usize) -> Self {
        Self {
            full: count == capacity,
            empty: count == 0,
            size: count,
            capacity,
        }
    }

    /// Fill ratio (0.0 to 1.0)
    pub fn fill_ratio(&self) -> f64 {
        self.size as f64 / self.capacity as f64
    }
}

/// Receiver of status snapshots taken after ring operations
pub trait StatusSink {
    fn record(&mut self, label: &str, status: RingStatus);
}

/// Logs every snapshot at debug level
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl StatusSink for TracingSink {
    fn record(&mut self, label: &str, status: RingStatus) {
        debug!(
            ring = label,
            full = status.full,
            empty = status.empty,
            size = status.size,
            "Full: {}, empty: {}, size: {}",
            status.full as u8,
            status.empty as u8,
            status.size
        );
    }
}

impl<A: StatusSink, B: StatusSink> StatusSink for (A, B) {
    fn record(&mut self, label: &str, status: RingStatus) {
        self.0.record(label, status);
        self.1.record(label, status);
    }
}

impl StatusSink for Vec<RingStatus> {
    fn record(&mut self, _label: &str, status: RingStatus) {
        self.push(status);
    }
}
