//! Metrics status sink

use metrics::gauge;
use record_ring::{RingStatus, StatusSink};

/// Publishes ring occupancy gauges, labelled by reporting task
#[derive(Debug, Default, Clone, Copy)]
pub struct MetricsSink;

impl StatusSink for MetricsSink {
    fn record(&mut self, label: &str, status: RingStatus) {
        let task = label.to_string();
        gauge!("ring_size", "task" => task.clone()).set(status.size as f64);
        gauge!("ring_full", "task" => task.clone()).set(if status.full { 1.0 } else { 0.0 });
        gauge!("ring_empty", "task" => task).set(if status.empty { 1.0 } else { 0.0 });
    }
}
