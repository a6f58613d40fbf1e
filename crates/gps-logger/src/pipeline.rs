//! Producer/Consumer Pipeline
//!
//! The producer publishes fixes into the SPSC ring and backs off while it is
//! full; the consumer polls, stages each fix on the uplink and stops once the
//! producer has finished and the ring is drained. The producer in turn
//! stops early if the consumer goes away. Neither ring operation blocks, so
//! all waiting happens here.

use crate::config::LoggerConfig;
use crate::error::PipelineError;
use crate::source::FixSource;
use crate::uplink::Uplink;
use record_ring::spsc::{self, Consumer, Producer};
use record_ring::{GpsFix, RingError, StatusSink};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Outcome of a pipeline run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PipelineReport {
    /// Fixes taken from the source
    pub produced: u64,
    /// Fixes dropped after exhausting put retries
    pub rejected: u64,
    /// Fixes read by the consumer
    pub consumed: u64,
    /// Fixes sent through the uplink
    pub transmitted: u64,
    /// Sent fixes in order
    #[serde(skip)]
    pub delivered: Vec<GpsFix>,
}

#[derive(Debug, Clone, Copy)]
struct ProducerSettings {
    samples: u64,
    period: Duration,
    backoff: Duration,
    max_retries: u32,
}

#[derive(Debug, Default)]
struct ProducerStats {
    produced: u64,
    rejected: u64,
}

#[derive(Debug, Default)]
struct ConsumerStats {
    consumed: u64,
    delivered: Vec<GpsFix>,
}

/// Run one producer and one consumer task to completion
pub async fn run<S, K>(config: &LoggerConfig, source: S, sink: K) -> Result<PipelineReport, PipelineError>
where
    S: FixSource,
    K: StatusSink + Clone + Send + 'static,
{
    let (tx, rx) = spsc::channel::<GpsFix>(config.capacity)?;
    let uplink = Uplink::new(config.uplink_bytes)?;
    info!(
        "Pipeline starting: capacity={} samples={} uplink={}B",
        config.capacity, config.samples, config.uplink_bytes
    );

    let settings = ProducerSettings {
        samples: config.samples,
        period: config.producer_period(),
        backoff: config.retry_backoff(),
        max_retries: config.max_put_retries,
    };
    let producer = tokio::spawn(produce(tx, source, sink.clone(), settings));
    let consumer = tokio::spawn(consume(rx, uplink, sink, config.consumer_period()));

    let (producer, consumer) = tokio::join!(producer, consumer);
    let producer = producer??;
    let consumer = consumer??;

    let report = PipelineReport {
        produced: producer.produced,
        rejected: producer.rejected,
        consumed: consumer.consumed,
        transmitted: consumer.delivered.len() as u64,
        delivered: consumer.delivered,
    };
    info!(
        "Pipeline finished: produced={} rejected={} consumed={} transmitted={}",
        report.produced, report.rejected, report.consumed, report.transmitted
    );
    Ok(report)
}

async fn produce<S, K>(
    mut tx: Producer<GpsFix>,
    mut source: S,
    mut sink: K,
    settings: ProducerSettings,
) -> Result<ProducerStats, PipelineError>
where
    S: FixSource,
    K: StatusSink,
{
    let mut stats = ProducerStats::default();

    for n in 0..settings.samples {
        if tx.is_closed() {
            warn!("Consumer gone, stopping after {} of {} fixes", n, settings.samples);
            break;
        }
        let fix = source.next_fix();
        stats.produced += 1;
        let mut attempts = 0;
        loop {
            match tx.put(fix) {
                Ok(()) => {
                    debug!("Task 1 queued {}", fix);
                    break;
                }
                Err(RingError::Full { .. }) if tx.is_closed() => {
                    warn!("Consumer gone, dropping {}", fix);
                    stats.rejected += 1;
                    break;
                }
                Err(RingError::Full { .. }) if attempts < settings.max_retries => {
                    attempts += 1;
                    debug!("Ring full, retry {} in {:?}", attempts, settings.backoff);
                    tokio::time::sleep(settings.backoff).await;
                }
                Err(RingError::Full { capacity }) => {
                    warn!(
                        "Dropping {} after {} retries: ring full ({} records)",
                        fix, attempts, capacity
                    );
                    stats.rejected += 1;
                    break;
                }
                Err(e) => return Err(e.into()),
            }
        }
        sink.record("producer", tx.status());

        if n + 1 < settings.samples {
            tokio::time::sleep(settings.period).await;
        }
    }

    debug!("Producer done");
    Ok(stats)
}

async fn consume<K: StatusSink>(
    mut rx: Consumer<GpsFix>,
    mut uplink: Uplink,
    mut sink: K,
    period: Duration,
) -> Result<ConsumerStats, PipelineError> {
    let mut stats = ConsumerStats::default();

    loop {
        match rx.get() {
            Ok(fix) => {
                stats.consumed += 1;
                info!("Task 2 received {}", fix);
                sink.record("consumer", rx.status());
                stats.delivered.extend(uplink.stage(&fix)?);
            }
            Err(RingError::Empty) => {
                // Closed is published after the final put, so an empty ring
                // seen afterwards is drained for good
                if rx.is_closed() && rx.is_empty() {
                    break;
                }
                tokio::time::sleep(period).await;
            }
            Err(e) => return Err(e.into()),
        }
    }

    stats.delivered.extend(uplink.flush()?);
    debug!("Consumer done");
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SampleSource;
    use record_ring::{RingStatus, TracingSink};
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct SharedSink(Arc<Mutex<Vec<RingStatus>>>);

    impl StatusSink for SharedSink {
        fn record(&mut self, _label: &str, status: RingStatus) {
            self.0.lock().unwrap().push(status);
        }
    }

    fn numbered_source(n: usize) -> SampleSource {
        SampleSource::new(
            (0..n)
                .map(|i| GpsFix::new(&format!("{}.5", i), "30.212", "14072019"))
                .collect(),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_all_fixes_delivered_in_order() {
        let config = LoggerConfig {
            capacity: 8,
            samples: 12,
            producer_period_ms: 100,
            consumer_period_ms: 150,
            ..Default::default()
        };
        let mut expected_source = numbered_source(12);
        let expected: Vec<GpsFix> = (0..12).map(|_| expected_source.next_fix()).collect();

        let report = run(&config, numbered_source(12), TracingSink).await.unwrap();

        assert_eq!(report.produced, 12);
        assert_eq!(report.rejected, 0);
        assert_eq!(report.consumed, 12);
        assert_eq!(report.transmitted, 12);
        assert_eq!(report.delivered, expected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_consumer_causes_rejections() {
        let config = LoggerConfig {
            capacity: 2,
            samples: 20,
            producer_period_ms: 10,
            consumer_period_ms: 500,
            retry_backoff_ms: 5,
            max_put_retries: 1,
            ..Default::default()
        };

        let report = run(&config, numbered_source(20), TracingSink).await.unwrap();

        assert!(report.rejected > 0);
        assert_eq!(report.produced, 20);
        assert_eq!(report.consumed, report.produced - report.rejected);
        assert_eq!(report.transmitted, report.produced - report.rejected);

        // Whatever survived keeps its relative order
        let mut source = numbered_source(20);
        let all: Vec<GpsFix> = (0..20).map(|_| source.next_fix()).collect();
        let mut it = all.iter();
        for fix in &report.delivered {
            assert!(it.any(|f| f == fix), "out of order: {}", fix);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_sink_sees_every_operation() {
        let config = LoggerConfig {
            capacity: 4,
            samples: 5,
            producer_period_ms: 10,
            consumer_period_ms: 10,
            ..Default::default()
        };
        let sink = SharedSink::default();

        let report = run(&config, SampleSource::reference(), sink.clone()).await.unwrap();

        let statuses = sink.0.lock().unwrap();
        assert_eq!(statuses.len() as u64, report.produced + report.consumed);
        assert!(statuses.iter().all(|s| s.capacity == 4 && s.size <= 4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_producer_stops_when_consumer_dropped() {
        let (tx, rx) = spsc::channel::<GpsFix>(2).unwrap();
        drop(rx);
        let settings = ProducerSettings {
            samples: 1_000,
            period: Duration::from_millis(10),
            backoff: Duration::from_millis(5),
            max_retries: 3,
        };

        let stats = produce(tx, numbered_source(4), TracingSink, settings).await.unwrap();

        assert_eq!(stats.produced, 0);
        assert_eq!(stats.rejected, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_producer_stops_when_consumer_drops_midway() {
        let (tx, mut rx) = spsc::channel::<GpsFix>(4).unwrap();
        let settings = ProducerSettings {
            samples: 1_000,
            period: Duration::from_millis(10),
            backoff: Duration::from_millis(5),
            max_retries: 3,
        };
        let producer = tokio::spawn(produce(tx, numbered_source(4), TracingSink, settings));

        // Let a couple of fixes through, then walk away
        tokio::time::sleep(Duration::from_millis(15)).await;
        let first = rx.get().unwrap();
        drop(rx);

        let stats = producer.await.unwrap().unwrap();
        assert_eq!(first, GpsFix::new("0.5", "30.212", "14072019"));
        assert!(stats.produced >= 2 && stats.produced < 10, "produced {}", stats.produced);
    }

    #[tokio::test]
    async fn test_zero_capacity_fails_before_spawning() {
        let config = LoggerConfig { capacity: 0, ..Default::default() };
        let err = run(&config, SampleSource::reference(), TracingSink).await.unwrap_err();
        assert!(matches!(err, PipelineError::Ring(RingError::Allocation { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_samples_finishes_immediately() {
        let config = LoggerConfig { samples: 0, ..Default::default() };
        let report = run(&config, SampleSource::reference(), TracingSink).await.unwrap();
        assert_eq!(report, PipelineReport::default());
    }
}
