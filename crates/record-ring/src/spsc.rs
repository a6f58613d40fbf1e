//! Split single-producer/single-consumer ring
//!
//! The producer owns `head`, the consumer owns `tail`, and the shared
//! occupancy `count` is the only cursor both sides touch. A slot is written
//! before the release increment of `count` and read before the release
//! decrement, so the other side never observes a half-updated slot.
//! Full rings always reject: only the consumer may move `tail`.

use crate::error::RingError;
use crate::status::RingStatus;
use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::debug;

struct Shared<T> {
    slots: Box<[UnsafeCell<T>]>,
    count: AtomicUsize,
    total_written: AtomicU64,
    producer_closed: AtomicBool,
    consumer_closed: AtomicBool,
}

// SAFETY: a slot is only accessed by the half that currently owns it, and
// ownership is handed over through the acquire/release operations on `count`.
unsafe impl<T: Send> Sync for Shared<T> {}

impl<T> Shared<T> {
    fn capacity(&self) -> usize {
        self.slots.len()
    }

    fn status(&self) -> RingStatus {
        RingStatus::from_count(self.count.load(Ordering::Acquire), self.capacity())
    }
}

/// Create a connected producer/consumer pair over `capacity` slots
pub fn channel<T: Copy + Default>(capacity: usize) -> Result<(Producer<T>, Consumer<T>), RingError> {
    if capacity == 0 {
        return Err(RingError::Allocation {
            capacity,
            reason: "capacity must be non-zero".to_string(),
        });
    }

    let mut slots: Vec<UnsafeCell<T>> = Vec::new();
    slots
        .try_reserve_exact(capacity)
        .map_err(|e| RingError::Allocation {
            capacity,
            reason: e.to_string(),
        })?;
    slots.extend((0..capacity).map(|_| UnsafeCell::new(T::default())));

    let shared = Arc::new(Shared {
        slots: slots.into_boxed_slice(),
        count: AtomicUsize::new(0),
        total_written: AtomicU64::new(0),
        producer_closed: AtomicBool::new(false),
        consumer_closed: AtomicBool::new(false),
    });
    debug!("SPSC ring initialised: capacity={}", capacity);

    Ok((
        Producer { shared: Arc::clone(&shared), head: 0 },
        Consumer { shared, tail: 0 },
    ))
}

/// Writing half
pub struct Producer<T> {
    shared: Arc<Shared<T>>,
    head: usize,
}

impl<T: Copy> Producer<T> {
    /// Insert a record, failing with `RingError::Full` when no slot is free
    pub fn put(&mut self, record: T) -> Result<(), RingError> {
        let capacity = self.shared.capacity();
        if self.shared.count.load(Ordering::Acquire) == capacity {
            return Err(RingError::Full { capacity });
        }

        // SAFETY: count < capacity, so the slot at head is not readable by
        // the consumer until the increment below publishes it.
        unsafe {
            *self.shared.slots[self.head].get() = record;
        }
        self.head = (self.head + 1) % capacity;
        self.shared.count.fetch_add(1, Ordering::Release);
        self.shared.total_written.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    pub fn is_full(&self) -> bool {
        self.shared.status().full
    }

    pub fn is_empty(&self) -> bool {
        self.shared.status().empty
    }

    pub fn size(&self) -> usize {
        self.shared.status().size
    }

    pub fn capacity(&self) -> usize {
        self.shared.capacity()
    }

    pub fn status(&self) -> RingStatus {
        self.shared.status()
    }

    /// Get total records accepted (for statistics)
    pub fn total_written(&self) -> u64 {
        self.shared.total_written.load(Ordering::Relaxed)
    }

    /// True once the consumer has been dropped and nothing will read again
    pub fn is_closed(&self) -> bool {
        self.shared.consumer_closed.load(Ordering::Acquire)
    }
}

impl<T> Drop for Producer<T> {
    fn drop(&mut self) {
        self.shared.producer_closed.store(true, Ordering::Release);
    }
}

/// Reading half
pub struct Consumer<T> {
    shared: Arc<Shared<T>>,
    tail: usize,
}

impl<T: Copy> Consumer<T> {
    /// Remove the oldest record, failing with `RingError::Empty` when none is ready
    pub fn get(&mut self) -> Result<T, RingError> {
        if self.shared.count.load(Ordering::Acquire) == 0 {
            return Err(RingError::Empty);
        }

        // SAFETY: count > 0, so the slot at tail was published by the
        // producer and will not be rewritten before the decrement below.
        let record = unsafe { *self.shared.slots[self.tail].get() };
        self.tail = (self.tail + 1) % self.shared.capacity();
        self.shared.count.fetch_sub(1, Ordering::Release);
        Ok(record)
    }

    pub fn is_full(&self) -> bool {
        self.shared.status().full
    }

    pub fn is_empty(&self) -> bool {
        self.shared.status().empty
    }

    pub fn size(&self) -> usize {
        self.shared.status().size
    }

    pub fn capacity(&self) -> usize {
        self.shared.capacity()
    }

    pub fn status(&self) -> RingStatus {
        self.shared.status()
    }

    /// True once the producer has been dropped
    ///
    /// Records already in the ring can still be read.
    pub fn is_closed(&self) -> bool {
        self.shared.producer_closed.load(Ordering::Acquire)
    }
}

impl<T> Drop for Consumer<T> {
    fn drop(&mut self) {
        self.shared.consumer_closed.store(true, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GpsFix;
    use std::thread;

    fn assert_send<T: Send>() {}

    #[test]
    fn test_halves_are_send() {
        assert_send::<Producer<GpsFix>>();
        assert_send::<Consumer<GpsFix>>();
    }

    #[test]
    fn test_zero_capacity_rejected() {
        assert!(matches!(channel::<u8>(0), Err(RingError::Allocation { .. })));
    }

    #[test]
    fn test_gps_scenario() {
        let (mut tx, mut rx) = channel::<GpsFix>(8).unwrap();
        let a = GpsFix::new("10.212", "30.212", "14072019");
        let b = GpsFix::new("11.221", "45.212", "15072019");
        tx.put(a).unwrap();
        tx.put(b).unwrap();

        assert_eq!(rx.size(), 2);
        assert!(!tx.is_full());
        assert_eq!(rx.get().unwrap(), a);
        assert_eq!(tx.size(), 1);
    }

    #[test]
    fn test_full_and_empty_signals() {
        let (mut tx, mut rx) = channel::<u32>(2).unwrap();
        assert_eq!(rx.get().unwrap_err(), RingError::Empty);
        tx.put(1).unwrap();
        tx.put(2).unwrap();
        assert!(rx.is_full());
        assert_eq!(tx.put(3).unwrap_err(), RingError::Full { capacity: 2 });
        assert_eq!(rx.get().unwrap(), 1);
        tx.put(3).unwrap();
        assert_eq!(rx.get().unwrap(), 2);
        assert_eq!(rx.get().unwrap(), 3);
        assert!(rx.is_empty());
        assert_eq!(tx.total_written(), 3);
    }

    #[test]
    fn test_close_on_producer_drop() {
        let (mut tx, mut rx) = channel::<u32>(4).unwrap();
        tx.put(7).unwrap();
        assert!(!rx.is_closed());
        drop(tx);
        assert!(rx.is_closed());
        assert_eq!(rx.get().unwrap(), 7);
        assert_eq!(rx.get().unwrap_err(), RingError::Empty);
    }

    #[test]
    fn test_close_on_consumer_drop() {
        let (mut tx, rx) = channel::<u32>(4).unwrap();
        tx.put(1).unwrap();
        assert!(!tx.is_closed());
        drop(rx);
        assert!(tx.is_closed());
    }

    #[test]
    fn test_oversized_capacity_is_allocation_error() {
        let err = channel::<GpsFix>(usize::MAX / 2).err().unwrap();
        assert!(matches!(err, RingError::Allocation { capacity, .. } if capacity == usize::MAX / 2));
    }

    #[test]
    fn test_threads_preserve_fifo() {
        const TOTAL: u32 = 10_000;
        let (mut tx, mut rx) = channel::<u32>(7).unwrap();

        let producer = thread::spawn(move || {
            for i in 0..TOTAL {
                while tx.put(i).is_err() {
                    thread::yield_now();
                }
            }
        });

        let mut received = Vec::with_capacity(TOTAL as usize);
        while received.len() < TOTAL as usize {
            match rx.get() {
                Ok(v) => received.push(v),
                Err(RingError::Empty) => thread::yield_now(),
                Err(e) => panic!("unexpected error: {e}"),
            }
        }
        producer.join().unwrap();

        assert!(received.iter().copied().eq(0..TOTAL));
        assert!(rx.is_closed());
    }
}
