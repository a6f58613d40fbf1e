//! Bounded Record Ring Implementation

use crate::error::RingError;
use crate::status::RingStatus;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, trace};

/// Default ring capacity (matches the 8-slot GPS sample ring)
pub const DEFAULT_CAPACITY: usize = 8;

/// What `put` does when every slot is occupied
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FullPolicy {
    /// Fail with `RingError::Full` and leave the ring untouched
    #[default]
    Reject,
    /// Overwrite the oldest unread record and advance `tail`
    DropOldest,
}

/// Fixed-capacity FIFO of `Copy` records
///
/// Storage is allocated once by the constructor and released either by
/// `free` or when the ring is dropped. After `free` every operation that
/// touches slots or occupancy returns `RingError::UseAfterFree`; only
/// `capacity`, `policy` and `total_written` keep answering.
pub struct RecordRing<T> {
    /// Pre-allocated slots, `None` once freed
    storage: Option<Box<[T]>>,
    capacity: usize,
    /// Next slot to write
    head: usize,
    /// Next slot to read
    tail: usize,
    /// Occupied slots
    count: usize,
    policy: FullPolicy,
    /// Total records accepted (for statistics)
    total_written: u64,
}

impl<T: Copy + Default> RecordRing<T> {
    /// Allocate a ring of `capacity` default-initialised slots
    pub fn new(capacity: usize, policy: FullPolicy) -> Result<Self, RingError> {
        if capacity == 0 {
            return Err(RingError::Allocation {
                capacity,
                reason: "capacity must be non-zero".to_string(),
            });
        }

        let mut storage: Vec<T> = Vec::new();
        storage
            .try_reserve_exact(capacity)
            .map_err(|e| RingError::Allocation {
                capacity,
                reason: e.to_string(),
            })?;
        storage.resize(capacity, T::default());

        Self::from_storage(storage.into_boxed_slice(), policy)
    }

    /// Create a ring with default capacity (8 records)
    pub fn with_default_capacity(policy: FullPolicy) -> Result<Self, RingError> {
        Self::new(DEFAULT_CAPACITY, policy)
    }
}

impl<T: Copy> RecordRing<T> {
    /// Take ownership of a caller-supplied backing store
    ///
    /// The slice length becomes the capacity; existing contents are treated
    /// as unused.
    pub fn from_storage(storage: Box<[T]>, policy: FullPolicy) -> Result<Self, RingError> {
        let capacity = storage.len();
        if capacity == 0 {
            return Err(RingError::Allocation {
                capacity,
                reason: "backing store is empty".to_string(),
            });
        }
        debug!("Ring initialised: capacity={} policy={:?}", capacity, policy);

        Ok(Self {
            storage: Some(storage),
            capacity,
            head: 0,
            tail: 0,
            count: 0,
            policy,
            total_written: 0,
        })
    }

    fn slots(&self, op: &'static str) -> Result<&[T], RingError> {
        self.storage.as_deref().ok_or(RingError::UseAfterFree { op })
    }

    /// Insert a record at `head`
    ///
    /// Under `FullPolicy::DropOldest` a full ring overwrites the record at
    /// `tail`, which is returned as `Some`. Under `FullPolicy::Reject` a
    /// full ring fails with `RingError::Full` and nothing changes.
    pub fn put(&mut self, record: T) -> Result<Option<T>, RingError> {
        let capacity = self.capacity;
        let full = self.count == capacity;
        let policy = self.policy;
        let storage = self
            .storage
            .as_deref_mut()
            .ok_or(RingError::UseAfterFree { op: "put" })?;

        let evicted = if full {
            match policy {
                FullPolicy::Reject => return Err(RingError::Full { capacity }),
                FullPolicy::DropOldest => {
                    let oldest = storage[self.tail];
                    self.tail = (self.tail + 1) % capacity;
                    Some(oldest)
                }
            }
        } else {
            None
        };

        storage[self.head] = record;
        self.head = (self.head + 1) % capacity;
        if evicted.is_none() {
            self.count += 1;
        }
        self.total_written += 1;

        trace!("put: head={} tail={} count={}", self.head, self.tail, self.count);
        Ok(evicted)
    }

    /// Remove and return the oldest record
    pub fn get(&mut self) -> Result<T, RingError> {
        let record = self.peek_at("get")?;
        self.tail = (self.tail + 1) % self.capacity;
        self.count -= 1;

        trace!("get: head={} tail={} count={}", self.head, self.tail, self.count);
        Ok(record)
    }

    /// Copy of the oldest record without consuming it
    pub fn peek(&self) -> Result<T, RingError> {
        self.peek_at("peek")
    }

    fn peek_at(&self, op: &'static str) -> Result<T, RingError> {
        let slots = self.slots(op)?;
        if self.count == 0 {
            return Err(RingError::Empty);
        }
        Ok(slots[self.tail])
    }

    pub fn is_full(&self) -> Result<bool, RingError> {
        self.slots("is_full")?;
        Ok(self.count == self.capacity)
    }

    pub fn is_empty(&self) -> Result<bool, RingError> {
        self.slots("is_empty")?;
        Ok(self.count == 0)
    }

    /// Number of records waiting to be read
    pub fn size(&self) -> Result<usize, RingError> {
        self.slots("size")?;
        Ok(self.count)
    }

    /// Get the ring capacity
    ///
    /// Construction-time metadata, still readable after `free`.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Full-ring policy; like `capacity`, answers after `free`
    pub fn policy(&self) -> FullPolicy {
        self.policy
    }

    /// Occupancy snapshot for a diagnostics sink
    pub fn status(&self) -> Result<RingStatus, RingError> {
        self.slots("status")?;
        Ok(RingStatus::from_count(self.count, self.capacity))
    }

    /// Read the last N records (most recent first) without consuming them
    pub fn read_last(&self, n: usize) -> Result<Vec<T>, RingError> {
        let slots = self.slots("read_last")?;
        let n = n.min(self.count);
        Ok((1..=n)
            .map(|i| slots[(self.head + self.capacity - i) % self.capacity])
            .collect())
    }

    /// Iterate unread records from oldest to newest
    pub fn iter(&self) -> Result<impl Iterator<Item = &T> + '_, RingError> {
        let slots = self.slots("iter")?;
        let (tail, capacity) = (self.tail, self.capacity);
        Ok((0..self.count).map(move |i| &slots[(tail + i) % capacity]))
    }

    /// Get total records accepted (for statistics)
    ///
    /// Kept across `free` so a released ring can still be accounted for.
    pub fn total_written(&self) -> u64 {
        self.total_written
    }

    /// Discard every unread record
    pub fn clear(&mut self) -> Result<(), RingError> {
        self.slots("clear")?;
        self.tail = self.head;
        self.count = 0;
        Ok(())
    }

    /// Release the backing storage
    ///
    /// Freeing twice is reported as `RingError::UseAfterFree`.
    pub fn free(&mut self) -> Result<(), RingError> {
        if self.storage.take().is_none() {
            return Err(RingError::UseAfterFree { op: "free" });
        }
        self.head = 0;
        self.tail = 0;
        self.count = 0;
        debug!("Ring storage released");
        Ok(())
    }

    pub fn is_freed(&self) -> bool {
        self.storage.is_none()
    }
}

impl<T> fmt::Debug for RecordRing<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordRing")
            .field("capacity", &self.capacity)
            .field("head", &self.head)
            .field("tail", &self.tail)
            .field("count", &self.count)
            .field("policy", &self.policy)
            .field("freed", &self.storage.is_none())
            .finish()
    }
}
