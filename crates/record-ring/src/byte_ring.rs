//! Byte Ring Allocator
//!
//! Hands out contiguous byte slices from a power-of-two ring. Writers
//! reserve space with `alloc` and publish it with `put`; readers claim data
//! with `get` and hand it back with `free`. `cpy_put`/`cpy_get` copy through
//! the wrap point instead.

use crate::error::{ByteRingError, RingError};
use std::fmt;
use tracing::trace;

pub struct ByteRing {
    buf: Box<[u8]>,
    mask: usize,
    // Free-running cursors, masked on access
    wr_idx: usize,
    tmp_wr_idx: usize,
    rd_idx: usize,
    tmp_rd_idx: usize,
    wr_open: bool,
    rd_open: bool,
}

impl ByteRing {
    /// Allocate a ring of `capacity` bytes; capacity must be a power of two
    pub fn new(capacity: usize) -> Result<Self, RingError> {
        if !capacity.is_power_of_two() {
            return Err(RingError::Allocation {
                capacity,
                reason: "byte ring capacity must be a non-zero power of two".to_string(),
            });
        }

        let mut buf = Vec::new();
        buf.try_reserve_exact(capacity)
            .map_err(|e| RingError::Allocation {
                capacity,
                reason: e.to_string(),
            })?;
        buf.resize(capacity, 0u8);

        Ok(Self {
            buf: buf.into_boxed_slice(),
            mask: capacity - 1,
            wr_idx: 0,
            tmp_wr_idx: 0,
            rd_idx: 0,
            tmp_rd_idx: 0,
            wr_open: false,
            rd_open: false,
        })
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Committed bytes not yet released by the reader
    pub fn len(&self) -> usize {
        self.wr_idx.wrapping_sub(self.rd_idx)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bytes a writer could still reserve
    pub fn free_space(&self) -> usize {
        self.capacity() - self.tmp_wr_idx.wrapping_sub(self.rd_idx)
    }

    pub fn is_full(&self) -> bool {
        self.free_space() == 0
    }

    /// Reserve up to `len` contiguous bytes for writing
    ///
    /// The returned slice is shorter than `len` when free space runs out or
    /// the reservation reaches the physical end of the buffer; a second call
    /// with `start = false` continues from the wrap point.
    pub fn alloc(&mut self, len: usize, start: bool) -> Result<&mut [u8], ByteRingError> {
        if start {
            if self.wr_open {
                return Err(ByteRingError::Busy("write"));
            }
            self.wr_open = true;
            self.tmp_wr_idx = self.wr_idx;
        } else if !self.wr_open {
            return Err(ByteRingError::NotStarted("write"));
        }

        let offset = self.tmp_wr_idx & self.mask;
        let n = len
            .min(self.free_space())
            .min(self.capacity() - offset);
        self.tmp_wr_idx = self.tmp_wr_idx.wrapping_add(n);

        trace!("alloc: requested={} granted={} offset={}", len, n, offset);
        Ok(&mut self.buf[offset..offset + n])
    }

    /// Publish `len` reserved bytes and close the write transaction
    ///
    /// Reserved bytes beyond `len` go back to the free space.
    pub fn put(&mut self, len: usize) -> Result<(), ByteRingError> {
        if !self.wr_open {
            return Err(ByteRingError::NotStarted("write"));
        }
        let reserved = self.tmp_wr_idx.wrapping_sub(self.wr_idx);
        if len > reserved {
            return Err(ByteRingError::InvalidLength {
                requested: len,
                available: reserved,
            });
        }

        self.wr_idx = self.wr_idx.wrapping_add(len);
        self.tmp_wr_idx = self.wr_idx;
        self.wr_open = false;
        Ok(())
    }

    /// Claim up to `len` contiguous committed bytes for reading
    pub fn get(&mut self, len: usize, start: bool) -> Result<&[u8], ByteRingError> {
        if start {
            if self.rd_open {
                return Err(ByteRingError::Busy("read"));
            }
            self.rd_open = true;
            self.tmp_rd_idx = self.rd_idx;
        } else if !self.rd_open {
            return Err(ByteRingError::NotStarted("read"));
        }

        let offset = self.tmp_rd_idx & self.mask;
        let n = len
            .min(self.wr_idx.wrapping_sub(self.tmp_rd_idx))
            .min(self.capacity() - offset);
        self.tmp_rd_idx = self.tmp_rd_idx.wrapping_add(n);

        trace!("get: requested={} granted={} offset={}", len, n, offset);
        Ok(&self.buf[offset..offset + n])
    }

    /// Release `len` claimed bytes and close the read transaction
    ///
    /// Claimed bytes beyond `len` stay readable.
    pub fn free(&mut self, len: usize) -> Result<(), ByteRingError> {
        if !self.rd_open {
            return Err(ByteRingError::NotStarted("read"));
        }
        let claimed = self.tmp_rd_idx.wrapping_sub(self.rd_idx);
        if len > claimed {
            return Err(ByteRingError::InvalidLength {
                requested: len,
                available: claimed,
            });
        }

        self.rd_idx = self.rd_idx.wrapping_add(len);
        self.tmp_rd_idx = self.rd_idx;
        self.rd_open = false;
        Ok(())
    }

    /// Copy as much of `data` as fits, returning the number of bytes written
    pub fn cpy_put(&mut self, data: &[u8]) -> Result<usize, ByteRingError> {
        if self.wr_open {
            return Err(ByteRingError::Busy("write"));
        }

        let n = data.len().min(self.free_space());
        let offset = self.wr_idx & self.mask;
        let first = n.min(self.capacity() - offset);
        self.buf[offset..offset + first].copy_from_slice(&data[..first]);
        self.buf[..n - first].copy_from_slice(&data[first..n]);

        self.wr_idx = self.wr_idx.wrapping_add(n);
        self.tmp_wr_idx = self.wr_idx;
        Ok(n)
    }

    /// Copy up to `out.len()` committed bytes out, returning the number read
    pub fn cpy_get(&mut self, out: &mut [u8]) -> Result<usize, ByteRingError> {
        if self.rd_open {
            return Err(ByteRingError::Busy("read"));
        }

        let n = out.len().min(self.len());
        let offset = self.rd_idx & self.mask;
        let first = n.min(self.capacity() - offset);
        out[..first].copy_from_slice(&self.buf[offset..offset + first]);
        out[first..n].copy_from_slice(&self.buf[..n - first]);

        self.rd_idx = self.rd_idx.wrapping_add(n);
        self.tmp_rd_idx = self.rd_idx;
        Ok(n)
    }
}

impl fmt::Debug for ByteRing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ByteRing")
            .field("capacity", &self.capacity())
            .field("wr_idx", &self.wr_idx)
            .field("rd_idx", &self.rd_idx)
            .field("wr_open", &self.wr_open)
            .field("rd_open", &self.rd_open)
            .finish()
    }
}
