//! Uplink staging over the byte ring allocator
//!
//! Each fix is stored as a one-byte length followed by its postcard
//! encoding. Flushing reads the frames back, frees their bytes and hands
//! the decoded fixes to the transmitter.

use crate::error::PipelineError;
use record_ring::{ByteRing, GpsFix, MAX_ENCODED_LEN};
use tracing::{debug, info};

pub struct Uplink {
    ring: ByteRing,
    staged: usize,
}

impl Uplink {
    pub fn new(capacity: usize) -> Result<Self, PipelineError> {
        Ok(Self {
            ring: ByteRing::new(capacity)?,
            staged: 0,
        })
    }

    /// Frames waiting for the next flush
    pub fn staged(&self) -> usize {
        self.staged
    }

    pub fn bytes_used(&self) -> usize {
        self.ring.len()
    }

    /// Stage a fix, flushing first when the frame does not fit
    ///
    /// Returns the fixes sent by that flush (empty when none was needed).
    pub fn stage(&mut self, fix: &GpsFix) -> Result<Vec<GpsFix>, PipelineError> {
        let mut frame = [0u8; MAX_ENCODED_LEN + 1];
        let payload_len = fix.encode_into(&mut frame[1..])?;
        frame[0] = payload_len as u8;
        let frame = &frame[..=payload_len];

        let sent = if self.ring.free_space() < frame.len() {
            self.flush()?
        } else {
            Vec::new()
        };

        self.write_frame(frame)?;
        self.staged += 1;
        debug!("Staged {} byte frame ({} staged)", frame.len(), self.staged);
        Ok(sent)
    }

    fn write_frame(&mut self, frame: &[u8]) -> Result<(), PipelineError> {
        let mut written = 0;
        let mut start = true;
        while written < frame.len() {
            let slot = self.ring.alloc(frame.len() - written, start)?;
            if slot.is_empty() {
                break;
            }
            let n = slot.len();
            slot.copy_from_slice(&frame[written..written + n]);
            written += n;
            start = false;
        }
        if written < frame.len() {
            // Hand the partial reservation back rather than publish half a frame
            self.ring.put(0)?;
            return Err(PipelineError::CorruptFrame(format!(
                "frame truncated to {} of {} bytes",
                written,
                frame.len()
            )));
        }
        self.ring.put(written)?;
        Ok(())
    }

    /// Read back, release and decode every staged frame in order
    pub fn flush(&mut self) -> Result<Vec<GpsFix>, PipelineError> {
        let mut sent = Vec::with_capacity(self.staged);
        let mut len_byte = [0u8; 1];

        while !self.ring.is_empty() {
            if self.ring.cpy_get(&mut len_byte)? == 0 {
                break;
            }
            let len = len_byte[0] as usize;
            let mut payload = [0u8; MAX_ENCODED_LEN];
            if len > payload.len() {
                return Err(PipelineError::CorruptFrame(format!("length byte {}", len)));
            }

            let mut read = 0;
            let mut opened = false;
            while read < len {
                let chunk = self.ring.get(len - read, !opened)?;
                opened = true;
                if chunk.is_empty() {
                    break;
                }
                payload[read..read + chunk.len()].copy_from_slice(chunk);
                read += chunk.len();
            }
            // Close the read transaction even when nothing was claimed
            if opened {
                self.ring.free(read)?;
            }
            if read < len {
                return Err(PipelineError::CorruptFrame(format!(
                    "payload truncated to {} of {} bytes",
                    read, len
                )));
            }

            let fix = GpsFix::decode(&payload[..len])?;
            info!("Uplink sent: {}", fix);
            sent.push(fix);
        }

        self.staged = 0;
        Ok(sent)
    }
}
