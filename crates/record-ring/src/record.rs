//! Fixed-size Records
//!
//! Records are plain `Copy` values so a slot can be overwritten or copied
//! out without allocation.

use crate::error::RecordError;
use serde::de::{self, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::marker::PhantomData;

/// Latitude field width, terminator included
pub const LAT_DATA_SIZE: usize = 12;
/// Longitude field width, terminator included
pub const LON_DATA_SIZE: usize = 12;
/// Timestamp field width (`DDMMYYYY` plus terminator)
pub const TIME_DATA_SIZE: usize = 9;

/// Upper bound of `GpsFix::encode_into` output (one length byte per field)
pub const MAX_ENCODED_LEN: usize = LAT_DATA_SIZE + LON_DATA_SIZE + TIME_DATA_SIZE;

/// NUL-terminated character array of fixed width
///
/// At most `N - 1` bytes of text are kept; the rest of the array is zero.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct FixedField<const N: usize> {
    bytes: [u8; N],
}

impl<const N: usize> FixedField<N> {
    /// Copy `src` up to its first NUL, truncated to `N - 1` bytes
    pub fn from_bytes(src: &[u8]) -> Self {
        let end = src.iter().position(|&b| b == 0).unwrap_or(src.len());
        let len = end.min(N.saturating_sub(1));
        let mut bytes = [0u8; N];
        bytes[..len].copy_from_slice(&src[..len]);
        Self { bytes }
    }

    /// Text bytes before the terminator
    pub fn as_bytes(&self) -> &[u8] {
        let len = self.bytes.iter().position(|&b| b == 0).unwrap_or(N);
        &self.bytes[..len]
    }

    /// Text as UTF-8, `None` if truncation split a character
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(self.as_bytes()).ok()
    }

    /// Raw array, terminator and padding included
    pub fn raw(&self) -> &[u8; N] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.first().map_or(true, |&b| b == 0)
    }
}

impl<const N: usize> Default for FixedField<N> {
    fn default() -> Self {
        Self { bytes: [0u8; N] }
    }
}

impl<const N: usize> From<&str> for FixedField<N> {
    fn from(s: &str) -> Self {
        Self::from_bytes(s.as_bytes())
    }
}

impl<const N: usize> fmt::Display for FixedField<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(self.as_bytes()))
    }
}

impl<const N: usize> fmt::Debug for FixedField<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", String::from_utf8_lossy(self.as_bytes()))
    }
}

impl<const N: usize> Serialize for FixedField<N> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&String::from_utf8_lossy(self.as_bytes()))
        } else {
            serializer.serialize_bytes(self.as_bytes())
        }
    }
}

struct FieldVisitor<const N: usize>(PhantomData<[u8; N]>);

impl<'de, const N: usize> Visitor<'de> for FieldVisitor<N> {
    type Value = FixedField<N>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "a string of at most {} bytes", N.saturating_sub(1))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        self.visit_bytes(v.as_bytes())
    }

    fn visit_bytes<E: de::Error>(self, v: &[u8]) -> Result<Self::Value, E> {
        if v.len() >= N {
            return Err(E::invalid_length(v.len(), &self));
        }
        Ok(FixedField::from_bytes(v))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        let mut bytes = Vec::with_capacity(N);
        while let Some(b) = seq.next_element::<u8>()? {
            bytes.push(b);
        }
        self.visit_bytes(&bytes)
    }
}

impl<'de, const N: usize> Deserialize<'de> for FixedField<N> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            deserializer.deserialize_str(FieldVisitor::<N>(PhantomData))
        } else {
            deserializer.deserialize_bytes(FieldVisitor::<N>(PhantomData))
        }
    }
}

/// One GPS sample as handed from the producer to the consumer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GpsFix {
    pub lat: FixedField<LAT_DATA_SIZE>,
    pub lon: FixedField<LON_DATA_SIZE>,
    pub time_stamp: FixedField<TIME_DATA_SIZE>,
}

impl GpsFix {
    /// Build a fix, truncating each field to its width
    pub fn new(lat: &str, lon: &str, time_stamp: &str) -> Self {
        Self {
            lat: lat.into(),
            lon: lon.into(),
            time_stamp: time_stamp.into(),
        }
    }

    /// Encode with postcard into `buf`, returning the number of bytes used
    pub fn encode_into(&self, buf: &mut [u8]) -> Result<usize, RecordError> {
        postcard::to_slice(self, buf)
            .map(|used| used.len())
            .map_err(|e| RecordError::Encode(e.to_string()))
    }

    /// Decode a fix previously written by `encode_into`
    pub fn decode(bytes: &[u8]) -> Result<Self, RecordError> {
        postcard::from_bytes(bytes).map_err(|e| RecordError::Decode(e.to_string()))
    }
}

impl fmt::Display for GpsFix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "lat={} lon={} ts={}", self.lat, self.lon, self.time_stamp)
    }
}
