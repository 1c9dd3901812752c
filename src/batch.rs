//! Buffered reads (`GetRawInputBuffer`).
//!
//! A batch holds several records packed back to back. Records are not a
//! fixed size (HID records carry their reports inline), so the next record
//! always starts at `align_up(offset + dwSize, record_alignment)`.

use crate::config::{BatchConfig, DecodeLimits};
use crate::decoder::{Decoder, RawInputEnvelope};
use crate::error::DecodeError;
use crate::event::DecodedInput;
use crate::layout::{align_up, stride_alignment, RawInputHeader, HEADER_SIZE};
use crate::registry::DeviceLookup;
use crate::source::RawInputSource;
use zerocopy::{FromBytes, IntoBytes};

/// Pulls pending records in one OS round trip.
#[derive(Clone, Copy, Debug)]
pub struct BatchReader {
    limits: DecodeLimits,
    capacity: u32,
}

impl Default for BatchReader {
    fn default() -> Self {
        Self::new(DecodeLimits::default(), &BatchConfig::default())
    }
}

impl BatchReader {
    /// An unusable `record_alignment` (zero or not a power of two) falls back
    /// to pointer alignment.
    pub fn new(mut limits: DecodeLimits, config: &BatchConfig) -> Self {
        limits.record_alignment = stride_alignment(limits.record_alignment);
        Self {
            limits,
            capacity: config.capacity_records.max(1),
        }
    }

    /// Fetch whatever is pending. An empty batch means the queue was empty.
    pub fn fetch_batch<S>(&self, source: &S) -> Result<Batch, DecodeError>
    where
        S: RawInputSource + ?Sized,
    {
        let min = source.buffer_size().map_err(DecodeError::QuerySize)?;
        if min == 0 {
            return Ok(Batch::empty(self.limits.record_alignment));
        }
        let limit = self.limits.max_record_bytes;
        if u64::from(min) > limit {
            return Err(DecodeError::SizeUnreasonable {
                size: u64::from(min),
                limit,
            });
        }

        let total = (u64::from(min) * u64::from(self.capacity))
            .min(limit)
            .max(u64::from(min)) as usize;

        // u64 words keep the buffer 8-aligned, as GetRawInputBuffer requires.
        let mut words = vec![0u64; total.div_ceil(8)];
        let count = source
            .read_buffer(&mut words.as_mut_bytes()[..total])
            .map_err(DecodeError::FetchFailed)?;

        Ok(Batch {
            words,
            len: total,
            count,
            alignment: self.limits.record_alignment,
        })
    }
}

/// The filled region of one `GetRawInputBuffer` call.
#[derive(Clone, Debug)]
pub struct Batch {
    words: Vec<u64>,
    len: usize,
    count: u32,
    alignment: usize,
}

impl Batch {
    fn empty(alignment: usize) -> Self {
        Self {
            words: Vec::new(),
            len: 0,
            count: 0,
            alignment,
        }
    }

    /// Build a batch from bytes already laid out the way `GetRawInputBuffer`
    /// writes them (e.g. a capture). `alignment` is normalised the same way
    /// as in [`BatchReader::new`].
    pub fn from_bytes(bytes: &[u8], count: u32, alignment: usize) -> Self {
        let alignment = stride_alignment(alignment);
        let mut words = vec![0u64; bytes.len().div_ceil(8)];
        words.as_mut_bytes()[..bytes.len()].copy_from_slice(bytes);
        Self {
            words,
            len: bytes.len(),
            count,
            alignment,
        }
    }

    /// Number of records the OS reported.
    pub fn len(&self) -> usize {
        self.count as usize
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn bytes(&self) -> &[u8] {
        &self.words.as_bytes()[..self.len]
    }

    /// Each record as a `dwSize`-byte slice, in OS order.
    pub fn records(&self) -> Records<'_> {
        Records {
            buf: self.bytes(),
            offset: 0,
            remaining: self.count,
            alignment: self.alignment,
        }
    }

    /// Each record classified (header checked, payload not yet interpreted).
    pub fn envelopes(&self) -> impl Iterator<Item = Result<RawInputEnvelope<'_>, DecodeError>> {
        self.records()
            .map(|r| r.and_then(RawInputEnvelope::classify))
    }

    /// Decode every record independently. One result per record, in order;
    /// a framing error is the last element.
    pub fn decode_all<L>(&self, decoder: &Decoder, devices: &L) -> Vec<Result<DecodedInput, DecodeError>>
    where
        L: DeviceLookup + ?Sized,
    {
        self.records()
            .map(|r| r.and_then(|rec| decoder.decode_record(rec, devices)))
            .collect()
    }
}

/// Iterator over the records of a [`Batch`].
#[derive(Clone, Debug)]
pub struct Records<'a> {
    buf: &'a [u8],
    offset: usize,
    remaining: u32,
    alignment: usize,
}

impl<'a> Records<'a> {
    fn stop(&mut self, declared: u32) -> Option<Result<&'a [u8], DecodeError>> {
        let offset = self.offset;
        self.remaining = 0;
        Some(Err(DecodeError::BatchFraming { offset, declared }))
    }
}

impl<'a> Iterator for Records<'a> {
    type Item = Result<&'a [u8], DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let Some(rest) = self.buf.get(self.offset..) else {
            return self.stop(0);
        };
        let Ok((header, _)) = RawInputHeader::read_from_prefix(rest) else {
            return self.stop(0);
        };
        let declared = header.size.get();
        let size = declared as usize;
        if size < HEADER_SIZE || size > rest.len() {
            return self.stop(declared);
        }

        let record = &rest[..size];
        self.remaining -= 1;
        match align_up(self.offset + size, self.alignment) {
            Some(next) => self.offset = next,
            None => self.remaining = 0,
        }
        Some(Ok(record))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining as usize))
    }
}
