//! Packed one-bit-per-slot occupancy index.
//!
//! [`BitOccupancyIndex`] stores `len` bits in `ceil(len / 8)` bytes,
//! LSB-first: bit `i` lives in byte `i / 8` at bit position `i % 8`. A set
//! bit means the slot is in use.
//!
//! The scans work a byte at a time. [`first_clear`](BitSurface::first_clear)
//! skips every byte equal to `0xFF` and then takes the trailing-zero count
//! of the complemented byte (the `ffs(~byte) - 1` trick), so finding a free
//! slot costs `O(len / 8)` byte compares plus one bit instruction.
//! [`last_set_below`](BitSurface::last_set_below) is the mirror image using
//! leading zeros, which is what compaction needs to find the highest live
//! slot.

use slotpool_core::{BitSurface, PoolError};

/// Bits per storage byte.
const BITS: usize = 8;

/// Packed bit-vector with byte-wise scans.
///
/// Padding bits in the final byte are never set, so whole-byte operations
/// (`count_ones`, the `0xFF` skip) stay exact.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BitOccupancyIndex {
    bytes: Vec<u8>,
    len: usize,
}

impl BitOccupancyIndex {
    /// Create an index of `len` clear bits.
    ///
    /// Returns `Err(PoolError::OutOfMemory)` if the backing bytes cannot be
    /// allocated.
    pub fn new(len: usize) -> Result<Self, PoolError> {
        let byte_len = len.div_ceil(BITS);
        let mut bytes = Vec::new();
        bytes
            .try_reserve_exact(byte_len)
            .map_err(|_| PoolError::OutOfMemory {
                requested: byte_len,
            })?;
        bytes.resize(byte_len, 0);
        Ok(Self { bytes, len })
    }

    /// The packed storage, `ceil(len / 8)` bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Memory usage of the backing storage in bytes.
    pub fn memory_bytes(&self) -> usize {
        self.bytes.len()
    }

    fn check(&self, index: usize) -> Result<(), PoolError> {
        if index >= self.len {
            return Err(PoolError::IndexOutOfRange {
                index,
                len: self.len,
            });
        }
        Ok(())
    }
}

impl BitSurface for BitOccupancyIndex {
    fn len(&self) -> usize {
        self.len
    }

    fn get_bit(&self, index: usize) -> Result<bool, PoolError> {
        self.check(index)?;
        Ok(self.bytes[index / BITS] & (1 << (index % BITS)) != 0)
    }

    fn set_bit(&mut self, index: usize, value: bool) -> Result<(), PoolError> {
        self.check(index)?;
        let mask = 1u8 << (index % BITS);
        let byte = &mut self.bytes[index / BITS];
        if value {
            *byte |= mask;
        } else {
            *byte &= !mask;
        }
        Ok(())
    }

    fn first_clear(&self) -> Option<usize> {
        let (byte_idx, &byte) = self
            .bytes
            .iter()
            .enumerate()
            .find(|&(_, &b)| b != u8::MAX)?;
        let index = byte_idx * BITS + (!byte).trailing_zeros() as usize;
        // A hit in the padding of the last byte means every real bit is set.
        (index < self.len).then_some(index)
    }

    fn last_set_below(&self, end: usize) -> Option<usize> {
        let end = end.min(self.len);
        if end == 0 {
            return None;
        }
        let top = (end - 1) / BITS;
        let bits_in_top = end - top * BITS;
        let top_mask = if bits_in_top == BITS {
            u8::MAX
        } else {
            (1u8 << bits_in_top) - 1
        };

        let masked = self.bytes[top] & top_mask;
        if masked != 0 {
            return Some(top * BITS + (BITS - 1) - masked.leading_zeros() as usize);
        }
        self.bytes[..top]
            .iter()
            .rposition(|&b| b != 0)
            .map(|byte_idx| {
                byte_idx * BITS + (BITS - 1) - self.bytes[byte_idx].leading_zeros() as usize
            })
    }

    fn count_ones(&self) -> usize {
        self.bytes.iter().map(|b| b.count_ones() as usize).sum()
    }
}
