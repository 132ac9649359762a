//! Abstraction traits for occupancy surfaces and slot pools.

use crate::config::PoolConfig;
use crate::error::PoolError;
use crate::handle::SlotHandle;
use crate::stats::PoolStats;

/// A fixed-length, bit-addressable surface.
///
/// This is the only capability a bitmap pool needs from its occupancy
/// store: read and write one bit by index. The scan methods have per-bit
/// default implementations; packed stores override them with word- or
/// byte-wise scans.
pub trait BitSurface {
    /// Number of addressable bits.
    fn len(&self) -> usize;

    /// Whether the surface has no bits.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read bit `index`.
    ///
    /// Returns `Err(PoolError::IndexOutOfRange)` if `index >= len()`.
    fn get_bit(&self, index: usize) -> Result<bool, PoolError>;

    /// Write bit `index`.
    ///
    /// Returns `Err(PoolError::IndexOutOfRange)` if `index >= len()`.
    fn set_bit(&mut self, index: usize, value: bool) -> Result<(), PoolError>;

    /// Lowest index whose bit is clear, if any.
    fn first_clear(&self) -> Option<usize> {
        (0..self.len()).find(|&i| matches!(self.get_bit(i), Ok(false)))
    }

    /// Highest index below `end` whose bit is set, if any.
    ///
    /// `end` is clamped to `len()`.
    fn last_set_below(&self, end: usize) -> Option<usize> {
        (0..end.min(self.len()))
            .rev()
            .find(|&i| matches!(self.get_bit(i), Ok(true)))
    }

    /// Number of set bits.
    fn count_ones(&self) -> usize {
        (0..self.len())
            .filter(|&i| matches!(self.get_bit(i), Ok(true)))
            .count()
    }
}

/// The interface contract shared by every fixed-capacity pool.
///
/// Pools hand out [`SlotHandle`]s for fixed-size byte slots carved from a
/// single pre-allocated arena. All mutation goes through `&mut self`; a
/// pool is driven by one owner at a time.
pub trait SlotPool {
    /// Create a pool from a validated configuration.
    fn with_config(config: PoolConfig) -> Result<Self, PoolError>
    where
        Self: Sized;

    /// Take a free slot. The returned slot is zero-filled.
    ///
    /// Returns `Err(PoolError::Exhausted)` when every slot is in use.
    fn alloc(&mut self) -> Result<SlotHandle, PoolError>;

    /// Return a slot to the pool.
    fn free(&mut self, handle: SlotHandle) -> Result<(), PoolError>;

    /// Read a slot's bytes.
    fn get(&self, handle: SlotHandle) -> Result<&[u8], PoolError>;

    /// Write a slot's bytes.
    fn get_mut(&mut self, handle: SlotHandle) -> Result<&mut [u8], PoolError>;

    /// Number of slots currently allocated.
    fn live_count(&self) -> usize;

    /// Total number of slots.
    fn capacity(&self) -> usize;

    /// Size of one slot in bytes.
    fn object_size(&self) -> usize;

    /// Snapshot of the allocation counters.
    fn stats(&self) -> PoolStats;

    /// Whether every slot is in use.
    fn is_full(&self) -> bool {
        self.live_count() == self.capacity()
    }

    /// Number of slots that can still be allocated.
    fn available(&self) -> usize {
        self.capacity() - self.live_count()
    }
}
