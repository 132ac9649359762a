//! Contiguous slot storage.
//!
//! A [`SlotArena`] is one pre-allocated, zero-initialised `Vec<u8>` divided
//! into `capacity` slots of `object_size` bytes. It never grows or shrinks;
//! occupancy tracking is the owning pool's job.

use crate::error::{PointerFault, PoolError};

/// Fixed-geometry byte arena.
///
/// Slot `i` occupies bytes `[i * object_size, (i + 1) * object_size)`.
pub struct SlotArena {
    /// Backing storage. Allocated to full size at creation.
    data: Vec<u8>,
    object_size: usize,
    capacity: usize,
}

impl SlotArena {
    /// Allocate a zero-filled arena of `capacity` slots.
    ///
    /// Returns `Err(PoolError::OutOfMemory)` if the byte size overflows
    /// `usize` or the allocation fails. Nothing is left allocated on error.
    pub fn new(object_size: usize, capacity: usize) -> Result<Self, PoolError> {
        let bytes = object_size
            .checked_mul(capacity)
            .ok_or(PoolError::OutOfMemory {
                requested: usize::MAX,
            })?;
        let mut data = Vec::new();
        data.try_reserve_exact(bytes)
            .map_err(|_| PoolError::OutOfMemory { requested: bytes })?;
        data.resize(bytes, 0);
        Ok(Self {
            data,
            object_size,
            capacity,
        })
    }

    /// Size of one slot in bytes.
    pub fn object_size(&self) -> usize {
        self.object_size
    }

    /// Number of slots.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Byte offset of slot `index`.
    pub fn offset_of(&self, index: usize) -> usize {
        index * self.object_size
    }

    /// Resolve a byte offset to a slot index.
    ///
    /// The offset must be slot-aligned and inside the arena.
    pub fn index_at(&self, offset: usize) -> Result<usize, PointerFault> {
        if self.object_size == 0 || offset % self.object_size != 0 {
            return Err(PointerFault::Misaligned {
                offset,
                object_size: self.object_size,
            });
        }
        let index = offset / self.object_size;
        self.check_index(index)?;
        Ok(index)
    }

    /// Check that `index` names a slot.
    pub fn check_index(&self, index: usize) -> Result<(), PointerFault> {
        if index >= self.capacity {
            return Err(PointerFault::OutOfBounds {
                index,
                capacity: self.capacity,
            });
        }
        Ok(())
    }

    /// Shared view of a slot.
    ///
    /// # Panics
    ///
    /// Panics if `index >= capacity`.
    pub fn slot(&self, index: usize) -> &[u8] {
        let start = self.offset_of(index);
        &self.data[start..start + self.object_size]
    }

    /// Mutable view of a slot.
    ///
    /// # Panics
    ///
    /// Panics if `index >= capacity`.
    pub fn slot_mut(&mut self, index: usize) -> &mut [u8] {
        let start = self.offset_of(index);
        &mut self.data[start..start + self.object_size]
    }

    /// Copy the bytes of slot `from` over slot `to`.
    ///
    /// # Panics
    ///
    /// Panics if either index is `>= capacity`.
    pub fn copy_slot(&mut self, from: usize, to: usize) {
        let src = self.offset_of(from);
        let dst = self.offset_of(to);
        self.data.copy_within(src..src + self.object_size, dst);
    }

    /// Zero a slot.
    pub fn clear_slot(&mut self, index: usize) {
        self.slot_mut(index).fill(0);
    }

    /// Memory usage of the backing storage in bytes.
    pub fn memory_bytes(&self) -> usize {
        self.data.len()
    }
}
