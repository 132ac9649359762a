//! Free-list fixed-capacity pool.
//!
//! [`FreeListPool`] keeps no occupancy structure at all: the free slots form
//! a singly-linked stack threaded through their own bytes (see
//! [`link`](crate::link)), and the pool stores only the head index. Popping
//! and pushing the head make `alloc` and `free` O(1) with no scanning, and
//! reuse is last-freed-first-out.

use slotpool_core::{
    PointerFault, PoolConfig, PoolError, PoolId, PoolStats, SlotArena, SlotHandle, SlotPool,
};

use crate::link::{read_link, write_link, LINK_WIDTH, NIL};

/// Fixed-capacity pool with an intrusive free list.
///
/// # Double free
///
/// Because a slot carries no used/free flag, releasing a slot twice cannot
/// be detected in general: the slot is pushed onto the list a second time,
/// which makes the list cyclic and lets two later allocations share one
/// slot. Callers must free each allocation at most once. The pool only
/// catches the cases its counters can see (a free while nothing is
/// allocated) and refuses to hand out more than `capacity` slots, so
/// `live_count` never leaves `[0, capacity]`.
///
/// For the same reason, handles are not generation-stamped (their
/// generation is always 0) and `get`/`get_mut` only check that the handle
/// names a slot of this pool.
pub struct FreeListPool {
    id: PoolId,
    arena: SlotArena,
    /// First free slot, or `None` when the list is empty.
    head: Option<usize>,
    allocated: usize,
    stats: PoolStats,
    config: PoolConfig,
}

impl FreeListPool {
    /// Create a pool and thread every slot onto the free list in index order.
    ///
    /// Returns `Err(PoolError::ObjectTooSmall)` if a slot cannot hold a link.
    pub fn new(config: PoolConfig) -> Result<Self, PoolError> {
        if config.object_size < LINK_WIDTH {
            return Err(PoolError::ObjectTooSmall {
                object_size: config.object_size,
                required: LINK_WIDTH,
            });
        }
        let mut arena = SlotArena::new(config.object_size, config.capacity)?;
        let capacity = config.capacity;
        for i in 0..capacity {
            let next = if i + 1 < capacity { i + 1 } else { NIL };
            write_link(arena.slot_mut(i), next);
        }

        let id = PoolId::next();
        if config.verbosity.debug() {
            tracing::debug!(
                pool = id.get(),
                object_size = config.object_size,
                capacity,
                "free-list pool created"
            );
        }
        Ok(Self {
            id,
            arena,
            head: (capacity > 0).then_some(0),
            allocated: 0,
            stats: PoolStats::default(),
            config,
        })
    }

    /// Create a quiet pool of `capacity` slots of `object_size` bytes.
    pub fn create(object_size: usize, capacity: usize) -> Result<Self, PoolError> {
        Self::new(PoolConfig::new(object_size, capacity))
    }

    /// This pool's identity, carried by every handle it issues.
    pub fn id(&self) -> PoolId {
        self.id
    }

    /// The configuration the pool was created with.
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Pop the head of the free list.
    ///
    /// Returns `Err(PoolError::Exhausted)` when the list is empty, and
    /// `Err(PoolError::FreeListCorrupted)` if the head's link is garbage
    /// (the pool is left unchanged in both cases).
    pub fn alloc(&mut self) -> Result<SlotHandle, PoolError> {
        let capacity = self.arena.capacity();
        let index = match self.head {
            Some(index) if self.allocated < capacity => index,
            _ => {
                let err = PoolError::Exhausted { capacity };
                self.warn(&err, "alloc failed");
                return Err(err);
            }
        };

        let link = read_link(self.arena.slot(index));
        let next = match link {
            NIL => None,
            next if next < capacity => Some(next),
            _ => {
                let err = PoolError::FreeListCorrupted { slot: index, link };
                self.warn(&err, "alloc failed");
                return Err(err);
            }
        };

        self.head = next;
        self.arena.clear_slot(index);
        self.allocated += 1;
        self.stats.record_alloc(self.allocated);

        if self.config.verbosity.debug() {
            tracing::debug!(pool = self.id.get(), index, live = self.allocated, "alloc");
        }
        Ok(SlotHandle::new(self.id, index, 0))
    }

    /// Push the slot named by `handle` onto the free list.
    ///
    /// Rejects handles from another pool or past the arena
    /// (`InvalidPointer`) and any free while nothing is allocated
    /// (`DoubleFree`). Other double frees are not detected; see the type
    /// docs.
    pub fn free(&mut self, handle: SlotHandle) -> Result<(), PoolError> {
        let index = match self.check_handle(handle) {
            Ok(index) if self.allocated == 0 => Err(PoolError::DoubleFree { index }),
            other => other,
        }
        .inspect_err(|err| self.warn(err, "free rejected"))?;

        write_link(self.arena.slot_mut(index), self.head.unwrap_or(NIL));
        self.head = Some(index);
        self.allocated -= 1;
        self.stats.record_free();

        if self.config.verbosity.debug() {
            tracing::debug!(pool = self.id.get(), index, live = self.allocated, "free");
        }
        Ok(())
    }

    /// Free the slot starting at byte `offset` within the arena.
    ///
    /// The offset must be a multiple of `object_size` and inside the arena.
    pub fn free_at_offset(&mut self, offset: usize) -> Result<(), PoolError> {
        let handle = self.handle_at(offset)?;
        self.free(handle)
    }

    /// Resolve a byte offset to a handle for that slot.
    pub fn handle_at(&self, offset: usize) -> Result<SlotHandle, PoolError> {
        let index = self.arena.index_at(offset).map_err(|fault| {
            let err = PoolError::InvalidPointer { fault };
            self.warn(&err, "offset rejected");
            err
        })?;
        Ok(SlotHandle::new(self.id, index, 0))
    }

    /// Byte offset of the slot named by `handle`.
    pub fn offset_of(&self, handle: SlotHandle) -> Result<usize, PoolError> {
        let index = self.check_handle(handle)?;
        Ok(self.arena.offset_of(index))
    }

    /// Read a slot's bytes.
    pub fn get(&self, handle: SlotHandle) -> Result<&[u8], PoolError> {
        let index = self.check_handle(handle)?;
        Ok(self.arena.slot(index))
    }

    /// Write a slot's bytes.
    ///
    /// Writing through a handle that was already freed overwrites the
    /// slot's free-list link.
    pub fn get_mut(&mut self, handle: SlotHandle) -> Result<&mut [u8], PoolError> {
        let index = self.check_handle(handle)?;
        Ok(self.arena.slot_mut(index))
    }

    /// Walk the free list from the head.
    ///
    /// The walk stops after `capacity` steps or at the first link that does
    /// not name a slot, so it terminates even on a corrupted list.
    pub fn iter_free(&self) -> FreeIter<'_> {
        FreeIter {
            arena: &self.arena,
            next: self.head,
            remaining: self.arena.capacity(),
        }
    }

    /// Number of slots reachable from the free-list head.
    pub fn free_count(&self) -> usize {
        self.iter_free().count()
    }

    /// Number of allocated slots.
    pub fn live_count(&self) -> usize {
        self.allocated
    }

    /// Total number of slots.
    pub fn capacity(&self) -> usize {
        self.arena.capacity()
    }

    /// Size of one slot in bytes.
    pub fn object_size(&self) -> usize {
        self.arena.object_size()
    }

    /// Snapshot of the allocation counters.
    pub fn stats(&self) -> PoolStats {
        self.stats
    }

    /// Bytes held by the arena. The free list adds nothing on top.
    pub fn memory_bytes(&self) -> usize {
        self.arena.memory_bytes()
    }

    /// Release the arena (and with it the free list).
    pub fn destroy(self) {
        if self.config.verbosity.debug() {
            tracing::debug!(pool = self.id.get(), stats = %self.stats, "free-list pool destroyed");
        }
    }

    fn check_handle(&self, handle: SlotHandle) -> Result<usize, PoolError> {
        if handle.pool() != self.id {
            return Err(PoolError::InvalidPointer {
                fault: PointerFault::ForeignPool {
                    handle_pool: handle.pool(),
                    pool: self.id,
                },
            });
        }
        self.arena.check_index(handle.index())?;
        Ok(handle.index())
    }

    fn warn(&self, err: &PoolError, what: &'static str) {
        if self.config.verbosity.warnings() {
            tracing::warn!(
                pool = self.id.get(),
                live = self.allocated,
                capacity = self.arena.capacity(),
                error = %err,
                "{}",
                what
            );
        }
    }
}

/// Iterator over free slot indices, head first.
pub struct FreeIter<'a> {
    arena: &'a SlotArena,
    next: Option<usize>,
    remaining: usize,
}

impl Iterator for FreeIter<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.remaining == 0 {
            return None;
        }
        let index = self.next?;
        self.remaining -= 1;
        let link = read_link(self.arena.slot(index));
        self.next = (link < self.arena.capacity()).then_some(link);
        Some(index)
    }
}

impl SlotPool for FreeListPool {
    fn with_config(config: PoolConfig) -> Result<Self, PoolError> {
        Self::new(config)
    }

    fn alloc(&mut self) -> Result<SlotHandle, PoolError> {
        FreeListPool::alloc(self)
    }

    fn free(&mut self, handle: SlotHandle) -> Result<(), PoolError> {
        FreeListPool::free(self, handle)
    }

    fn get(&self, handle: SlotHandle) -> Result<&[u8], PoolError> {
        FreeListPool::get(self, handle)
    }

    fn get_mut(&mut self, handle: SlotHandle) -> Result<&mut [u8], PoolError> {
        FreeListPool::get_mut(self, handle)
    }

    fn live_count(&self) -> usize {
        self.allocated
    }

    fn capacity(&self) -> usize {
        self.arena.capacity()
    }

    fn object_size(&self) -> usize {
        self.arena.object_size()
    }

    fn stats(&self) -> PoolStats {
        self.stats
    }
}
