//! Bitmap-indexed fixed-capacity pool.
//!
//! [`BitmapPool`] pairs a [`SlotArena`] with a [`BitSurface`] holding one
//! occupancy bit per slot, plus a per-slot generation counter that stamps
//! every issued [`SlotHandle`]. Allocation is first-fit: the lowest free
//! index is always handed out next.

use slotpool_core::{
    BitSurface, PointerFault, PoolConfig, PoolError, PoolId, PoolStats, SlotArena, SlotHandle,
    SlotPool,
};

use crate::occupancy::BitOccupancyIndex;

/// Fixed-capacity pool with a packed occupancy bitmap.
///
/// # Handle validity
///
/// A slot's generation is bumped every time the slot is released (freed,
/// or vacated by [`defragment`](BitmapPool::defragment)). Handles record the
/// generation they were issued at, so any access through a handle whose
/// slot has since been released is rejected with
/// [`PoolError::StaleHandle`] instead of aliasing a newer allocation.
///
/// Generations are `u32` and wrap after 2^32 releases of the same slot.
/// A handle kept across a full wrap matches its slot's generation again
/// and is accepted as if it were current. Handles are meant to be dropped
/// when their slot is freed, not held for that long.
pub struct BitmapPool<S: BitSurface = BitOccupancyIndex> {
    pub(crate) id: PoolId,
    pub(crate) arena: SlotArena,
    pub(crate) occupancy: S,
    /// Generation of each slot, bumped on release.
    pub(crate) generations: Vec<u32>,
    /// Number of occupied slots.
    pub(crate) live: usize,
    stats: PoolStats,
    pub(crate) config: PoolConfig,
}

impl BitmapPool {
    /// Create a pool with a packed [`BitOccupancyIndex`].
    pub fn new(config: PoolConfig) -> Result<Self, PoolError> {
        let occupancy = BitOccupancyIndex::new(config.capacity)?;
        Self::with_surface(config, occupancy)
    }

    /// Create a quiet pool of `capacity` slots of `object_size` bytes.
    pub fn create(object_size: usize, capacity: usize) -> Result<Self, PoolError> {
        Self::new(PoolConfig::new(object_size, capacity))
    }
}

impl<S: BitSurface> BitmapPool<S> {
    /// Create a pool that tracks occupancy in a caller-supplied surface.
    ///
    /// The surface must have exactly `config.capacity` bits, all clear.
    pub fn with_surface(config: PoolConfig, occupancy: S) -> Result<Self, PoolError> {
        if config.object_size == 0 {
            return Err(PoolError::InvalidConfig {
                reason: "object_size must be non-zero".to_string(),
            });
        }
        if occupancy.len() != config.capacity {
            return Err(PoolError::InvalidConfig {
                reason: format!(
                    "occupancy surface has {} bits, capacity is {}",
                    occupancy.len(),
                    config.capacity
                ),
            });
        }
        if occupancy.count_ones() != 0 {
            return Err(PoolError::InvalidConfig {
                reason: "occupancy surface must start all clear".to_string(),
            });
        }

        let arena = SlotArena::new(config.object_size, config.capacity)?;
        let mut generations = Vec::new();
        generations
            .try_reserve_exact(config.capacity)
            .map_err(|_| PoolError::OutOfMemory {
                requested: config.capacity.saturating_mul(std::mem::size_of::<u32>()),
            })?;
        generations.resize(config.capacity, 0);

        let id = PoolId::next();
        if config.verbosity.debug() {
            tracing::debug!(
                pool = id.get(),
                object_size = config.object_size,
                capacity = config.capacity,
                "bitmap pool created"
            );
        }
        Ok(Self {
            id,
            arena,
            occupancy,
            generations,
            live: 0,
            stats: PoolStats::default(),
            config,
        })
    }

    /// This pool's identity, carried by every handle it issues.
    pub fn id(&self) -> PoolId {
        self.id
    }

    /// The configuration the pool was created with.
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// The occupancy surface.
    pub fn occupancy(&self) -> &S {
        &self.occupancy
    }

    /// Take the lowest-indexed free slot.
    ///
    /// Returns `Err(PoolError::Exhausted)` when every slot is in use.
    pub fn alloc(&mut self) -> Result<SlotHandle, PoolError> {
        let capacity = self.arena.capacity();
        let index = match self.occupancy.first_clear() {
            Some(index) if self.live < capacity && index < capacity => index,
            _ => {
                let err = PoolError::Exhausted { capacity };
                self.warn(&err, "alloc failed");
                return Err(err);
            }
        };

        self.occupancy.set_bit(index, true)?;
        self.arena.clear_slot(index);
        self.live += 1;
        self.stats.record_alloc(self.live);

        if self.config.verbosity.debug() {
            tracing::debug!(pool = self.id.get(), index, live = self.live, "alloc");
        }
        Ok(SlotHandle::new(self.id, index, self.generations[index]))
    }

    /// Release the slot named by `handle`.
    ///
    /// Rejects, without mutating anything, handles from another pool or
    /// past the arena (`InvalidPointer`), slots that are already free
    /// (`DoubleFree`), and handles whose slot was released or relocated
    /// since they were issued (`StaleHandle`).
    pub fn free(&mut self, handle: SlotHandle) -> Result<(), PoolError> {
        let result = self.check_free(handle);
        if let Err(err) = &result {
            self.warn(err, "free rejected");
            return result;
        }
        self.release(handle.index())?;
        self.stats.record_free();

        if self.config.verbosity.debug() {
            tracing::debug!(
                pool = self.id.get(),
                index = handle.index(),
                live = self.live,
                "free"
            );
        }
        Ok(())
    }

    /// Release the slot starting at byte `offset` within the arena.
    ///
    /// The offset must be a multiple of `object_size` and inside the arena
    /// (`InvalidPointer` otherwise); the slot must be occupied
    /// (`DoubleFree` otherwise). No generation check is possible here.
    pub fn free_at_offset(&mut self, offset: usize) -> Result<(), PoolError> {
        let handle = self.handle_at(offset)?;
        self.free(handle)
    }

    /// Resolve a byte offset to the current handle of that slot.
    ///
    /// Does not require the slot to be occupied.
    pub fn handle_at(&self, offset: usize) -> Result<SlotHandle, PoolError> {
        let index = self.arena.index_at(offset).map_err(|fault| {
            let err = PoolError::InvalidPointer { fault };
            self.warn(&err, "offset rejected");
            err
        })?;
        Ok(SlotHandle::new(self.id, index, self.generations[index]))
    }

    /// Byte offset of the slot named by `handle`.
    pub fn offset_of(&self, handle: SlotHandle) -> Result<usize, PoolError> {
        let index = self.check_handle(handle)?;
        Ok(self.arena.offset_of(index))
    }

    /// Read a live slot's bytes.
    pub fn get(&self, handle: SlotHandle) -> Result<&[u8], PoolError> {
        let index = self.resolve(handle)?;
        Ok(self.arena.slot(index))
    }

    /// Write a live slot's bytes.
    pub fn get_mut(&mut self, handle: SlotHandle) -> Result<&mut [u8], PoolError> {
        let index = self.resolve(handle)?;
        Ok(self.arena.slot_mut(index))
    }

    /// Whether slot `index` is currently allocated.
    pub fn is_occupied(&self, index: usize) -> Result<bool, PoolError> {
        self.occupancy.get_bit(index)
    }

    /// Handles of all live slots in index order.
    pub fn iter_live(&self) -> impl Iterator<Item = SlotHandle> + '_ {
        (0..self.arena.capacity())
            .filter(|&i| matches!(self.occupancy.get_bit(i), Ok(true)))
            .map(|i| SlotHandle::new(self.id, i, self.generations[i]))
    }

    /// Number of allocated slots.
    pub fn live_count(&self) -> usize {
        self.live
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

    /// Bytes held by the arena.
    pub fn memory_bytes(&self) -> usize {
        self.arena.memory_bytes()
    }

    /// Release the arena and occupancy index.
    ///
    /// Equivalent to dropping the pool; every outstanding handle becomes
    /// meaningless.
    pub fn destroy(self) {
        if self.config.verbosity.debug() {
            tracing::debug!(pool = self.id.get(), stats = %self.stats, "bitmap pool destroyed");
        }
    }

    /// Check that `handle` was issued by this pool for an existing slot.
    pub(crate) fn check_handle(&self, handle: SlotHandle) -> Result<usize, PoolError> {
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

    fn check_free(&self, handle: SlotHandle) -> Result<(), PoolError> {
        let index = self.check_handle(handle)?;
        if !self.occupancy.get_bit(index)? {
            return Err(PoolError::DoubleFree { index });
        }
        self.check_generation(handle, index)
    }

    /// Resolve a handle to the index of a live slot.
    fn resolve(&self, handle: SlotHandle) -> Result<usize, PoolError> {
        let index = self.check_handle(handle)?;
        if !self.occupancy.get_bit(index)? {
            return Err(PoolError::StaleHandle {
                index,
                handle_generation: handle.generation(),
                current_generation: self.generations[index],
            });
        }
        self.check_generation(handle, index)?;
        Ok(index)
    }

    fn check_generation(&self, handle: SlotHandle, index: usize) -> Result<(), PoolError> {
        let current = self.generations[index];
        if handle.generation() != current {
            return Err(PoolError::StaleHandle {
                index,
                handle_generation: handle.generation(),
                current_generation: current,
            });
        }
        Ok(())
    }

    /// Clear slot `index` and invalidate its handles, keeping `live` as is.
    ///
    /// The generation wraps from `u32::MAX` back to 0.
    pub(crate) fn vacate(&mut self, index: usize) -> Result<(), PoolError> {
        self.occupancy.set_bit(index, false)?;
        self.generations[index] = self.generations[index].wrapping_add(1);
        Ok(())
    }

    fn release(&mut self, index: usize) -> Result<(), PoolError> {
        self.vacate(index)?;
        self.live -= 1;
        Ok(())
    }

    pub(crate) fn warn(&self, err: &PoolError, what: &'static str) {
        if self.config.verbosity.warnings() {
            tracing::warn!(
                pool = self.id.get(),
                live = self.live,
                capacity = self.arena.capacity(),
                error = %err,
                "{}",
                what
            );
        }
    }
}

impl SlotPool for BitmapPool {
    fn with_config(config: PoolConfig) -> Result<Self, PoolError> {
        Self::new(config)
    }

    fn alloc(&mut self) -> Result<SlotHandle, PoolError> {
        BitmapPool::alloc(self)
    }

    fn free(&mut self, handle: SlotHandle) -> Result<(), PoolError> {
        BitmapPool::free(self, handle)
    }

    fn get(&self, handle: SlotHandle) -> Result<&[u8], PoolError> {
        BitmapPool::get(self, handle)
    }

    fn get_mut(&mut self, handle: SlotHandle) -> Result<&mut [u8], PoolError> {
        BitmapPool::get_mut(self, handle)
    }

    fn live_count(&self) -> usize {
        self.live
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

#[cfg(test)]
mod tests {
    use super::*;
    use slotpool_test_utils::{fill_pattern, has_pattern, VecBitSurface};

    #[test]
    fn create_three_slots_then_exhaust() {
        let mut pool = BitmapPool::create(8, 3).unwrap();
        assert_eq!(pool.live_count(), 0);
        let a = pool.alloc().unwrap();
        let b = pool.alloc().unwrap();
        let c = pool.alloc().unwrap();
        assert_eq!((a.index(), b.index(), c.index()), (0, 1, 2));
        assert_eq!(pool.alloc(), Err(PoolError::Exhausted { capacity: 3 }));

        pool.free(b).unwrap();
        let again = pool.alloc().unwrap();
        assert_eq!(again.index(), 1);
    }

    #[test]
    fn offsets_are_index_times_object_size() {
        let mut pool = BitmapPool::create(8, 3).unwrap();
        let _ = pool.alloc().unwrap();
        let b = pool.alloc().unwrap();
        assert_eq!(pool.offset_of(b), Ok(8));
        assert_eq!(pool.handle_at(8).unwrap(), b);
    }

    #[test]
    fn zero_object_size_is_rejected() {
        assert!(matches!(
            BitmapPool::create(0, 4),
            Err(PoolError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn overflowing_geometry_is_out_of_memory() {
        assert!(matches!(
            BitmapPool::create(usize::MAX, 2),
            Err(PoolError::OutOfMemory { .. })
        ));
    }

    #[test]
    fn zero_capacity_pool_is_always_exhausted() {
        let mut pool = BitmapPool::create(8, 0).unwrap();
        assert_eq!(pool.alloc(), Err(PoolError::Exhausted { capacity: 0 }));
    }

    #[test]
    fn double_free_is_rejected_without_mutation() {
        let mut pool = BitmapPool::create(16, 4).unwrap();
        let h = pool.alloc().unwrap();
        pool.free(h).unwrap();
        let before = pool.stats();
        assert_eq!(pool.free(h), Err(PoolError::DoubleFree { index: 0 }));
        assert_eq!(pool.stats(), before);
        assert_eq!(pool.live_count(), 0);
    }

    #[test]
    fn stale_handle_cannot_free_a_reused_slot() {
        let mut pool = BitmapPool::create(16, 4).unwrap();
        let old = pool.alloc().unwrap();
        pool.free(old).unwrap();
        let new = pool.alloc().unwrap();
        assert_eq!(new.index(), old.index());
        assert_ne!(new.generation(), old.generation());

        assert!(matches!(
            pool.free(old),
            Err(PoolError::StaleHandle { index: 0, .. })
        ));
        assert!(pool.get(new).is_ok());
        assert_eq!(pool.live_count(), 1);
    }

    #[test]
    fn foreign_handle_is_invalid() {
        let mut a = BitmapPool::create(8, 2).unwrap();
        let mut b = BitmapPool::create(8, 2).unwrap();
        let h = a.alloc().unwrap();
        let _ = b.alloc().unwrap();
        let err = b.free(h).unwrap_err();
        assert!(matches!(
            err,
            PoolError::InvalidPointer {
                fault: PointerFault::ForeignPool { .. }
            }
        ));
        assert_eq!(b.live_count(), 1);
    }

    #[test]
    fn free_at_offset_validates_alignment_and_bounds() {
        let mut pool = BitmapPool::create(8, 3).unwrap();
        let _ = pool.alloc().unwrap();
        let _ = pool.alloc().unwrap();

        assert_eq!(
            pool.free_at_offset(4),
            Err(PoolError::InvalidPointer {
                fault: PointerFault::Misaligned {
                    offset: 4,
                    object_size: 8
                }
            })
        );
        assert_eq!(
            pool.free_at_offset(24),
            Err(PoolError::InvalidPointer {
                fault: PointerFault::OutOfBounds {
                    index: 3,
                    capacity: 3
                }
            })
        );
        assert_eq!(
            pool.free_at_offset(16),
            Err(PoolError::DoubleFree { index: 2 })
        );
        pool.free_at_offset(8).unwrap();
        assert_eq!(pool.live_count(), 1);
        assert!(!pool.is_occupied(1).unwrap());
    }

    #[test]
    fn slot_data_survives_neighbour_traffic() {
        let mut pool = BitmapPool::create(32, 8).unwrap();
        let handles: Vec<_> = (0..8).map(|_| pool.alloc().unwrap()).collect();
        for (seed, &h) in handles.iter().enumerate() {
            fill_pattern(pool.get_mut(h).unwrap(), seed as u64);
        }
        pool.free(handles[3]).unwrap();
        pool.free(handles[5]).unwrap();
        let reused = pool.alloc().unwrap();
        fill_pattern(pool.get_mut(reused).unwrap(), 99);

        for (seed, &h) in handles.iter().enumerate() {
            if seed == 3 || seed == 5 {
                continue;
            }
            assert!(has_pattern(pool.get(h).unwrap(), seed as u64));
        }
    }

    #[test]
    fn alloc_returns_zeroed_slot() {
        let mut pool = BitmapPool::create(16, 1).unwrap();
        let h = pool.alloc().unwrap();
        pool.get_mut(h).unwrap().fill(0xAB);
        pool.free(h).unwrap();
        let h = pool.alloc().unwrap();
        assert!(pool.get(h).unwrap().iter().all(|&b| b == 0));
    }

    #[test]
    fn access_through_freed_handle_is_stale() {
        let mut pool = BitmapPool::create(16, 2).unwrap();
        let h = pool.alloc().unwrap();
        pool.free(h).unwrap();
        assert!(matches!(
            pool.get(h),
            Err(PoolError::StaleHandle { index: 0, .. })
        ));
        assert!(pool.get_mut(h).is_err());
    }

    #[test]
    fn stats_track_allocations_frees_and_peak() {
        let mut pool = BitmapPool::create(8, 4).unwrap();
        let a = pool.alloc().unwrap();
        let b = pool.alloc().unwrap();
        let _c = pool.alloc().unwrap();
        pool.free(a).unwrap();
        pool.free(b).unwrap();
        let _ = pool.alloc().unwrap();
        let stats = pool.stats();
        assert_eq!(stats.total_allocations, 4);
        assert_eq!(stats.total_frees, 2);
        assert_eq!(stats.peak_usage, 3);
        assert_eq!(stats.outstanding() as usize, pool.live_count());
    }

    #[test]
    fn iter_live_lists_occupied_slots() {
        let mut pool = BitmapPool::create(8, 5).unwrap();
        let handles: Vec<_> = (0..5).map(|_| pool.alloc().unwrap()).collect();
        pool.free(handles[1]).unwrap();
        pool.free(handles[3]).unwrap();
        let live: Vec<_> = pool.iter_live().map(|h| h.index()).collect();
        assert_eq!(live, vec![0, 2, 4]);
        assert_eq!(pool.occupancy().count_ones(), pool.live_count());
    }

    #[test]
    fn generation_wraps_after_u32_max_releases() {
        let mut pool = BitmapPool::create(8, 2).unwrap();
        pool.generations[1] = u32::MAX;
        let _ = pool.alloc().unwrap();
        let h = pool.alloc().unwrap();
        assert_eq!(h.generation(), u32::MAX);
        pool.free(h).unwrap();

        let again = pool.alloc().unwrap();
        assert_eq!(again.index(), 1);
        assert_eq!(again.generation(), 0);
        assert!(matches!(
            pool.get(h),
            Err(PoolError::StaleHandle {
                index: 1,
                handle_generation: u32::MAX,
                current_generation: 0,
            })
        ));
    }

    #[test]
    fn hand_built_handles_are_still_checked() {
        let mut pool = BitmapPool::create(8, 2).unwrap();
        let h = pool.alloc().unwrap();
        let foreign = SlotHandle::new(PoolId::next(), h.index(), h.generation());
        let wrong_generation = SlotHandle::new(pool.id(), h.index(), h.generation() + 1);
        let past_end = SlotHandle::new(pool.id(), 2, 0);

        assert!(matches!(
            pool.get(foreign),
            Err(PoolError::InvalidPointer {
                fault: PointerFault::ForeignPool { .. }
            })
        ));
        assert!(matches!(
            pool.free(wrong_generation),
            Err(PoolError::StaleHandle { index: 0, .. })
        ));
        assert!(matches!(
            pool.get(past_end),
            Err(PoolError::InvalidPointer {
                fault: PointerFault::OutOfBounds { index: 2, .. }
            })
        ));
        // Rebuilt with the issued values it is indistinguishable from `h`.
        let rebuilt = SlotHandle::new(pool.id(), h.index(), h.generation());
        assert_eq!(rebuilt, h);
        pool.free(rebuilt).unwrap();
        assert_eq!(pool.live_count(), 0);
    }

    #[test]
    fn custom_surface_is_accepted() {
        let surface = VecBitSurface::new(4);
        let mut pool = BitmapPool::with_surface(PoolConfig::new(8, 4), surface).unwrap();
        let a = pool.alloc().unwrap();
        let b = pool.alloc().unwrap();
        assert_eq!((a.index(), b.index()), (0, 1));
        pool.free(a).unwrap();
        assert_eq!(pool.alloc().unwrap().index(), 0);
    }

    #[test]
    fn mismatched_surface_is_rejected() {
        let surface = VecBitSurface::new(3);
        assert!(matches!(
            BitmapPool::with_surface(PoolConfig::new(8, 4), surface),
            Err(PoolError::InvalidConfig { .. })
        ));

        let mut dirty = VecBitSurface::new(4);
        dirty.set_bit(2, true).unwrap();
        assert!(matches!(
            BitmapPool::with_surface(PoolConfig::new(8, 4), dirty),
            Err(PoolError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn trait_object_style_use() {
        fn fill<P: SlotPool>(pool: &mut P) -> usize {
            let mut n = 0;
            while pool.alloc().is_ok() {
                n += 1;
            }
            n
        }
        let mut pool = BitmapPool::with_config(PoolConfig::new(8, 17)).unwrap();
        assert_eq!(fill(&mut pool), 17);
        assert!(pool.is_full());
        assert_eq!(pool.available(), 0);
    }

    #[cfg(not(miri))]
    mod proptests {
        use super::*;
        use proptest::prelude::*;
        use slotpool_test_utils::{pool_ops, FirstFitModel, PoolOp};

        proptest! {
            #[test]
            fn alloc_succeeds_exactly_capacity_times(
                object_size in 1usize..64,
                capacity in 0usize..200,
            ) {
                let mut pool = BitmapPool::create(object_size, capacity).unwrap();
                for i in 0..capacity {
                    prop_assert_eq!(pool.alloc().unwrap().index(), i);
                }
                prop_assert!(pool.alloc().unwrap_err().is_exhausted());
                prop_assert_eq!(pool.live_count(), capacity);
            }

            #[test]
            fn matches_first_fit_model(
                capacity in 1usize..70,
                ops in pool_ops(300),
            ) {
                let mut pool = BitmapPool::create(8, capacity).unwrap();
                let mut model = FirstFitModel::new(capacity);
                let mut handles: Vec<SlotHandle> = Vec::new();
                let mut peak = 0;

                for op in ops {
                    match op {
                        PoolOp::Alloc => {
                            let got = pool.alloc().ok();
                            let expected = model.alloc();
                            prop_assert_eq!(got.map(|h| h.index()), expected);
                            if let Some(h) = got {
                                handles.push(h);
                            }
                        }
                        PoolOp::Free(pick) => {
                            if handles.is_empty() {
                                continue;
                            }
                            let h = handles.swap_remove(pick % handles.len());
                            pool.free(h).unwrap();
                            model.free(h.index());
                        }
                    }
                    peak = peak.max(pool.live_count());
                    prop_assert_eq!(pool.live_count(), model.live());
                    prop_assert_eq!(pool.occupancy().count_ones(), pool.live_count());
                    prop_assert!(pool.live_count() <= capacity);
                    let stats = pool.stats();
                    prop_assert_eq!(stats.outstanding() as usize, pool.live_count());
                    prop_assert_eq!(stats.peak_usage, peak);
                }
            }
        }
    }
}
