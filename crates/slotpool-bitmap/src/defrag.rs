//! In-place compaction for [`BitmapPool`].
//!
//! Compaction walks the slots from the low end. Each hole below the live
//! count is filled with the contents of the highest occupied slot, which is
//! then vacated. Because the high-end search frontier only ever moves down,
//! the whole pass is a single sweep of the occupancy surface from each end.
//!
//! Every moved slot gets a new handle. The old handle is stale from then
//! on, and the pass returns a [`Relocation`] per move so callers can
//! re-resolve what they hold.

use slotpool_core::{BitSurface, PoolError, Relocation, SlotHandle};

use crate::pool::BitmapPool;

impl<S: BitSurface> BitmapPool<S> {
    /// Move every live slot into `[0, live_count)`.
    ///
    /// Afterwards slots `[0, live_count)` are occupied and the rest are
    /// free; the live count and the allocation counters are unchanged.
    /// Returns one [`Relocation`] per moved slot, in the order the moves
    /// were made.
    ///
    /// Any handle named as a `from` in the result is stale: accessing or
    /// freeing through it returns [`PoolError::StaleHandle`] (or
    /// [`PoolError::DoubleFree`] if nothing was moved back into the slot).
    pub fn defragment(&mut self) -> Result<Vec<Relocation>, PoolError> {
        let mut relocations = Vec::new();
        // Nothing at or above `upper` is occupied.
        let mut upper = self.arena.capacity();
        let mut hole = 0;

        while hole < self.live {
            if self.occupancy.get_bit(hole)? {
                hole += 1;
                continue;
            }
            let Some(src) = self
                .occupancy
                .last_set_below(upper)
                .filter(|&src| src > hole)
            else {
                break;
            };

            let from = SlotHandle::new(self.id, src, self.generations[src]);
            self.arena.copy_slot(src, hole);
            self.occupancy.set_bit(hole, true)?;
            self.vacate(src)?;
            relocations.push(Relocation {
                from,
                to: SlotHandle::new(self.id, hole, self.generations[hole]),
            });

            upper = src;
            hole += 1;
        }

        if self.config.verbosity.debug() {
            tracing::debug!(
                pool = self.id.get(),
                moved = relocations.len(),
                live = self.live,
                "defragment"
            );
        }
        Ok(relocations)
    }

    /// Whether the live slots already form the prefix `[0, live_count)`.
    pub fn is_compact(&self) -> bool {
        match self.occupancy.last_set_below(self.arena.capacity()) {
            Some(last) => last + 1 == self.live,
            None => self.live == 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotpool_core::PoolConfig;
    use slotpool_test_utils::{fill_pattern, has_pattern, VecBitSurface};

    /// Allocate `capacity` slots, stamp each with its index, then free `holes`.
    fn holey_pool(capacity: usize, holes: &[usize]) -> (BitmapPool, Vec<SlotHandle>) {
        let mut pool = BitmapPool::create(16, capacity).unwrap();
        let handles: Vec<_> = (0..capacity).map(|_| pool.alloc().unwrap()).collect();
        for (i, &h) in handles.iter().enumerate() {
            fill_pattern(pool.get_mut(h).unwrap(), i as u64);
        }
        for &i in holes {
            pool.free(handles[i]).unwrap();
        }
        (pool, handles)
    }

    #[test]
    fn compacts_interior_holes() {
        let (mut pool, _) = holey_pool(8, &[1, 3, 4]);
        assert!(!pool.is_compact());

        let moves = pool.defragment().unwrap();
        assert_eq!(pool.live_count(), 5);
        assert!(pool.is_compact());
        for i in 0..8 {
            assert_eq!(pool.is_occupied(i).unwrap(), i < 5);
        }
        // Highest live slots fill the lowest holes.
        let pairs: Vec<_> = moves
            .iter()
            .map(|r| (r.from.index(), r.to.index()))
            .collect();
        assert_eq!(pairs, vec![(7, 1), (6, 3), (5, 4)]);
    }

    #[test]
    fn moved_contents_follow_relocations() {
        let (mut pool, handles) = holey_pool(10, &[0, 2, 5]);
        let moves = pool.defragment().unwrap();

        for r in &moves {
            let original = r.from.index() as u64;
            assert!(has_pattern(pool.get(r.to).unwrap(), original));
        }
        // Unmoved handles stay valid.
        let moved: Vec<_> = moves.iter().map(|r| r.from).collect();
        for (i, &h) in handles.iter().enumerate() {
            if [0, 2, 5].contains(&i) || moved.contains(&h) {
                continue;
            }
            assert!(has_pattern(pool.get(h).unwrap(), i as u64));
        }
    }

    #[test]
    fn relocated_handles_are_stale() {
        let (mut pool, _) = holey_pool(4, &[0]);
        let moves = pool.defragment().unwrap();
        assert_eq!(moves.len(), 1);
        let stale = moves[0].from;
        assert!(matches!(
            pool.get(stale),
            Err(PoolError::StaleHandle { index: 3, .. })
        ));
        assert_eq!(pool.free(stale), Err(PoolError::DoubleFree { index: 3 }));
        pool.free(moves[0].to).unwrap();
        assert_eq!(pool.live_count(), 2);
    }

    #[test]
    fn counters_are_unchanged() {
        let (mut pool, _) = holey_pool(6, &[1, 2]);
        let before = pool.stats();
        pool.defragment().unwrap();
        assert_eq!(pool.stats(), before);
        assert_eq!(pool.live_count(), 4);
    }

    #[test]
    fn compact_pool_is_untouched() {
        let (mut pool, _) = holey_pool(6, &[4, 5]);
        assert!(pool.is_compact());
        assert!(pool.defragment().unwrap().is_empty());
    }

    #[test]
    fn empty_and_full_pools() {
        let mut empty = BitmapPool::create(8, 5).unwrap();
        assert!(empty.defragment().unwrap().is_empty());
        assert!(empty.is_compact());

        let (mut full, _) = holey_pool(5, &[]);
        assert!(full.defragment().unwrap().is_empty());
        assert!(full.is_compact());
    }

    #[test]
    fn alloc_after_defragment_continues_the_prefix() {
        let (mut pool, _) = holey_pool(6, &[0, 1]);
        pool.defragment().unwrap();
        assert_eq!(pool.alloc().unwrap().index(), 4);
        assert_eq!(pool.alloc().unwrap().index(), 5);
        assert!(pool.alloc().unwrap_err().is_exhausted());
    }

    #[test]
    fn compacts_through_a_substituted_surface() {
        let mut pool =
            BitmapPool::with_surface(PoolConfig::new(8, 20), VecBitSurface::new(20)).unwrap();
        let handles: Vec<_> = (0..20).map(|_| pool.alloc().unwrap()).collect();
        for (i, &h) in handles.iter().enumerate() {
            fill_pattern(pool.get_mut(h).unwrap(), i as u64);
        }
        for i in [0, 3, 7, 8, 15] {
            pool.free(handles[i]).unwrap();
        }
        assert!(!pool.is_compact());

        let moves = pool.defragment().unwrap();
        assert!(pool.is_compact());
        assert_eq!(pool.live_count(), 15);
        for i in 0..20 {
            assert_eq!(pool.is_occupied(i).unwrap(), i < 15);
        }
        let pairs: Vec<_> = moves
            .iter()
            .map(|r| (r.from.index(), r.to.index()))
            .collect();
        assert_eq!(pairs, vec![(19, 0), (18, 3), (17, 7), (16, 8)]);
        for r in &moves {
            assert!(has_pattern(pool.get(r.to).unwrap(), r.from.index() as u64));
            assert!(pool.get(r.from).is_err());
        }
    }

    #[cfg(not(miri))]
    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn defragment_yields_occupied_prefix(
                keep in proptest::collection::vec(any::<bool>(), 0..150),
            ) {
                let holes: Vec<usize> = keep
                    .iter()
                    .enumerate()
                    .filter(|&(_, &k)| !k)
                    .map(|(i, _)| i)
                    .collect();
                let (mut pool, _) = holey_pool(keep.len(), &holes);
                let live = pool.live_count();

                let moves = pool.defragment().unwrap();

                prop_assert_eq!(pool.live_count(), live);
                prop_assert!(pool.is_compact());
                for i in 0..keep.len() {
                    prop_assert_eq!(pool.is_occupied(i).unwrap(), i < live);
                }
                for r in &moves {
                    prop_assert!(r.from.index() >= live);
                    prop_assert!(r.to.index() < live);
                    prop_assert!(keep[r.from.index()]);
                    prop_assert!(has_pattern(pool.get(r.to).unwrap(), r.from.index() as u64));
                }
            }
        }
    }
}
