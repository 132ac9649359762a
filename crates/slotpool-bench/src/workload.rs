//! Pool-agnostic allocation workloads.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use slotpool_core::{PoolError, SlotHandle, SlotPool};

/// Object count of the reference allocation benchmark.
pub const BENCH_OBJECTS: usize = 5000;

/// Object size in bytes of the reference allocation benchmark.
pub const BENCH_OBJECT_SIZE: usize = 1000;

/// Allocate `count` slots, stopping at the first failure.
pub fn fill<P: SlotPool>(pool: &mut P, count: usize) -> Result<Vec<SlotHandle>, PoolError> {
    let mut handles = Vec::with_capacity(count);
    for _ in 0..count {
        handles.push(pool.alloc()?);
    }
    Ok(handles)
}

/// Free every handle in `handles`.
pub fn release_all<P: SlotPool>(pool: &mut P, handles: Vec<SlotHandle>) -> Result<(), PoolError> {
    for handle in handles {
        pool.free(handle)?;
    }
    Ok(())
}

/// `0..count` in a random order determined by `seed`.
pub fn shuffled(count: usize, seed: u64) -> Vec<usize> {
    let mut order: Vec<usize> = (0..count).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    order.shuffle(&mut rng);
    order
}

/// Free the handles at positions `victims`, then allocate replacements
/// into the same positions.
///
/// Returns the number of slots replaced. `victims` must not repeat a
/// position.
pub fn churn<P: SlotPool>(
    pool: &mut P,
    handles: &mut [SlotHandle],
    victims: &[usize],
) -> Result<usize, PoolError> {
    for &v in victims {
        pool.free(handles[v])?;
    }
    for &v in victims {
        handles[v] = pool.alloc()?;
    }
    Ok(victims.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotpool_bitmap::BitmapPool;
    use slotpool_freelist::FreeListPool;

    #[test]
    fn shuffle_is_a_seeded_permutation() {
        let a = shuffled(100, 7);
        let b = shuffled(100, 7);
        assert_eq!(a, b);
        let mut sorted = a.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..100).collect::<Vec<_>>());
    }

    #[test]
    fn fill_stops_at_capacity() {
        let mut pool = BitmapPool::create(16, 4).unwrap();
        assert_eq!(fill(&mut pool, 4).unwrap().len(), 4);
        assert!(fill(&mut pool, 1).unwrap_err().is_exhausted());
    }

    #[test]
    fn churn_keeps_pool_full() {
        let mut pool = FreeListPool::create(16, 32).unwrap();
        let mut handles = fill(&mut pool, 32).unwrap();
        let victims: Vec<usize> = shuffled(32, 3).into_iter().take(10).collect();
        assert_eq!(churn(&mut pool, &mut handles, &victims).unwrap(), 10);
        assert_eq!(pool.live_count(), 32);
        assert_eq!(pool.stats().total_allocations, 42);

        release_all(&mut pool, handles).unwrap();
        assert_eq!(pool.live_count(), 0);
    }
}
