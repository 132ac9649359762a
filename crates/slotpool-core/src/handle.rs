//! Slot handles and pool identity.
//!
//! A [`SlotHandle`] names one slot of one pool. It carries the issuing
//! pool's [`PoolId`] so handles cannot be replayed against another pool,
//! and a `generation` stamp so pools that track per-slot generations can
//! reject handles whose slot was released or relocated in O(1).

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counter for unique [`PoolId`] allocation.
static POOL_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique per-instance identifier for a pool.
///
/// Allocated from a monotonic atomic counter via [`PoolId::next`]. Two
/// pools alive in the same process never share an ID, even if they have
/// identical geometry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PoolId(u64);

impl PoolId {
    /// Allocate a fresh, unique pool ID. Thread-safe.
    pub fn next() -> Self {
        Self(POOL_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw counter value.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for PoolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Checked reference to a slot, returned by `alloc`.
///
/// Handles are plain values: copying one does not extend the slot's
/// lifetime. A handle is valid until the matching `free`, until a
/// defragment pass relocates its slot, or until the pool is dropped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[must_use]
pub struct SlotHandle {
    pool: PoolId,
    index: usize,
    generation: u32,
}

impl SlotHandle {
    /// Assemble a handle from its parts.
    ///
    /// Pools use this when issuing slots. Nothing stops other code from
    /// building one, and a handle rebuilt with the values a pool issued is
    /// equal to the original. Pools still validate every handle they are
    /// given against their own id, capacity and (for generation-tracking
    /// pools) the slot's current generation.
    #[doc(hidden)]
    pub fn new(pool: PoolId, index: usize, generation: u32) -> Self {
        Self {
            pool,
            index,
            generation,
        }
    }

    /// The pool that issued this handle.
    pub fn pool(&self) -> PoolId {
        self.pool
    }

    /// Slot index within the arena.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Generation of the slot when this handle was issued.
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Display for SlotHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SlotHandle(pool={}, idx={}, gen={})",
            self.pool, self.index, self.generation
        )
    }
}

/// A slot moved by a compaction pass.
///
/// `from` is stale after the move; callers holding it must switch to `to`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Relocation {
    /// Handle of the slot before the move (now stale).
    pub from: SlotHandle,
    /// Handle of the slot the contents were copied into.
    pub to: SlotHandle,
}
