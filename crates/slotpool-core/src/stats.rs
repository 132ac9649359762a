//! Allocation counters shared by both pool variants.

use std::fmt;

/// Snapshot of a pool's allocation history.
///
/// `total_allocations` and `total_frees` only ever grow. `peak_usage` is the
/// running maximum of the live count.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Successful `alloc` calls.
    pub total_allocations: u64,
    /// Successful `free` calls.
    pub total_frees: u64,
    /// Highest live count observed.
    pub peak_usage: usize,
}

impl PoolStats {
    /// Record a successful allocation that brought the pool to `live` slots.
    pub fn record_alloc(&mut self, live: usize) {
        self.total_allocations += 1;
        self.peak_usage = self.peak_usage.max(live);
    }

    /// Record a successful free.
    pub fn record_free(&mut self) {
        self.total_frees += 1;
    }

    /// Allocations not yet matched by a free.
    pub fn outstanding(&self) -> u64 {
        self.total_allocations - self.total_frees
    }
}

impl fmt::Display for PoolStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "allocations: {}, frees: {}, in use: {}, peak: {}",
            self.total_allocations,
            self.total_frees,
            self.outstanding(),
            self.peak_usage
        )
    }
}
