//! Reference allocators for differential testing.
//!
//! The models track only slot indices, with the simplest possible data
//! structures, so a pool under test can be checked operation by operation.

use proptest::prelude::*;

/// One step of a randomly generated workload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PoolOp {
    /// Allocate one slot.
    Alloc,
    /// Free one of the currently held handles, chosen by `pick % held`.
    Free(usize),
}

/// Workloads of up to `max_len` operations, roughly 60% allocations.
pub fn pool_ops(max_len: usize) -> impl Strategy<Value = Vec<PoolOp>> {
    let op = prop_oneof![
        3 => Just(PoolOp::Alloc),
        2 => any::<usize>().prop_map(PoolOp::Free),
    ];
    proptest::collection::vec(op, 0..=max_len)
}

/// First-fit model: always hands out the lowest free index.
#[derive(Clone, Debug)]
pub struct FirstFitModel {
    used: Vec<bool>,
}

impl FirstFitModel {
    pub fn new(capacity: usize) -> Self {
        Self {
            used: vec![false; capacity],
        }
    }

    pub fn alloc(&mut self) -> Option<usize> {
        let index = self.used.iter().position(|&u| !u)?;
        self.used[index] = true;
        Some(index)
    }

    /// Panics if `index` is not allocated.
    pub fn free(&mut self, index: usize) {
        assert!(self.used[index], "model: slot {index} is not allocated");
        self.used[index] = false;
    }

    pub fn live(&self) -> usize {
        self.used.iter().filter(|&&u| u).count()
    }
}

/// Free-list model: a stack of free indices, initially `0` on top.
#[derive(Clone, Debug)]
pub struct LifoModel {
    free: Vec<usize>,
    capacity: usize,
}

impl LifoModel {
    pub fn new(capacity: usize) -> Self {
        Self {
            free: (0..capacity).rev().collect(),
            capacity,
        }
    }

    pub fn alloc(&mut self) -> Option<usize> {
        self.free.pop()
    }

    pub fn free(&mut self, index: usize) {
        self.free.push(index);
    }

    pub fn live(&self) -> usize {
        self.capacity - self.free.len()
    }
}
