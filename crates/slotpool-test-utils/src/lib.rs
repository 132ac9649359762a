//! Test utilities and mock types for slotpool development.
//!
//! - [`VecBitSurface`]: an unpacked [`BitSurface`] using only the trait's
//!   default scans, for exercising pools against a substituted surface.
//! - [`FirstFitModel`] / [`LifoModel`]: naive reference allocators that
//!   predict which slot index a pool should hand out next.
//! - [`fill_pattern`] / [`has_pattern`]: seed-derived slot contents for
//!   aliasing and relocation checks.
//! - [`PoolOp`] / [`pool_ops`]: proptest strategy for alloc/free sequences.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod model;

pub use model::{pool_ops, FirstFitModel, LifoModel, PoolOp};

use slotpool_core::{BitSurface, PoolError};

/// One `bool` per bit, no packing.
///
/// Relies on the per-bit default implementations of
/// [`BitSurface::first_clear`] and [`BitSurface::last_set_below`].
#[derive(Clone, Debug, Default)]
pub struct VecBitSurface {
    bits: Vec<bool>,
}

impl VecBitSurface {
    pub fn new(len: usize) -> Self {
        Self {
            bits: vec![false; len],
        }
    }
}

impl BitSurface for VecBitSurface {
    fn len(&self) -> usize {
        self.bits.len()
    }

    fn get_bit(&self, index: usize) -> Result<bool, PoolError> {
        self.bits
            .get(index)
            .copied()
            .ok_or(PoolError::IndexOutOfRange {
                index,
                len: self.bits.len(),
            })
    }

    fn set_bit(&mut self, index: usize, value: bool) -> Result<(), PoolError> {
        let len = self.bits.len();
        let bit = self
            .bits
            .get_mut(index)
            .ok_or(PoolError::IndexOutOfRange { index, len })?;
        *bit = value;
        Ok(())
    }
}

/// Fill `slot` with bytes derived from `seed`.
pub fn fill_pattern(slot: &mut [u8], seed: u64) {
    for (i, byte) in slot.iter_mut().enumerate() {
        *byte = pattern_byte(seed, i);
    }
}

/// Whether `slot` holds exactly what [`fill_pattern`] wrote for `seed`.
pub fn has_pattern(slot: &[u8], seed: u64) -> bool {
    slot.iter()
        .enumerate()
        .all(|(i, &byte)| byte == pattern_byte(seed, i))
}

fn pattern_byte(seed: u64, i: usize) -> u8 {
    // Distinct seeds differ in the first byte for seeds below 251.
    (seed.wrapping_mul(31).wrapping_add(i as u64 * 7 + 1) % 251) as u8
}
