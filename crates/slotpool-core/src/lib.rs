//! Core types and traits for the slotpool fixed-capacity allocators.
//!
//! This is the leaf crate with zero internal dependencies. It defines the
//! pieces shared by both pool variants:
//!
//! - [`SlotArena`]: the single zero-initialised byte buffer backing a pool.
//! - [`SlotHandle`] / [`PoolId`]: checked, generation-stamped slot references
//!   handed out instead of raw addresses.
//! - [`PoolStats`]: allocation counters and peak usage.
//! - [`PoolConfig`] / [`Verbosity`]: creation-time parameters.
//! - [`PoolError`]: the error taxonomy for every pool operation.
//! - [`BitSurface`] / [`SlotPool`]: the seams between pools, occupancy
//!   tracking, and callers.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod arena;
pub mod config;
pub mod error;
pub mod handle;
pub mod stats;
pub mod traits;

pub use arena::SlotArena;
pub use config::{PoolConfig, Verbosity};
pub use error::{PointerFault, PoolError};
pub use handle::{PoolId, Relocation, SlotHandle};
pub use stats::PoolStats;
pub use traits::{BitSurface, SlotPool};
