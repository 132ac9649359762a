//! slotpool: fixed-capacity object pools over pre-allocated slot arenas.
//!
//! This is the facade crate re-exporting the public API of the slotpool
//! sub-crates. Two pools share one handle, error and statistics model:
//!
//! - [`BitmapPool`]: one occupancy bit per slot, first-fit allocation,
//!   double-free detection, generation-checked handles and
//!   [`defragment`](BitmapPool::defragment).
//! - [`FreeListPool`]: an intrusive singly-linked free list threaded
//!   through the free slots themselves; O(1) LIFO allocation and release.
//!
//! # Quick start
//!
//! ```rust
//! use slotpool::prelude::*;
//!
//! let mut pool = BitmapPool::create(8, 3).unwrap();
//! let a = pool.alloc().unwrap();
//! let b = pool.alloc().unwrap();
//! pool.get_mut(b).unwrap().copy_from_slice(&[7; 8]);
//!
//! pool.free(a).unwrap();
//! assert_eq!(pool.free(a), Err(PoolError::DoubleFree { index: 0 }));
//!
//! let moves = pool.defragment().unwrap();
//! assert_eq!(moves[0].from, b);
//! assert_eq!(pool.get(moves[0].to).unwrap(), &[7u8; 8]);
//! println!("{}", pool.stats());
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `slotpool-core` | Errors, config, handles, stats, arena, traits |
//! | [`bitmap`] | `slotpool-bitmap` | `BitOccupancyIndex`, `BitmapPool` |
//! | [`freelist`] | `slotpool-freelist` | Link codec, `FreeListPool` |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Shared types and traits (`slotpool-core`).
pub use slotpool_core as types;

/// Bitmap-indexed pool (`slotpool-bitmap`).
pub use slotpool_bitmap as bitmap;

/// Intrusive free-list pool (`slotpool-freelist`).
pub use slotpool_freelist as freelist;

pub use slotpool_bitmap::{BitOccupancyIndex, BitmapPool};
pub use slotpool_freelist::FreeListPool;

/// Common imports for typical slotpool usage.
///
/// ```rust
/// use slotpool::prelude::*;
/// ```
pub mod prelude {
    // Pools
    pub use slotpool_bitmap::{BitOccupancyIndex, BitmapPool};
    pub use slotpool_freelist::FreeListPool;

    // Shared types and traits
    pub use slotpool_core::{
        BitSurface, PoolConfig, PoolError, PoolStats, Relocation, SlotHandle, SlotPool,
        Verbosity,
    };
}
