//! Bitmap-indexed fixed-capacity pool.
//!
//! ```text
//! BitmapPool
//! ├── SlotArena          (capacity * object_size bytes, zero-filled)
//! ├── BitOccupancyIndex  (one bit per slot, 1 = in use)
//! └── generations        (per-slot u32, bumped on release)
//! ```
//!
//! Allocation scans the occupancy index a byte at a time for the first
//! byte that is not `0xFF` and takes its lowest clear bit. Freeing is O(1)
//! and detects double frees. [`BitmapPool::defragment`] compacts the live
//! slots into a prefix of the arena and reports every move.
//!
//! The pool is single-owner: every mutating call takes `&mut self`, and the
//! scan-then-mark sequence in `alloc` is not atomic. Callers that share a
//! pool across threads must lock around whole calls.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

mod defrag;
pub mod occupancy;
pub mod pool;

pub use occupancy::BitOccupancyIndex;
pub use pool::BitmapPool;
