//! Fixed-capacity pool with an intrusive free list.
//!
//! ```text
//! FreeListPool
//! ├── SlotArena  (capacity * object_size bytes)
//! └── head ──► slot 0 ──► slot 1 ──► ... ──► slot n-1 ──► NIL
//! ```
//!
//! Each free slot stores the index of the next free slot in its own first
//! bytes, so the pool needs no side table and `alloc`/`free` are O(1).
//! Slots must be at least [`link::LINK_WIDTH`] bytes. The trade-off is that
//! a double free cannot be detected in general; see [`FreeListPool`].

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod link;
pub mod pool;

pub use link::LINK_WIDTH;
pub use pool::{FreeIter, FreeListPool};
