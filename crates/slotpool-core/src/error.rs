//! Error types for pool creation, allocation, and release.

use std::error::Error;
use std::fmt;

use crate::handle::PoolId;

/// Why a handle or byte offset failed to resolve to a slot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PointerFault {
    /// The handle was issued by a different pool.
    ForeignPool {
        /// Pool the handle claims to belong to.
        handle_pool: PoolId,
        /// Pool the operation was invoked on.
        pool: PoolId,
    },
    /// The slot index lies past the end of the arena.
    OutOfBounds {
        /// The offending slot index.
        index: usize,
        /// Number of slots in the arena.
        capacity: usize,
    },
    /// The byte offset does not start a slot.
    Misaligned {
        /// The offending byte offset.
        offset: usize,
        /// Size of one slot in bytes.
        object_size: usize,
    },
}

impl fmt::Display for PointerFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ForeignPool { handle_pool, pool } => {
                write!(f, "handle belongs to pool {handle_pool}, not pool {pool}")
            }
            Self::OutOfBounds { index, capacity } => {
                write!(f, "slot {index} out of bounds (capacity {capacity})")
            }
            Self::Misaligned {
                offset,
                object_size,
            } => {
                write!(
                    f,
                    "offset {offset} is not a multiple of object size {object_size}"
                )
            }
        }
    }
}

/// Errors that can occur during pool operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PoolError {
    /// The arena or occupancy index could not be allocated.
    OutOfMemory {
        /// Number of bytes requested (`usize::MAX` if the size overflowed).
        requested: usize,
    },
    /// Every slot is in use. Recoverable: free a slot and retry.
    Exhausted {
        /// Total number of slots in the pool.
        capacity: usize,
    },
    /// A handle or offset that does not name a slot of this pool.
    InvalidPointer {
        /// What was wrong with it.
        fault: PointerFault,
    },
    /// The slot is already free.
    DoubleFree {
        /// The slot that was released twice.
        index: usize,
    },
    /// The slot was released or relocated after the handle was issued.
    StaleHandle {
        /// The slot the handle points at.
        index: usize,
        /// Generation recorded in the handle.
        handle_generation: u32,
        /// Current generation of the slot.
        current_generation: u32,
    },
    /// Slots are too small to hold an intrusive free-list link.
    ObjectTooSmall {
        /// Requested slot size in bytes.
        object_size: usize,
        /// Minimum slot size in bytes.
        required: usize,
    },
    /// A checked bit access past the end of an occupancy surface.
    IndexOutOfRange {
        /// The offending bit index.
        index: usize,
        /// Number of addressable bits.
        len: usize,
    },
    /// The pool configuration was rejected at construction.
    InvalidConfig {
        /// Human-readable description.
        reason: String,
    },
    /// A free-list link names neither a slot nor the end-of-list sentinel.
    ///
    /// Only reachable after a caller broke the free-list contract (a
    /// double free, or a write through a handle that was already freed).
    FreeListCorrupted {
        /// Slot whose link field is damaged.
        slot: usize,
        /// The link value that was read.
        link: usize,
    },
}

impl PoolError {
    /// Whether the caller can recover by freeing a slot and retrying.
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted { .. })
    }
}

impl fmt::Display for PoolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfMemory { requested } => {
                write!(f, "out of memory: could not allocate {requested} bytes")
            }
            Self::Exhausted { capacity } => {
                write!(f, "pool exhausted: all {capacity} slots in use")
            }
            Self::InvalidPointer { fault } => write!(f, "invalid pointer: {fault}"),
            Self::DoubleFree { index } => write!(f, "double free of slot {index}"),
            Self::StaleHandle {
                index,
                handle_generation,
                current_generation,
            } => {
                write!(
                    f,
                    "stale handle for slot {index}: generation {handle_generation}, current {current_generation}"
                )
            }
            Self::ObjectTooSmall {
                object_size,
                required,
            } => {
                write!(
                    f,
                    "object size {object_size} too small: free-list slots need at least {required} bytes"
                )
            }
            Self::IndexOutOfRange { index, len } => {
                write!(f, "bit index {index} out of range (len {len})")
            }
            Self::InvalidConfig { reason } => write!(f, "invalid pool config: {reason}"),
            Self::FreeListCorrupted { slot, link } => {
                write!(f, "free list corrupted: slot {slot} links to {link}")
            }
        }
    }
}

impl Error for PoolError {}

impl From<PointerFault> for PoolError {
    fn from(fault: PointerFault) -> Self {
        Self::InvalidPointer { fault }
    }
}
