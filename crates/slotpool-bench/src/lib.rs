//! Workloads for exercising the slotpool allocators.
//!
//! - [`particles`]: a particle simulation that keeps every live particle in
//!   a [`FreeListPool`](slotpool_freelist::FreeListPool) slot, driven frame
//!   by frame through a ring of handles.
//! - [`workload`]: pool-agnostic fill/churn helpers shared by the criterion
//!   benchmarks, with seeded shuffles so runs are reproducible.

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod particles;
pub mod workload;

pub use particles::{FrameReport, Particle, ParticleSystem, PARTICLE_BYTES};
pub use workload::{churn, fill, release_all, shuffled, BENCH_OBJECTS, BENCH_OBJECT_SIZE};
