//! Particle simulation on a free-list pool.
//!
//! Runs 1000 particles for 200 frames and prints the oldest particle every
//! 25 frames, followed by the pool's allocation counters. Set `RUST_LOG`
//! (e.g. `RUST_LOG=debug`) to see per-frame and per-slot events.

use slotpool_bench::ParticleSystem;
use slotpool_core::Verbosity;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const PARTICLES: usize = 1000;
const FRAMES: u64 = 200;

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!("=== slotpool particle simulation ===\n");

    let mut system = ParticleSystem::new(PARTICLES, Verbosity::Warnings).unwrap();
    println!(
        "{} particles in {} bytes of pool memory\n",
        system.live(),
        system.pool().memory_bytes()
    );

    let mut expired = 0;
    for _ in 0..FRAMES {
        let report = system.frame().unwrap();
        expired += report.expired;

        if report.frame % 25 == 0 || report.frame == FRAMES {
            if let Some(p) = system.first().unwrap() {
                println!(
                    "  frame {:>3}: first x={:>7.2} y={:>7.2} lifetime={:>4.0}, live={}, expired this frame={}",
                    report.frame, p.x, p.y, p.lifetime, report.live, report.expired,
                );
            }
        }
    }

    println!("\n{expired} particles expired over {FRAMES} frames");
    println!("pool: {}", system.pool().stats());
}
