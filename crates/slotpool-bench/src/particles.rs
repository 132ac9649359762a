//! Particle simulation backed by a [`FreeListPool`].
//!
//! Every live particle occupies one pool slot. The system keeps the live
//! handles in a ring (oldest first); each frame rotates the whole ring once,
//! releasing expired particles back to the pool and advancing the rest,
//! then spawns new particles until the ring is full again. Expired slots
//! are handed straight back out by the next spawn, which is exactly the
//! churn a free list is good at.

use std::collections::VecDeque;

use slotpool_core::{PoolConfig, PoolError, SlotHandle, Verbosity};
use slotpool_freelist::{FreeListPool, LINK_WIDTH};

/// Bytes a particle occupies in its slot.
pub const PARTICLE_BYTES: usize = 4 * 8 + 4 + 1;

const LIFETIME_AT: usize = 32;
const ACTIVE_AT: usize = 36;

/// A point particle with a constant velocity and a frame countdown.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Particle {
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    /// Frames left to live.
    pub lifetime: f32,
    pub active: bool,
}

impl Particle {
    /// The `n`th particle ever spawned. Deterministic in `n`.
    pub fn spawned(n: u64) -> Self {
        let angle = -(n.wrapping_mul(53) as f64);
        Self {
            x: (n.wrapping_mul(2134) % 30) as f64,
            y: (n.wrapping_mul(4312) % 30) as f64,
            vx: angle.cos(),
            vy: angle.sin(),
            lifetime: (n.wrapping_mul(1245) % 80) as f32,
            active: true,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.active && self.lifetime > 0.0
    }

    /// Advance one frame.
    pub fn step(&mut self) {
        self.x += self.vx;
        self.y += self.vy;
        self.lifetime -= 1.0;
    }

    /// Decode a particle from the start of `slot`.
    ///
    /// # Panics
    ///
    /// Panics if `slot` is shorter than [`PARTICLE_BYTES`].
    pub fn read_from(slot: &[u8]) -> Self {
        let mut lifetime = [0u8; 4];
        lifetime.copy_from_slice(&slot[LIFETIME_AT..LIFETIME_AT + 4]);
        Self {
            x: read_f64(slot, 0),
            y: read_f64(slot, 8),
            vx: read_f64(slot, 16),
            vy: read_f64(slot, 24),
            lifetime: f32::from_le_bytes(lifetime),
            active: slot[ACTIVE_AT] != 0,
        }
    }

    /// Encode into the start of `slot`.
    ///
    /// # Panics
    ///
    /// Panics if `slot` is shorter than [`PARTICLE_BYTES`].
    pub fn write_to(&self, slot: &mut [u8]) {
        for (i, v) in [self.x, self.y, self.vx, self.vy].into_iter().enumerate() {
            slot[i * 8..i * 8 + 8].copy_from_slice(&v.to_le_bytes());
        }
        slot[LIFETIME_AT..LIFETIME_AT + 4].copy_from_slice(&self.lifetime.to_le_bytes());
        slot[ACTIVE_AT] = u8::from(self.active);
    }
}

fn read_f64(slot: &[u8], at: usize) -> f64 {
    let mut raw = [0u8; 8];
    raw.copy_from_slice(&slot[at..at + 8]);
    f64::from_le_bytes(raw)
}

/// Outcome of one [`ParticleSystem::frame`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameReport {
    /// Frame number, starting at 1.
    pub frame: u64,
    pub expired: usize,
    pub spawned: usize,
    /// Particles alive after the frame.
    pub live: usize,
}

/// Fixed-size particle population stored in a free-list pool.
pub struct ParticleSystem {
    pool: FreeListPool,
    ring: VecDeque<SlotHandle>,
    limit: usize,
    spawned: u64,
    frames: u64,
}

impl ParticleSystem {
    /// Create a system for up to `limit` particles and spawn all of them.
    pub fn new(limit: usize, verbosity: Verbosity) -> Result<Self, PoolError> {
        let config =
            PoolConfig::new(PARTICLE_BYTES.max(LINK_WIDTH), limit).with_verbosity(verbosity);
        let mut system = Self {
            pool: FreeListPool::new(config)?,
            ring: VecDeque::with_capacity(limit),
            limit,
            spawned: 0,
            frames: 0,
        };
        system.populate()?;
        Ok(system)
    }

    /// Spawn one particle at the back of the ring.
    pub fn spawn(&mut self) -> Result<SlotHandle, PoolError> {
        let handle = self.pool.alloc()?;
        Particle::spawned(self.spawned).write_to(self.pool.get_mut(handle)?);
        self.spawned += 1;
        self.ring.push_back(handle);
        Ok(handle)
    }

    /// Spawn until the population limit is reached. Returns how many were
    /// spawned.
    pub fn populate(&mut self) -> Result<usize, PoolError> {
        let mut count = 0;
        while self.ring.len() < self.limit {
            self.spawn()?;
            count += 1;
        }
        Ok(count)
    }

    /// Expire dead particles, move the survivors, then refill.
    pub fn frame(&mut self) -> Result<FrameReport, PoolError> {
        let mut expired = 0;
        for _ in 0..self.ring.len() {
            let Some(handle) = self.ring.pop_front() else {
                break;
            };
            let mut particle = Particle::read_from(self.pool.get(handle)?);
            if !particle.is_alive() {
                self.pool.free(handle)?;
                expired += 1;
                continue;
            }
            particle.step();
            particle.write_to(self.pool.get_mut(handle)?);
            self.ring.push_back(handle);
        }

        let spawned = self.populate()?;
        self.frames += 1;
        let report = FrameReport {
            frame: self.frames,
            expired,
            spawned,
            live: self.ring.len(),
        };
        tracing::debug!(
            frame = report.frame,
            expired,
            spawned,
            live = report.live,
            "particle frame"
        );
        Ok(report)
    }

    /// The oldest live particle.
    pub fn first(&self) -> Result<Option<Particle>, PoolError> {
        match self.ring.front() {
            Some(&handle) => Ok(Some(Particle::read_from(self.pool.get(handle)?))),
            None => Ok(None),
        }
    }

    /// Every live particle, oldest first.
    pub fn particles(&self) -> Result<Vec<Particle>, PoolError> {
        self.ring
            .iter()
            .map(|&handle| self.pool.get(handle).map(Particle::read_from))
            .collect()
    }

    pub fn live(&self) -> usize {
        self.ring.len()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Frames run so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// The backing pool.
    pub fn pool(&self) -> &FreeListPool {
        &self.pool
    }
}
