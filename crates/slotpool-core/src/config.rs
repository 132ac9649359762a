//! Pool configuration parameters.

/// How much a pool reports through `tracing`.
///
/// Chosen per pool at creation time. Events are emitted only when a
/// subscriber is installed; `Quiet` skips them entirely.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Verbosity {
    /// No diagnostics.
    #[default]
    Quiet,
    /// Rejected frees, exhaustion, and free-list corruption.
    Warnings,
    /// Everything in `Warnings` plus every alloc, free, and defragment.
    Debug,
}

impl Verbosity {
    /// Whether warning-level events should be emitted.
    pub fn warnings(self) -> bool {
        self >= Self::Warnings
    }

    /// Whether per-operation debug events should be emitted.
    pub fn debug(self) -> bool {
        self >= Self::Debug
    }
}

/// Configuration for a fixed-capacity pool.
///
/// Validated at construction; all values are immutable after creation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoolConfig {
    /// Size of each slot in bytes. Must be non-zero.
    pub object_size: usize,

    /// Number of slots. Zero is allowed: every `alloc` is then `Exhausted`.
    pub capacity: usize,

    /// Diagnostic level for this pool.
    pub verbosity: Verbosity,
}

impl PoolConfig {
    /// Create a config with the default (quiet) verbosity.
    pub fn new(object_size: usize, capacity: usize) -> Self {
        Self {
            object_size,
            capacity,
            verbosity: Verbosity::default(),
        }
    }

    /// Set the diagnostic level.
    pub fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Total arena size in bytes, or `None` if it overflows `usize`.
    pub fn arena_bytes(&self) -> Option<usize> {
        self.object_size.checked_mul(self.capacity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_verbosity_is_quiet() {
        let config = PoolConfig::new(16, 32);
        assert_eq!(config.verbosity, Verbosity::Quiet);
        assert!(!config.verbosity.warnings());
    }

    #[test]
    fn verbosity_levels_are_cumulative() {
        assert!(Verbosity::Warnings.warnings());
        assert!(!Verbosity::Warnings.debug());
        assert!(Verbosity::Debug.warnings());
        assert!(Verbosity::Debug.debug());
    }

    #[test]
    fn arena_bytes_detects_overflow() {
        assert_eq!(PoolConfig::new(8, 3).arena_bytes(), Some(24));
        assert_eq!(PoolConfig::new(usize::MAX, 2).arena_bytes(), None);
    }
}
