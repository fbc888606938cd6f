//! Arena configuration parameters.

use crate::error::ConfigError;

/// Build-time capacity of the default arena, in bytes.
pub const DEFAULT_ARENA_CAPACITY: usize = 8192;

/// Configuration for the default arena of a [`MemoryContext`](crate::MemoryContext).
///
/// Validated when the context is created; immutable afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArenaConfig {
    /// Total arena capacity in bytes.
    ///
    /// Default: [`DEFAULT_ARENA_CAPACITY`]. Need not be a multiple of 8,
    /// but the tail past the last multiple of 8 is unusable since every
    /// allocation is rounded up to 8 bytes.
    pub capacity: usize,
}

impl ArenaConfig {
    /// Default arena capacity.
    pub const DEFAULT_CAPACITY: usize = DEFAULT_ARENA_CAPACITY;

    /// Create a config for an arena of `capacity` bytes.
    pub fn new(capacity: usize) -> Self {
        Self { capacity }
    }

    /// Number of 8-byte words needed to back the arena.
    pub fn words(&self) -> usize {
        self.capacity.div_ceil(8)
    }

    /// Reject configurations that could never satisfy an allocation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        Ok(())
    }
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}
