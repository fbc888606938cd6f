//! Allocator error types.

use std::error::Error;
use std::fmt;

/// Errors returned by the arena and the reference-counted heap.
///
/// Allocation failure is always recoverable: state is left untouched and
/// the caller decides whether to use a larger arena, fail its own
/// operation, or fall back to the other allocator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AllocError {
    /// The arena is exhausted or the system allocator refused the request.
    AllocationFailed {
        /// Number of bytes requested (after alignment, for the arena).
        requested: usize,
        /// Bytes still available. Always 0 for system allocator failures.
        available: usize,
    },
}

impl fmt::Display for AllocError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AllocationFailed {
                requested,
                available,
            } => {
                write!(
                    f,
                    "allocation failed: requested {requested} bytes, {available} bytes available"
                )
            }
        }
    }
}

impl Error for AllocError {}

/// Errors raised while validating an [`ArenaConfig`](crate::ArenaConfig).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// An arena needs at least one byte of capacity.
    ZeroCapacity,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroCapacity => write!(f, "arena capacity must be non-zero"),
        }
    }
}

impl Error for ConfigError {}
