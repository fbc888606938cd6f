//! Arena allocation handles and checkpoint tokens.
//!
//! An [`ArenaPtr`] records where an allocation lives inside its arena. It
//! is resolved back to bytes through [`Arena::get`](crate::Arena::get) or
//! to a raw address through [`Arena::as_ptr`](crate::Arena::as_ptr).

use std::fmt;

/// Location of one bump allocation within an arena buffer.
///
/// Handles are plain values: they stay `Copy` after the arena is reset or
/// restored past them. Using such a handle is a caller error; the arena
/// only notices when the region now lies beyond its bump offset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ArenaPtr {
    /// Byte offset from the start of the arena buffer.
    pub(crate) offset: usize,
    /// Aligned length in bytes.
    pub(crate) len: usize,
}

impl ArenaPtr {
    pub(crate) fn new(offset: usize, len: usize) -> Self {
        Self { offset, len }
    }

    /// Byte offset from the start of the arena buffer.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Length of the allocation in bytes, rounded up to 8.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether this is a zero-length allocation.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// One past the last byte of the allocation.
    pub fn end(&self) -> usize {
        self.offset + self.len
    }
}

impl fmt::Display for ArenaPtr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ArenaPtr(off={}, len={})", self.offset, self.len)
    }
}

/// A saved arena offset, returned by [`Arena::checkpoint`](crate::Arena::checkpoint).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[must_use]
pub struct Checkpoint(pub(crate) usize);

impl Checkpoint {
    /// The arena offset this checkpoint captured.
    pub fn offset(&self) -> usize {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ptr_accessors() {
        let p = ArenaPtr::new(16, 24);
        assert_eq!(p.offset(), 16);
        assert_eq!(p.len(), 24);
        assert_eq!(p.end(), 40);
        assert!(!p.is_empty());
        assert_eq!(p.to_string(), "ArenaPtr(off=16, len=24)");
    }

    #[test]
    fn empty_ptr() {
        assert!(ArenaPtr::new(8, 0).is_empty());
    }

    #[test]
    fn checkpoints_order_by_offset() {
        assert!(Checkpoint(8) < Checkpoint(16));
        assert_eq!(Checkpoint(24).offset(), 24);
    }
}
