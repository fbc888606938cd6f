//! Fixed-capacity bump arena with checkpoint/restore.
//!
//! An [`Arena`] owns one contiguous buffer and a bump offset. Allocation
//! rounds the request up to 8 bytes and advances the offset; nothing is
//! freed individually. Space comes back only through [`Arena::restore`]
//! to an earlier [`Checkpoint`] or through [`Arena::reset`].
//!
//! The buffer is a `Vec<u64>` viewed as bytes, so its base address is
//! 8-byte aligned and every allocation start inherits that alignment.

use tracing::{debug, trace};

use crate::error::AllocError;
use crate::handle::{ArenaPtr, Checkpoint};
use crate::stats::StatsObserver;

/// Alignment of every arena allocation, in bytes.
pub const ALIGN: usize = 8;

/// Round `size` up to a multiple of [`ALIGN`]. `None` on overflow.
pub const fn align_up(size: usize) -> Option<usize> {
    match size.checked_add(ALIGN - 1) {
        Some(padded) => Some(padded & !(ALIGN - 1)),
        None => None,
    }
}

/// Bump allocator over a fixed, 8-byte aligned buffer.
///
/// Every successful allocation and every rollback is reported to the
/// arena's [`StatsObserver`]. Failed allocations leave both the arena and
/// the statistics untouched.
///
/// ```
/// use keel_alloc::{Arena, StatsObserver};
///
/// let mut arena = Arena::new(64, StatsObserver::new());
/// let a = arena.alloc(10).unwrap();
/// assert_eq!(a.len(), 16);
///
/// let cp = arena.checkpoint();
/// arena.alloc(8).unwrap();
/// arena.restore(cp);
/// assert_eq!(arena.used(), 16);
/// ```
pub struct Arena {
    /// Backing storage. Sized once at construction, never grows.
    data: Vec<u64>,
    /// Usable bytes; at most `data.len() * 8`.
    capacity: usize,
    /// Bump pointer: next free byte.
    offset: usize,
    stats: StatsObserver,
}

impl Arena {
    /// Reserve a zeroed buffer of `capacity` bytes and bind an arena to it.
    pub fn new(capacity: usize, stats: StatsObserver) -> Self {
        let words = capacity.div_ceil(ALIGN);
        Self::with_buffer(vec![0; words], capacity, stats)
    }

    /// Bind an arena to a caller-supplied buffer, using its first
    /// `capacity` bytes.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` exceeds the buffer's size in bytes.
    pub fn with_buffer(buffer: Vec<u64>, capacity: usize, stats: StatsObserver) -> Self {
        let buffer_bytes = buffer.len() * ALIGN;
        assert!(
            capacity <= buffer_bytes,
            "arena capacity {capacity} exceeds buffer of {buffer_bytes} bytes",
        );
        debug!(capacity, "arena initialised");
        Self {
            data: buffer,
            capacity,
            offset: 0,
            stats,
        }
    }

    /// Bump-allocate `size` bytes, rounded up to [`ALIGN`].
    ///
    /// The returned region is zero-filled. Fails with
    /// [`AllocError::AllocationFailed`] when `offset + aligned > capacity`,
    /// in which case nothing changes.
    pub fn alloc(&mut self, size: usize) -> Result<ArenaPtr, AllocError> {
        let available = self.remaining();
        let aligned = align_up(size).ok_or(AllocError::AllocationFailed {
            requested: size,
            available,
        })?;
        let end = match self.offset.checked_add(aligned) {
            Some(end) if end <= self.capacity => end,
            _ => {
                return Err(AllocError::AllocationFailed {
                    requested: aligned,
                    available,
                })
            }
        };

        let ptr = ArenaPtr::new(self.offset, aligned);
        // Regions may hold stale bytes from before a rollback.
        self.bytes_mut()[ptr.offset..end].fill(0);
        self.offset = end;
        self.stats.record_arena_alloc(aligned);
        Ok(ptr)
    }

    /// Capture the current offset for a later [`Arena::restore`].
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint(self.offset)
    }

    /// Roll the arena back to `checkpoint`.
    ///
    /// A checkpoint beyond the current offset (the arena was already
    /// rolled back past it) is ignored.
    pub fn restore(&mut self, checkpoint: Checkpoint) {
        let target = checkpoint.0;
        if target > self.offset {
            return;
        }
        let reclaimed = self.offset - target;
        self.stats.record_arena_release(reclaimed);
        self.offset = target;
        trace!(reclaimed, offset = target, "arena restored");
    }

    /// Reclaim the whole arena. Every outstanding [`ArenaPtr`] becomes invalid.
    pub fn reset(&mut self) {
        self.restore(Checkpoint(0));
    }

    /// Run `f` with scratch access to the arena, then roll back everything
    /// it allocated.
    pub fn scope<R>(&mut self, f: impl FnOnce(&mut Arena) -> R) -> R {
        let checkpoint = self.checkpoint();
        let result = f(self);
        self.restore(checkpoint);
        result
    }

    /// Resolve a handle to its bytes.
    ///
    /// Returns `None` if the region lies beyond the current offset, i.e.
    /// it was reclaimed by a restore or reset.
    pub fn get(&self, ptr: ArenaPtr) -> Option<&[u8]> {
        if ptr.end() > self.offset {
            return None;
        }
        Some(&self.bytes()[ptr.offset..ptr.end()])
    }

    /// Resolve a handle to its bytes for writing. See [`Arena::get`].
    pub fn get_mut(&mut self, ptr: ArenaPtr) -> Option<&mut [u8]> {
        if ptr.end() > self.offset {
            return None;
        }
        Some(&mut self.bytes_mut()[ptr.offset..ptr.end()])
    }

    /// Raw start address of an allocation.
    pub fn as_ptr(&self, ptr: ArenaPtr) -> *const u8 {
        self.bytes().as_ptr().wrapping_add(ptr.offset)
    }

    /// Usable capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bytes currently allocated (the bump offset).
    pub fn used(&self) -> usize {
        self.offset
    }

    /// Bytes left before the arena is full.
    pub fn remaining(&self) -> usize {
        self.capacity - self.offset
    }

    /// Size of the backing buffer in bytes.
    pub fn memory_bytes(&self) -> usize {
        self.data.len() * ALIGN
    }

    /// The observer this arena reports to.
    pub fn stats(&self) -> &StatsObserver {
        &self.stats
    }

    /// Give the backing buffer back to the caller.
    ///
    /// Bytes still allocated at this point are reported as released.
    pub fn into_buffer(mut self) -> Vec<u64> {
        self.reset();
        self.data
    }

    fn bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.data)
    }

    fn bytes_mut(&mut self) -> &mut [u8] {
        bytemuck::cast_slice_mut(&mut self.data)
    }
}
