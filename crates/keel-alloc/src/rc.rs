//! Manually reference-counted heap objects.
//!
//! [`RcHeap::alloc`] returns an [`RcPtr`] to a zeroed payload with a
//! reference count of 1. Holders share an object with [`RcHeap::retain`]
//! and give up their share with [`RcHeap::release`]; the release that
//! takes the count to zero destroys the object.
//!
//! `RcPtr` is neither `Clone` nor `Copy`, so every live token stands for
//! exactly one reference and `release` consumes it. Double release and
//! use after free therefore cannot be written without `unsafe`. Dropping
//! a token without releasing it leaks the object, which the statistics
//! report as a leaked object.

#![allow(unsafe_code)]

use std::fmt;
use std::ptr::NonNull;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::trace;

use crate::error::AllocError;
use crate::raw;
use crate::stats::StatsObserver;

static NEXT_HEAP_ID: AtomicU64 = AtomicU64::new(1);

/// Payload pointer to a refcounted object, or null.
///
/// Owned by the holder: pass it to [`RcHeap::release`] when done.
#[must_use = "dropping an RcPtr without releasing it leaks the object"]
pub struct RcPtr {
    payload: Option<NonNull<u8>>,
    heap: u64,
}

impl RcPtr {
    /// The null pointer. Retain, release and refcount all accept it.
    pub const fn null() -> Self {
        Self {
            payload: None,
            heap: 0,
        }
    }

    /// Whether this is the null pointer.
    pub fn is_null(&self) -> bool {
        self.payload.is_none()
    }

    /// Raw payload address, or a null pointer.
    pub fn as_ptr(&self) -> *const u8 {
        self.payload
            .map_or(std::ptr::null(), |p| p.as_ptr().cast_const())
    }

    /// Whether both tokens refer to the same object (or are both null).
    pub fn same_object(&self, other: &RcPtr) -> bool {
        self.payload == other.payload
    }
}

impl Default for RcPtr {
    fn default() -> Self {
        Self::null()
    }
}

impl fmt::Debug for RcPtr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.payload {
            Some(p) => write!(f, "RcPtr({:p})", p.as_ptr()),
            None => write!(f, "RcPtr(null)"),
        }
    }
}

/// Allocator for reference-counted objects backed by the system allocator.
///
/// ```
/// use keel_alloc::{RcHeap, StatsObserver};
///
/// let mut heap = RcHeap::new(StatsObserver::new());
/// let a = heap.alloc(4).unwrap();
/// let b = heap.retain(&a);
/// assert_eq!(heap.refcount(&a), 2);
///
/// heap.release(a);
/// assert_eq!(heap.refcount(&b), 1);
/// heap.release(b);
/// assert_eq!(heap.stats().snapshot().free_count, 1);
/// ```
pub struct RcHeap {
    id: u64,
    stats: StatsObserver,
}

impl RcHeap {
    /// Create a heap reporting to `stats`.
    pub fn new(stats: StatsObserver) -> Self {
        Self {
            id: NEXT_HEAP_ID.fetch_add(1, Ordering::Relaxed),
            stats,
        }
    }

    /// Allocate an object with a zeroed `size`-byte payload and refcount 1.
    ///
    /// On failure no statistics are touched.
    pub fn alloc(&mut self, size: usize) -> Result<RcPtr, AllocError> {
        let payload = raw::alloc_object(size).ok_or(AllocError::AllocationFailed {
            requested: size,
            available: 0,
        })?;
        self.stats.record_object_alloc(size);
        Ok(RcPtr {
            payload: Some(payload),
            heap: self.id,
        })
    }

    /// Take another reference to the object behind `ptr`.
    ///
    /// Returns a new token for the same payload; null stays null.
    ///
    /// # Panics
    ///
    /// Panics if `ptr` was allocated by a different heap.
    pub fn retain(&mut self, ptr: &RcPtr) -> RcPtr {
        let Some(payload) = ptr.payload else {
            return RcPtr::null();
        };
        self.assert_owned(ptr);
        // SAFETY: a live token holds a reference, so the object is live.
        let header = unsafe { raw::header(payload) }.as_ptr();
        // SAFETY: single-threaded; no reference into the header is held.
        unsafe {
            assert!((*header).refcount < u32::MAX, "refcount overflow");
            (*header).refcount += 1;
        }
        RcPtr {
            payload: Some(payload),
            heap: ptr.heap,
        }
    }

    /// Give up the reference held by `ptr`, destroying the object if it
    /// was the last one. Releasing null does nothing.
    ///
    /// # Panics
    ///
    /// Panics if `ptr` was allocated by a different heap.
    pub fn release(&mut self, ptr: RcPtr) {
        let Some(payload) = ptr.payload else {
            return;
        };
        self.assert_owned(&ptr);
        // SAFETY: a live token holds a reference, so the object is live.
        let header = unsafe { raw::header(payload) }.as_ptr();
        // SAFETY: single-threaded; no reference into the header is held.
        let (remaining, size) = unsafe {
            (*header).refcount -= 1;
            ((*header).refcount, (*header).size)
        };
        if remaining == 0 {
            // SAFETY: this token held the last reference and is consumed here.
            unsafe { raw::free_object(payload) };
            self.stats.record_object_free(size);
            trace!(size, "refcounted object destroyed");
        }
    }

    /// Live reference count of the object behind `ptr`; 0 for null.
    pub fn refcount(&self, ptr: &RcPtr) -> u32 {
        match ptr.payload {
            // SAFETY: a live token holds a reference, so the object is live.
            Some(payload) => unsafe { (*raw::header(payload).as_ptr()).refcount },
            None => 0,
        }
    }

    /// Payload size in bytes; 0 for null.
    pub fn size(&self, ptr: &RcPtr) -> usize {
        match ptr.payload {
            // SAFETY: a live token holds a reference, so the object is live.
            Some(payload) => unsafe { (*raw::header(payload).as_ptr()).size },
            None => 0,
        }
    }

    /// Borrow the payload of `ptr`. Null yields an empty slice.
    ///
    /// # Panics
    ///
    /// Panics if `ptr` was allocated by a different heap.
    pub fn payload(&self, ptr: &RcPtr) -> &[u8] {
        match ptr.payload {
            Some(payload) => {
                self.assert_owned(ptr);
                // SAFETY: the object is live while `ptr` exists, and mutable
                // payload borrows need `&mut self`, which this borrow excludes.
                unsafe { raw::payload(payload) }
            }
            None => &[],
        }
    }

    /// Borrow the payload of `ptr` mutably. Null yields an empty slice.
    ///
    /// # Panics
    ///
    /// Panics if `ptr` was allocated by a different heap.
    pub fn payload_mut(&mut self, ptr: &RcPtr) -> &mut [u8] {
        match ptr.payload {
            Some(payload) => {
                self.assert_owned(ptr);
                // SAFETY: the object is live while `ptr` exists, and every
                // payload borrow from this heap is excluded by `&mut self`.
                unsafe { raw::payload_mut(payload) }
            }
            None => &mut [],
        }
    }

    /// The observer this heap reports to.
    pub fn stats(&self) -> &StatsObserver {
        &self.stats
    }

    fn assert_owned(&self, ptr: &RcPtr) {
        assert_eq!(ptr.heap, self.id, "RcPtr belongs to a different heap");
    }
}

impl fmt::Debug for RcHeap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RcHeap")
            .field("id", &self.id)
            .field("live_objects", &self.stats.snapshot().live_objects())
            .finish()
    }
}
