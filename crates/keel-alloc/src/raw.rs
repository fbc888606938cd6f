//! Low-level primitives for header-before-payload object layout.
//!
//! Each refcounted object is one system allocation: a [`Header`] padded
//! to [`HEADER_SIZE`] bytes, immediately followed by the payload. Callers
//! only ever see the payload address; the header is found at a fixed
//! negative offset from it.
//!
//! ```text
//! base                     payload
//! │ refcount │ size │ pad  │ size bytes ...
//! └────── HEADER_SIZE ─────┘
//! ```
//!
//! This is the only module in the crate allowed to use `unsafe`. Every
//! block carries a `// SAFETY:` comment.

#![allow(unsafe_code)]

use std::alloc::{self, Layout};
use std::mem;
use std::ptr::NonNull;
use std::slice;

/// Alignment of the whole allocation, and therefore of the payload.
pub(crate) const PAYLOAD_ALIGN: usize = if mem::align_of::<Header>() > 8 {
    mem::align_of::<Header>()
} else {
    8
};

/// Distance from the allocation base to the payload.
pub(crate) const HEADER_SIZE: usize =
    (mem::size_of::<Header>() + PAYLOAD_ALIGN - 1) & !(PAYLOAD_ALIGN - 1);

/// Per-object metadata stored in front of the payload.
#[repr(C)]
pub(crate) struct Header {
    pub(crate) refcount: u32,
    pub(crate) size: usize,
}

fn layout_for(size: usize) -> Option<Layout> {
    let total = HEADER_SIZE.checked_add(size)?;
    Layout::from_size_align(total, PAYLOAD_ALIGN).ok()
}

/// Allocate a zeroed object with a `size`-byte payload and refcount 1.
///
/// Returns the payload address, or `None` if the layout overflows or the
/// system allocator fails.
pub(crate) fn alloc_object(size: usize) -> Option<NonNull<u8>> {
    let layout = layout_for(size)?;
    // SAFETY: layout.size() >= HEADER_SIZE > 0.
    let base = NonNull::new(unsafe { alloc::alloc_zeroed(layout) })?;
    // SAFETY: base is valid for layout.size() bytes and aligned to
    // PAYLOAD_ALIGN >= align_of::<Header>().
    unsafe {
        base.cast::<Header>()
            .as_ptr()
            .write(Header { refcount: 1, size });
    }
    // SAFETY: HEADER_SIZE <= layout.size(), so the result stays in bounds.
    Some(unsafe { base.add(HEADER_SIZE) })
}

/// Header of the object owning `payload`.
///
/// # Safety
///
/// `payload` must come from [`alloc_object`] and not have been freed.
pub(crate) unsafe fn header(payload: NonNull<u8>) -> NonNull<Header> {
    // SAFETY: per caller contract the header sits HEADER_SIZE bytes before
    // payload within the same allocation.
    unsafe { payload.sub(HEADER_SIZE).cast::<Header>() }
}

/// Return the object owning `payload` to the system allocator.
///
/// # Safety
///
/// `payload` must come from [`alloc_object`], not have been freed, and
/// must not be used again afterwards.
pub(crate) unsafe fn free_object(payload: NonNull<u8>) {
    // SAFETY: caller contract.
    let header = unsafe { header(payload) };
    // SAFETY: header is live and initialised by alloc_object.
    let size = unsafe { (*header.as_ptr()).size };
    let layout = layout_for(size).expect("layout was valid when the object was allocated");
    // SAFETY: same base pointer and layout that alloc_object used.
    unsafe { alloc::dealloc(header.cast::<u8>().as_ptr(), layout) };
}

/// Borrow the payload bytes.
///
/// # Safety
///
/// `payload` must be live for `'a` and must not be mutably aliased for
/// that lifetime.
pub(crate) unsafe fn payload<'a>(payload: NonNull<u8>) -> &'a [u8] {
    // SAFETY: caller contract; the payload is `size` zero-initialised bytes.
    unsafe {
        let size = (*header(payload).as_ptr()).size;
        slice::from_raw_parts(payload.as_ptr(), size)
    }
}

/// Borrow the payload bytes mutably.
///
/// # Safety
///
/// `payload` must be live for `'a` and must not be aliased at all for
/// that lifetime.
pub(crate) unsafe fn payload_mut<'a>(payload: NonNull<u8>) -> &'a mut [u8] {
    // SAFETY: caller contract; the payload is `size` zero-initialised bytes.
    unsafe {
        let size = (*header(payload).as_ptr()).size;
        slice::from_raw_parts_mut(payload.as_ptr(), size)
    }
}
