//! Checkpointable bump arena and reference-counted heap for constrained targets.
//!
//! Two allocation strategies share one statistics observer:
//!
//! ```text
//! MemoryContext (long-lived runtime handle)
//! ├── Arena       fixed buffer + bump offset, checkpoint/restore/reset
//! ├── RcHeap      header-before-payload objects, retain/release   [feature "refcount"]
//! └── StatsObserver  byte totals, peak, object alloc/free counts
//! ```
//!
//! # Arena
//!
//! Allocations are rounded up to 8 bytes and never freed one by one.
//! [`Arena::checkpoint`] and [`Arena::restore`] give stack-style reuse of
//! scratch space; [`Arena::reset`] reclaims everything.
//!
//! # Refcounted heap
//!
//! Each object is a single system allocation with its header in front of
//! the payload. [`RcPtr`] tokens each hold one reference, so sharing and
//! releasing go through [`RcHeap::retain`] and [`RcHeap::release`].
//!
//! # Safety
//!
//! `unsafe` is confined to `raw` (object layout) and `rc` (header
//! access through live tokens). The arena is entirely safe code.
//!
//! Nothing here is thread-safe; the allocator types are `!Send`.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod arena;
pub mod config;
pub mod context;
pub mod error;
pub mod handle;
#[cfg(feature = "refcount")]
mod raw;
#[cfg(feature = "refcount")]
pub mod rc;
pub mod stats;

// Public re-exports for the primary API surface.
pub use arena::Arena;
pub use config::{ArenaConfig, DEFAULT_ARENA_CAPACITY};
pub use context::MemoryContext;
pub use error::{AllocError, ConfigError};
pub use handle::{ArenaPtr, Checkpoint};
#[cfg(feature = "refcount")]
pub use rc::{RcHeap, RcPtr};
pub use stats::{MemoryStats, StatsObserver, StatsReport};
