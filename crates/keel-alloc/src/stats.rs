//! Allocation statistics shared by the arena and the refcounted heap.
//!
//! [`StatsObserver`] is a cheap clonable handle onto one set of counters.
//! Every allocator built from the same observer feeds the same
//! [`MemoryStats`]; callers read them back with
//! [`StatsObserver::snapshot`] or render them with [`StatsObserver::report`].

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

/// Point-in-time copy of the allocation counters.
///
/// Byte counters cover both allocators. Only the refcounted heap moves
/// `alloc_count` and `free_count`; arena allocations are bulk-reclaimed
/// and only show up as byte deltas.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MemoryStats {
    /// Bytes handed out over the lifetime of the observer.
    pub total_allocated: usize,
    /// Bytes currently in use.
    pub current_used: usize,
    /// High-water mark of `current_used`.
    pub peak_used: usize,
    /// Refcounted objects created.
    pub alloc_count: u64,
    /// Refcounted objects destroyed.
    pub free_count: u64,
}

impl MemoryStats {
    /// Refcounted objects created but not yet destroyed.
    pub fn live_objects(&self) -> u64 {
        self.alloc_count.saturating_sub(self.free_count)
    }

    fn grow(&mut self, bytes: usize) {
        self.total_allocated += bytes;
        self.current_used += bytes;
        if self.current_used > self.peak_used {
            self.peak_used = self.current_used;
        }
    }

    fn shrink(&mut self, bytes: usize) {
        self.current_used = self.current_used.saturating_sub(bytes);
    }
}

/// Shared, single-threaded handle onto a [`MemoryStats`] record.
///
/// Cloning the handle shares the counters; it does not copy them.
#[derive(Clone, Debug, Default)]
pub struct StatsObserver {
    inner: Rc<Cell<MemoryStats>>,
}

impl StatsObserver {
    /// Create an observer with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the counters as of this call.
    pub fn snapshot(&self) -> MemoryStats {
        self.inner.get()
    }

    /// Human-readable summary of the current counters.
    pub fn report(&self) -> StatsReport {
        StatsReport(self.snapshot())
    }

    /// Whether `other` shares this observer's counters.
    pub fn same_as(&self, other: &StatsObserver) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    fn update(&self, f: impl FnOnce(&mut MemoryStats)) {
        let mut stats = self.inner.get();
        f(&mut stats);
        self.inner.set(stats);
    }

    /// Arena bump of `bytes` (already aligned).
    pub(crate) fn record_arena_alloc(&self, bytes: usize) {
        self.update(|s| s.grow(bytes));
    }

    /// Arena rollback reclaiming `bytes`.
    pub(crate) fn record_arena_release(&self, bytes: usize) {
        self.update(|s| s.shrink(bytes));
    }

    /// New refcounted object with a `size`-byte payload.
    #[cfg_attr(not(feature = "refcount"), allow(dead_code))]
    pub(crate) fn record_object_alloc(&self, size: usize) {
        self.update(|s| {
            s.alloc_count += 1;
            s.grow(size);
        });
    }

    /// Refcounted object with a `size`-byte payload destroyed.
    #[cfg_attr(not(feature = "refcount"), allow(dead_code))]
    pub(crate) fn record_object_free(&self, size: usize) {
        self.update(|s| {
            s.free_count += 1;
            s.shrink(size);
        });
    }
}

/// Display adapter for a statistics snapshot.
///
/// Diagnostic output only; the layout is not meant to be parsed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StatsReport(pub MemoryStats);

impl fmt::Display for StatsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = &self.0;
        writeln!(f, "=== Memory Statistics ===")?;
        writeln!(f, "Total allocated: {} bytes", s.total_allocated)?;
        writeln!(f, "Current used: {} bytes", s.current_used)?;
        writeln!(f, "Peak used: {} bytes", s.peak_used)?;
        writeln!(f, "Alloc count: {}", s.alloc_count)?;
        writeln!(f, "Free count: {}", s.free_count)?;
        write!(f, "Leaked objects: {}", s.live_objects())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_stats_are_zero() {
        let s = StatsObserver::new().snapshot();
        assert_eq!(s, MemoryStats::default());
        assert_eq!(s.live_objects(), 0);
    }

    #[test]
    fn clones_share_counters() {
        let a = StatsObserver::new();
        let b = a.clone();
        a.record_arena_alloc(16);
        assert_eq!(b.snapshot().current_used, 16);
        assert!(a.same_as(&b));
        assert!(!a.same_as(&StatsObserver::new()));
    }

    #[test]
    fn peak_survives_release() {
        let obs = StatsObserver::new();
        obs.record_arena_alloc(32);
        obs.record_arena_alloc(16);
        obs.record_arena_release(40);
        obs.record_arena_alloc(8);
        let s = obs.snapshot();
        assert_eq!(s.total_allocated, 56);
        assert_eq!(s.current_used, 16);
        assert_eq!(s.peak_used, 48);
    }

    #[test]
    fn object_events_move_counts_and_bytes() {
        let obs = StatsObserver::new();
        obs.record_object_alloc(4);
        obs.record_object_alloc(10);
        obs.record_object_free(4);
        let s = obs.snapshot();
        assert_eq!(s.alloc_count, 2);
        assert_eq!(s.free_count, 1);
        assert_eq!(s.live_objects(), 1);
        assert_eq!(s.current_used, 10);
        assert_eq!(s.total_allocated, 14);
    }

    #[test]
    fn report_lists_every_counter() {
        let obs = StatsObserver::new();
        obs.record_object_alloc(24);
        obs.record_arena_alloc(8);
        let text = obs.report().to_string();
        assert_eq!(
            text,
            "=== Memory Statistics ===\n\
             Total allocated: 32 bytes\n\
             Current used: 32 bytes\n\
             Peak used: 32 bytes\n\
             Alloc count: 1\n\
             Free count: 0\n\
             Leaked objects: 1"
        );
    }
}
