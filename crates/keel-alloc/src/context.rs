//! The default memory context: one arena, one heap, one set of statistics.
//!
//! A runtime that wants "the" allocator creates a single [`MemoryContext`]
//! at startup and keeps it for the life of the program, handing out
//! `&mut` access where allocation happens. Creating the context is the
//! one initialization step; nothing can allocate before it exists.

use tracing::debug;

use crate::arena::Arena;
use crate::config::ArenaConfig;
use crate::error::ConfigError;
#[cfg(feature = "refcount")]
use crate::rc::RcHeap;
use crate::stats::{MemoryStats, StatsObserver, StatsReport};

/// Long-lived handle owning the default allocators.
///
/// ```
/// use keel_alloc::{ArenaConfig, MemoryContext};
///
/// let mut ctx = MemoryContext::new(ArenaConfig::new(256)).unwrap();
/// let total = ctx.scoped(|arena| {
///     let p = arena.alloc(40).unwrap();
///     arena.get(p).unwrap().len()
/// });
/// assert_eq!(total, 40);
/// assert_eq!(ctx.snapshot().current_used, 0);
/// ```
pub struct MemoryContext {
    config: ArenaConfig,
    stats: StatsObserver,
    arena: Arena,
    #[cfg(feature = "refcount")]
    heap: RcHeap,
}

impl MemoryContext {
    /// Validate `config` and build the context's allocators.
    pub fn new(config: ArenaConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: ArenaConfig) -> Self {
        let stats = StatsObserver::new();
        let arena = Arena::new(config.capacity, stats.clone());
        debug!(
            capacity = config.capacity,
            refcount = cfg!(feature = "refcount"),
            "memory context initialised"
        );
        Self {
            #[cfg(feature = "refcount")]
            heap: RcHeap::new(stats.clone()),
            config,
            stats,
            arena,
        }
    }

    /// The configuration this context was built from.
    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    /// The default arena.
    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    /// The default arena, for allocation.
    pub fn arena_mut(&mut self) -> &mut Arena {
        &mut self.arena
    }

    /// The refcounted heap.
    #[cfg(feature = "refcount")]
    pub fn heap(&self) -> &RcHeap {
        &self.heap
    }

    /// The refcounted heap, for allocation.
    #[cfg(feature = "refcount")]
    pub fn heap_mut(&mut self) -> &mut RcHeap {
        &mut self.heap
    }

    /// Shared statistics observer for both allocators.
    pub fn stats(&self) -> &StatsObserver {
        &self.stats
    }

    /// Copy of the combined statistics.
    pub fn snapshot(&self) -> MemoryStats {
        self.stats.snapshot()
    }

    /// Human-readable statistics summary.
    pub fn report(&self) -> StatsReport {
        self.stats.report()
    }

    /// Run `f` against the default arena and roll back whatever it
    /// allocated. See [`Arena::scope`].
    pub fn scoped<R>(&mut self, f: impl FnOnce(&mut Arena) -> R) -> R {
        self.arena.scope(f)
    }
}

impl Default for MemoryContext {
    /// Context with an arena of [`DEFAULT_ARENA_CAPACITY`](crate::DEFAULT_ARENA_CAPACITY) bytes.
    fn default() -> Self {
        Self::build(ArenaConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DEFAULT_ARENA_CAPACITY;

    #[test]
    fn default_context_uses_build_capacity() {
        let ctx = MemoryContext::default();
        assert_eq!(ctx.arena().capacity(), DEFAULT_ARENA_CAPACITY);
        assert_eq!(ctx.snapshot(), MemoryStats::default());
    }

    #[test]
    fn zero_capacity_context_is_rejected() {
        assert!(matches!(
            MemoryContext::new(ArenaConfig::new(0)),
            Err(ConfigError::ZeroCapacity)
        ));
    }

    #[test]
    fn arena_reports_into_context_stats() {
        let mut ctx = MemoryContext::new(ArenaConfig::new(64)).unwrap();
        ctx.arena_mut().alloc(10).unwrap();
        assert_eq!(ctx.snapshot().current_used, 16);
        assert!(ctx.arena().stats().same_as(ctx.stats()));
    }

    #[cfg(feature = "refcount")]
    #[test]
    fn both_allocators_share_one_observer() {
        let mut ctx = MemoryContext::new(ArenaConfig::new(64)).unwrap();
        ctx.arena_mut().alloc(8).unwrap();
        let obj = ctx.heap_mut().alloc(20).unwrap();

        let s = ctx.snapshot();
        assert_eq!(s.current_used, 28);
        assert_eq!(s.alloc_count, 1);

        ctx.heap_mut().release(obj);
        ctx.arena_mut().reset();
        let s = ctx.snapshot();
        assert_eq!(s.current_used, 0);
        assert_eq!(s.peak_used, 28);
        assert_eq!(s.live_objects(), 0);
    }

    #[test]
    fn scoped_restores_default_arena() {
        let mut ctx = MemoryContext::new(ArenaConfig::new(128)).unwrap();
        ctx.arena_mut().alloc(8).unwrap();
        ctx.scoped(|arena| {
            arena.alloc(64).unwrap();
            assert_eq!(arena.used(), 72);
        });
        assert_eq!(ctx.arena().used(), 8);
        assert_eq!(ctx.snapshot().peak_used, 72);
    }
}
