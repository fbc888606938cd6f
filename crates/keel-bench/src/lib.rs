//! Benchmark workloads for the Keel allocators.
//!
//! Provides deterministic allocation traces so that benchmark runs are
//! comparable across machines:
//!
//! - [`size_trace`]: seeded request sizes in a bounded range
//! - [`scoped_trace`]: nested checkpoint/restore frames for scratch-style use
//! - [`run_arena_trace`]: replay a size trace against an arena

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use keel_alloc::Arena;
use rand_chacha::rand_core::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Generate `count` request sizes in `1..=max_size` from `seed`.
pub fn size_trace(count: usize, max_size: usize, seed: u64) -> Vec<usize> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..count)
        .map(|_| 1 + (rng.next_u32() as usize % max_size.max(1)))
        .collect()
}

/// A group of allocations made inside one checkpoint/restore frame.
pub type Frame = Vec<usize>;

/// Generate `frames` scratch frames, each with up to `per_frame` requests.
pub fn scoped_trace(frames: usize, per_frame: usize, max_size: usize, seed: u64) -> Vec<Frame> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..frames)
        .map(|_| {
            let len = 1 + (rng.next_u32() as usize % per_frame.max(1));
            (0..len)
                .map(|_| 1 + (rng.next_u32() as usize % max_size.max(1)))
                .collect()
        })
        .collect()
}

/// Allocate every size in `trace`, resetting the arena whenever it fills.
///
/// Returns the number of resets performed.
pub fn run_arena_trace(arena: &mut Arena, trace: &[usize]) -> usize {
    let mut resets = 0;
    for &size in trace {
        if arena.alloc(size).is_err() {
            arena.reset();
            resets += 1;
            // A size larger than the whole arena is skipped.
            let _ = arena.alloc(size);
        }
    }
    resets
}

#[cfg(test)]
mod tests {
    use super::*;
    use keel_alloc::StatsObserver;

    #[test]
    fn traces_are_deterministic() {
        assert_eq!(size_trace(32, 100, 7), size_trace(32, 100, 7));
        assert_eq!(scoped_trace(4, 8, 64, 7), scoped_trace(4, 8, 64, 7));
    }

    #[test]
    fn sizes_stay_in_range() {
        assert!(size_trace(256, 48, 1).iter().all(|&s| (1..=48).contains(&s)));
        for frame in scoped_trace(16, 5, 20, 3) {
            assert!((1..=5).contains(&frame.len()));
            assert!(frame.iter().all(|&s| (1..=20).contains(&s)));
        }
    }

    #[test]
    fn arena_trace_resets_when_full() {
        let mut arena = Arena::new(64, StatsObserver::new());
        let resets = run_arena_trace(&mut arena, &[32, 32, 8]);
        assert_eq!(resets, 1);
        assert_eq!(arena.used(), 8);
    }
}
