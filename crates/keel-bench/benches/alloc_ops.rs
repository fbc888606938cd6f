//! Criterion micro-benchmarks for arena and refcounted allocation.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use keel_alloc::{Arena, RcHeap, StatsObserver};
use keel_bench::{run_arena_trace, scoped_trace, size_trace};

const ARENA_BYTES: usize = 64 * 1024;
const SEED: u64 = 42;

/// Benchmark: Bump-allocate 1K mixed-size requests, resetting when full.
fn bench_arena_bump_1k(c: &mut Criterion) {
    let trace = size_trace(1024, 256, SEED);
    let mut arena = Arena::new(ARENA_BYTES, StatsObserver::new());
    c.bench_function("arena_bump_1k", |b| {
        b.iter(|| {
            arena.reset();
            black_box(run_arena_trace(&mut arena, &trace));
        });
    });
}

/// Benchmark: Nested scratch frames using checkpoint/restore.
fn bench_arena_checkpoint_restore(c: &mut Criterion) {
    let frames = scoped_trace(128, 8, 128, SEED);
    let mut arena = Arena::new(ARENA_BYTES, StatsObserver::new());
    c.bench_function("arena_checkpoint_restore", |b| {
        b.iter(|| {
            for frame in &frames {
                let cp = arena.checkpoint();
                for &size in frame {
                    black_box(arena.alloc(size).ok());
                }
                arena.restore(cp);
            }
        });
    });
}

/// Benchmark: Allocate, share, and release 1K refcounted objects.
fn bench_rc_lifecycle_1k(c: &mut Criterion) {
    let trace = size_trace(1024, 256, SEED);
    let mut heap = RcHeap::new(StatsObserver::new());
    c.bench_function("rc_lifecycle_1k", |b| {
        b.iter(|| {
            for &size in &trace {
                let Ok(obj) = heap.alloc(size) else {
                    continue;
                };
                let shared = heap.retain(&obj);
                heap.release(obj);
                black_box(heap.refcount(&shared));
                heap.release(shared);
            }
        });
    });
}

criterion_group!(
    benches,
    bench_arena_bump_1k,
    bench_arena_checkpoint_restore,
    bench_rc_lifecycle_1k
);
criterion_main!(benches);
