//! Keel memory demo: arena scratch space and refcounted buffers side by side.
//!
//! Demonstrates:
//!   1. Creating the default memory context
//!   2. Clamping readings with no allocation at all
//!   3. Batch processing in arena scratch space that is rolled back on return
//!   4. A persistent buffer shared between two holders via retain/release
//!   5. Reading the statistics report
//!
//! Run with:
//!   cargo run -p keel-alloc --example memory_demo

use keel_alloc::{AllocError, Arena, ArenaConfig, MemoryContext, RcHeap, RcPtr};

// ─── Parameters ─────────────────────────────────────────────────

const ARENA_BYTES: usize = 1024;
const THRESHOLD: i32 = 100;
const PERSISTENT_LEN: usize = 100;

// ─── Fixed-size processing ──────────────────────────────────────

fn clamp_reading(value: i32) -> i32 {
    value.min(THRESHOLD)
}

// ─── Arena-scoped batch ─────────────────────────────────────────
//
// Doubles each sample into a scratch buffer, then sums it. The scratch
// buffer is gone as soon as the scope returns.

fn process_batch(ctx: &mut MemoryContext, data: &[i32]) -> Result<i64, AllocError> {
    ctx.scoped(|arena: &mut Arena| {
        let bytes = std::mem::size_of_val(data);
        let tmp = arena.alloc(bytes)?;
        let buf = arena.get_mut(tmp).unwrap_or_default();

        for (chunk, &v) in buf.chunks_exact_mut(4).zip(data) {
            chunk.copy_from_slice(&(v * 2).to_ne_bytes());
        }
        Ok(buf
            .chunks_exact(4)
            .map(|c| i32::from_ne_bytes([c[0], c[1], c[2], c[3]]) as i64)
            .sum())
    })
}

// ─── Refcounted buffer ──────────────────────────────────────────

fn create_persistent_buffer(heap: &mut RcHeap, len: usize) -> Result<RcPtr, AllocError> {
    heap.alloc(len)
}

// ─── Main ───────────────────────────────────────────────────────

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .init();

    println!("=== Keel Memory Demo ===\n");

    // 1. Context.
    let mut ctx = MemoryContext::new(ArenaConfig::new(ARENA_BYTES))?;
    println!("Arena: {} bytes\n", ctx.arena().capacity());

    // 2. No allocation.
    println!("--- Fixed-size processing ---");
    for reading in [50, 150, 75, 200, 25] {
        println!("  processed: {}", clamp_reading(reading));
    }

    // 3. Arena scratch.
    println!("\n--- Arena allocation ---");
    let data: Vec<i32> = (1..=10).collect();
    let total = process_batch(&mut ctx, &data)?;
    println!(
        "  batch result: {total}, arena in use afterwards: {} bytes",
        ctx.arena().used()
    );

    // 4. Shared buffer.
    println!("\n--- Reference counting ---");
    let heap = ctx.heap_mut();
    let buffer1 = create_persistent_buffer(heap, PERSISTENT_LEN)?;
    let buffer2 = heap.retain(&buffer1);
    println!("  refcount after sharing: {}", heap.refcount(&buffer1));

    heap.payload_mut(&buffer1)[0] = 42;
    println!("  value seen through second holder: {}", heap.payload(&buffer2)[0]);

    heap.release(buffer1);
    println!("  refcount after first release: {}", heap.refcount(&buffer2));
    heap.release(buffer2);

    // 5. Report.
    println!("\n{}", ctx.report());
    Ok(())
}
