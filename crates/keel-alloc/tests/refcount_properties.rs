//! Property tests for the refcount protocol and object accounting.

#![cfg(feature = "refcount")]

use keel_alloc::{RcHeap, RcPtr, StatsObserver};
use proptest::prelude::*;

proptest! {
    #[test]
    fn retain_release_pair_leaves_count_unchanged(extra in 0usize..8) {
        let mut heap = RcHeap::new(StatsObserver::new());
        let owner = heap.alloc(8).unwrap();
        let mut held: Vec<RcPtr> = (0..extra).map(|_| heap.retain(&owner)).collect();
        let before = heap.refcount(&owner);

        let extra_ref = heap.retain(&owner);
        heap.release(extra_ref);
        prop_assert_eq!(heap.refcount(&owner), before);

        for p in held.drain(..) {
            heap.release(p);
        }
        heap.release(owner);
    }

    #[test]
    fn n_retains_then_n_plus_one_releases_frees_once(n in 0usize..16) {
        let mut heap = RcHeap::new(StatsObserver::new());
        let owner = heap.alloc(4).unwrap();
        let shares: Vec<RcPtr> = (0..n).map(|_| heap.retain(&owner)).collect();
        prop_assert_eq!(heap.refcount(&owner) as usize, n + 1);

        for p in shares {
            heap.release(p);
            prop_assert_eq!(heap.stats().snapshot().free_count, 0);
        }
        prop_assert_eq!(heap.refcount(&owner), 1);
        heap.release(owner);
        prop_assert_eq!(heap.stats().snapshot().free_count, 1);
    }

    #[test]
    fn live_objects_match_alloc_minus_free(
        ops in prop::collection::vec((0u8..3, 0usize..64, any::<prop::sample::Index>()), 1..60),
    ) {
        let mut heap = RcHeap::new(StatsObserver::new());
        // One entry per token; objects stay alive while any token does.
        let mut tokens: Vec<RcPtr> = Vec::new();
        let mut live_bytes = 0usize;

        for (op, size, pick) in ops {
            match op {
                0 => {
                    tokens.push(heap.alloc(size).unwrap());
                    live_bytes += size;
                }
                1 if !tokens.is_empty() => {
                    let i = pick.index(tokens.len());
                    let shared = heap.retain(&tokens[i]);
                    tokens.push(shared);
                }
                _ if !tokens.is_empty() => {
                    let i = pick.index(tokens.len());
                    let p = tokens.swap_remove(i);
                    let last = heap.refcount(&p) == 1;
                    if last {
                        live_bytes -= heap.size(&p);
                    }
                    heap.release(p);
                }
                _ => {}
            }

            let mut distinct: Vec<*const u8> = tokens.iter().map(RcPtr::as_ptr).collect();
            distinct.sort();
            distinct.dedup();

            let s = heap.stats().snapshot();
            prop_assert_eq!(s.live_objects(), distinct.len() as u64);
            prop_assert_eq!(s.alloc_count - s.free_count, distinct.len() as u64);
            prop_assert_eq!(s.current_used, live_bytes);
        }

        for p in tokens {
            heap.release(p);
        }
        prop_assert_eq!(heap.stats().snapshot().live_objects(), 0);
        prop_assert_eq!(heap.stats().snapshot().current_used, 0);
    }
}
