//! Property-based invariant tests for relays and stream combinators.
//!
//! 1. A relay subscriber sees the current value, then every write in order.
//! 2. `skip(n)` drops exactly the first `n` elements of each subscription.
//! 3. `share_replay(k)` replays at most the last `k` values to a late
//!    subscriber and never connects upstream more than once at a time.
//! 4. `map` preserves length and order.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use proptest::prelude::*;
use rxcell_runtime::{BehaviorRelay, Observable, Observer, PublishSubject, Subscription};

// ── Helpers ─────────────────────────────────────────────────────────────

fn collect<T: Clone + Send + Sync + 'static>(
    source: &Observable<T>,
) -> (Subscription, Arc<Mutex<Vec<T>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_clone = Arc::clone(&seen);
    let sub = source.subscribe(move |v| seen_clone.lock().expect("seen lock").push(v));
    (sub, seen)
}

fn snapshot<T: Clone>(seen: &Arc<Mutex<Vec<T>>>) -> Vec<T> {
    seen.lock().expect("seen lock").clone()
}

fn values() -> impl Strategy<Value = Vec<i32>> {
    proptest::collection::vec(any::<i32>(), 0..48)
}

proptest! {
    #[test]
    fn relay_replays_then_forwards(initial in any::<i32>(), writes in values()) {
        let relay = BehaviorRelay::new(initial);
        let (_sub, seen) = collect(&relay.as_observable());
        for v in &writes {
            relay.accept(*v);
        }
        let mut expected = vec![initial];
        expected.extend(writes.iter().copied());
        prop_assert_eq!(snapshot(&seen), expected);
    }

    #[test]
    fn skip_drops_exactly_n(items in values(), n in 0usize..64) {
        let (_sub, seen) = collect(&Observable::of(items.clone()).skip(n));
        let expected: Vec<i32> = items.iter().skip(n).copied().collect();
        prop_assert_eq!(snapshot(&seen), expected);
    }

    #[test]
    fn share_replays_bounded_tail(items in values(), replay in 0usize..8) {
        let subject = PublishSubject::new();
        let connects = Arc::new(AtomicU32::new(0));
        let connects_clone = Arc::clone(&connects);
        let hot = subject.as_observable();
        let source = Observable::new(move |observer: Observer<i32>| {
            connects_clone.fetch_add(1, Ordering::SeqCst);
            hot.subscribe_observer(observer)
        });
        let shared = source.share_replay(replay);

        let (_first, first) = collect(&shared);
        for v in &items {
            subject.next(*v);
        }
        let (_late, late) = collect(&shared);

        let tail_start = items.len().saturating_sub(replay);
        prop_assert_eq!(snapshot(&first), items.clone());
        prop_assert_eq!(snapshot(&late), items[tail_start..].to_vec());
        prop_assert_eq!(connects.load(Ordering::SeqCst), 1);
        prop_assert_eq!(subject.observer_count(), 1);
    }

    #[test]
    fn map_preserves_order(items in values()) {
        let (_sub, seen) = collect(&Observable::of(items.clone()).map(i64::from));
        let expected: Vec<i64> = items.iter().copied().map(i64::from).collect();
        prop_assert_eq!(snapshot(&seen), expected);
    }
}
