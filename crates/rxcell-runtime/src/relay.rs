#![forbid(unsafe_code)]

//! Behavior relay: a mutable value cell observable as a stream.
//!
//! # Design
//!
//! The current value lives in an [`ArcSwap`], so [`BehaviorRelay::value`]
//! never blocks on writers. Writes and subscriptions go through a re-entrant
//! emission gate:
//!
//! - `accept` stores the value and notifies a snapshot of observers while
//!   holding the gate, so two writers never interleave their notifications.
//! - `subscribe` registers the observer and replays the current value while
//!   holding the gate, so no write can reach a new observer before its
//!   replay.
//! - The gate is re-entrant: an observer may call `accept` or `subscribe` on
//!   the same relay from inside its callback without deadlocking. A nested
//!   `accept` stores its value at once but is delivered only after the outer
//!   write has reached every observer.
//!
//! # Invariants
//!
//! 1. The relay always holds a value; there is no empty state.
//! 2. A new subscription's first element is the value current at
//!    subscription time.
//! 3. Observers are notified in registration order.
//! 4. Every observer receives writes in the order they were accepted, so
//!    the last value it has seen equals [`BehaviorRelay::value`] once the
//!    outermost `accept` returns.
//! 5. A subscription guard holds only a weak reference to the relay.

use std::fmt;
use std::sync::{Arc, Weak};

use arc_swap::ArcSwap;
use parking_lot::ReentrantMutex;

use crate::observable::Observable;
use crate::observer::{Observer, ObserverList, observer};
use crate::subscription::Subscription;

struct RelayInner<T> {
    gate: ReentrantMutex<()>,
    current: ArcSwap<T>,
    observers: ObserverList<T>,
}

impl<T: Clone + Send + Sync + 'static> RelayInner<T> {
    fn subscribe(self: &Arc<Self>, observer: Observer<T>) -> Subscription {
        let _gate = self.gate.lock();
        let id = self.observers.insert(Arc::clone(&observer));
        #[cfg(feature = "tracing")]
        tracing::trace!(message = "relay.subscribe", id, observers = self.observers.len());
        observer((**self.current.load()).clone());

        let weak: Weak<Self> = Arc::downgrade(self);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                let _removed = inner.observers.remove(id);
                #[cfg(feature = "tracing")]
                tracing::trace!(message = "relay.unsubscribe", id, removed = _removed);
            }
        })
    }
}

/// A mutable cell holding exactly one current value.
///
/// Cloning a `BehaviorRelay` creates a new handle to the **same** cell.
///
/// ```
/// use rxcell_runtime::BehaviorRelay;
///
/// let relay = BehaviorRelay::new(1);
/// let handle = relay.clone();
/// handle.accept(2);
/// assert_eq!(relay.value(), 2);
/// ```
pub struct BehaviorRelay<T> {
    inner: Arc<RelayInner<T>>,
}

impl<T> Clone for BehaviorRelay<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for BehaviorRelay<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BehaviorRelay")
            .field("value", &**self.inner.current.load())
            .field("observers", &self.inner.observers.len())
            .finish()
    }
}

impl<T: Clone + Send + Sync + 'static> BehaviorRelay<T> {
    /// Create a relay holding `value`.
    pub fn new(value: T) -> Self {
        Self {
            inner: Arc::new(RelayInner {
                gate: ReentrantMutex::new(()),
                current: ArcSwap::from_pointee(value),
                observers: ObserverList::new(),
            }),
        }
    }

    /// Clone out the current value.
    #[must_use]
    pub fn value(&self) -> T {
        (**self.inner.current.load()).clone()
    }

    /// Access the current value by reference without cloning.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&**self.inner.current.load())
    }

    /// Replace the current value and notify every observer.
    pub fn accept(&self, value: T) {
        let _gate = self.inner.gate.lock();
        let value = Arc::new(value);
        self.inner.current.store(Arc::clone(&value));
        self.inner.observers.emit(value.as_ref());
    }

    /// The relay as a stream: current value first, then every later write.
    pub fn as_observable(&self) -> Observable<T> {
        let inner = Arc::clone(&self.inner);
        Observable::new(move |observer| inner.subscribe(observer))
    }

    /// Subscribe directly. Equivalent to `as_observable().subscribe(on_next)`.
    pub fn subscribe(&self, on_next: impl Fn(T) + Send + Sync + 'static) -> Subscription {
        self.inner.subscribe(observer(on_next))
    }

    /// Number of currently registered observers.
    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.inner.observers.len()
    }

    /// Whether two handles refer to the same cell.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T: Clone + Send + Sync + Default + 'static> Default for BehaviorRelay<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    fn collect<T: Clone + Send + Sync + 'static>(
        relay: &BehaviorRelay<T>,
    ) -> (Subscription, Arc<Mutex<Vec<T>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);
        let sub = relay.subscribe(move |v| seen_clone.lock().push(v));
        (sub, seen)
    }

    #[test]
    fn new_and_value() {
        let relay = BehaviorRelay::new(42);
        assert_eq!(relay.value(), 42);
    }

    #[test]
    fn accept_replaces_value() {
        let relay = BehaviorRelay::new(0);
        relay.accept(100);
        assert_eq!(relay.value(), 100);
    }

    #[test]
    fn subscribe_replays_then_follows() {
        let relay = BehaviorRelay::new(1);
        let (_sub, seen) = collect(&relay);
        relay.accept(2);
        relay.accept(3);
        assert_eq!(*seen.lock(), vec![1, 2, 3]);
    }

    #[test]
    fn late_subscriber_replays_latest() {
        let relay = BehaviorRelay::new(1);
        relay.accept(2);
        let (_sub, seen) = collect(&relay);
        assert_eq!(*seen.lock(), vec![2]);
    }

    #[test]
    fn equal_writes_are_still_delivered() {
        let relay = BehaviorRelay::new(5);
        let (_sub, seen) = collect(&relay);
        relay.accept(5);
        assert_eq!(*seen.lock(), vec![5, 5]);
    }

    #[test]
    fn clone_shares_state() {
        let a = BehaviorRelay::new(0);
        let b = a.clone();
        b.accept(9);
        assert_eq!(a.value(), 9);
        assert!(a.ptr_eq(&b));
        assert!(!a.ptr_eq(&BehaviorRelay::new(9)));
    }

    #[test]
    fn unsubscribe_removes_observer() {
        let relay = BehaviorRelay::new(0);
        let (sub, seen) = collect(&relay);
        assert_eq!(relay.observer_count(), 1);
        sub.unsubscribe();
        assert_eq!(relay.observer_count(), 0);
        relay.accept(1);
        assert_eq!(*seen.lock(), vec![0]);
    }

    #[test]
    fn notification_order_follows_registration() {
        let relay = BehaviorRelay::new(0);
        let order = Arc::new(Mutex::new(Vec::new()));
        let subs: Vec<_> = (0..3)
            .map(|tag| {
                let order = Arc::clone(&order);
                relay.subscribe(move |v| order.lock().push((tag, v)))
            })
            .collect();
        order.lock().clear();
        relay.accept(1);
        assert_eq!(*order.lock(), vec![(0, 1), (1, 1), (2, 1)]);
        drop(subs);
    }

    #[test]
    fn reentrant_accept_from_observer() {
        let relay = BehaviorRelay::new(0);
        let relay_clone = relay.clone();
        let sub = relay.subscribe(move |v| {
            if v == 1 {
                relay_clone.accept(2);
            }
        });
        relay.accept(1);
        assert_eq!(relay.value(), 2);
        drop(sub);
    }

    #[test]
    fn nested_accept_reaches_later_observers_in_write_order() {
        let relay = BehaviorRelay::new(0);
        let writer = relay.clone();
        let _first = relay.subscribe(move |v| {
            if v == 1 {
                writer.accept(2);
            }
        });
        let (_second, seen) = collect(&relay);

        relay.accept(1);
        assert_eq!(*seen.lock(), vec![0, 1, 2]);
        assert_eq!(seen.lock().last().copied(), Some(relay.value()));
    }

    #[test]
    fn nested_accept_chain_keeps_order() {
        let relay = BehaviorRelay::new(0);
        let writer = relay.clone();
        let _first = relay.subscribe(move |v| {
            if (1..4).contains(&v) {
                writer.accept(v + 1);
            }
        });
        let (_second, seen) = collect(&relay);

        relay.accept(1);
        assert_eq!(*seen.lock(), vec![0, 1, 2, 3, 4]);
        assert_eq!(relay.value(), 4);
    }

    #[test]
    fn reentrant_subscribe_from_observer() {
        let relay = BehaviorRelay::new(0);
        let nested = Arc::new(Mutex::new(Vec::new()));
        let relay_clone = relay.clone();
        let nested_clone = Arc::clone(&nested);
        let sub = relay.subscribe(move |v| {
            if v == 1 {
                let seen = Arc::clone(&nested_clone);
                relay_clone.subscribe(move |v| seen.lock().push(v)).detach();
            }
        });
        relay.accept(1);
        relay.accept(2);
        assert_eq!(*nested.lock(), vec![1, 2]);
        drop(sub);
    }

    #[test]
    fn subscription_does_not_keep_relay_alive() {
        let relay = BehaviorRelay::new(String::from("x"));
        let sub = relay.subscribe(|_| {});
        let weak = Arc::downgrade(&relay.inner);
        drop(relay);
        assert!(weak.upgrade().is_none());
        // Teardown after the relay is gone is a no-op.
        sub.unsubscribe();
    }

    #[test]
    fn as_observable_restarts_per_subscription() {
        let relay = BehaviorRelay::new(1);
        let stream = relay.as_observable();
        let first = Arc::new(Mutex::new(Vec::new()));
        let first_clone = Arc::clone(&first);
        let _a = stream.subscribe(move |v| first_clone.lock().push(v));
        relay.accept(2);
        let second = Arc::new(Mutex::new(Vec::new()));
        let second_clone = Arc::clone(&second);
        let _b = stream.subscribe(move |v| second_clone.lock().push(v));
        assert_eq!(*first.lock(), vec![1, 2]);
        assert_eq!(*second.lock(), vec![2]);
    }

    #[test]
    fn with_borrows_current() {
        let relay = BehaviorRelay::new(vec![1, 2, 3]);
        assert_eq!(relay.with(|v| v.iter().sum::<i32>()), 6);
    }

    #[test]
    fn default_and_debug() {
        let relay: BehaviorRelay<i32> = BehaviorRelay::default();
        assert_eq!(relay.value(), 0);
        let dbg = format!("{relay:?}");
        assert!(dbg.contains("BehaviorRelay"));
        assert!(dbg.contains("observers"));
    }
}
