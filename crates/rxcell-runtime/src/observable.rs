#![forbid(unsafe_code)]

//! Push-based observable streams.
//!
//! An [`Observable<T>`] is a cloneable subscribe function. Subscribing hands
//! it an [`Observer`] and returns a [`Subscription`] guard. Streams here are
//! infinite: there is no completion or error channel.
//!
//! Hot sources ([`BehaviorRelay`](crate::BehaviorRelay),
//! [`PublishSubject`](crate::PublishSubject)) produce observables through
//! `as_observable()`. Operators wrap one observable in another without
//! subscribing until their own subscriber arrives.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::observer::{Observer, observer};
use crate::share;
use crate::subscription::Subscription;

type SubscribeFn<T> = dyn Fn(Observer<T>) -> Subscription + Send + Sync;

/// A stream of values delivered to subscribed observers.
///
/// Cloning an `Observable` clones the subscribe function, not any
/// subscription state: each subscription runs the source independently unless
/// the source is hot or shared with [`share_replay`](Self::share_replay).
pub struct Observable<T> {
    subscribe: Arc<SubscribeFn<T>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            subscribe: Arc::clone(&self.subscribe),
        }
    }
}

impl<T> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observable").finish_non_exhaustive()
    }
}

impl<T: Clone + Send + Sync + 'static> Observable<T> {
    /// Build an observable from a subscribe function.
    ///
    /// The function is called once per subscription. It may deliver values
    /// synchronously before returning.
    pub fn new(subscribe: impl Fn(Observer<T>) -> Subscription + Send + Sync + 'static) -> Self {
        Self {
            subscribe: Arc::new(subscribe),
        }
    }

    /// A cold observable that delivers `values` synchronously to every
    /// subscriber, in order.
    pub fn of(values: impl IntoIterator<Item = T>) -> Self {
        let values: Arc<[T]> = values.into_iter().collect();
        Self::new(move |observer| {
            for value in values.iter() {
                observer(value.clone());
            }
            Subscription::empty()
        })
    }

    /// An observable that never delivers anything.
    pub fn never() -> Self {
        Self::new(|_| Subscription::empty())
    }

    /// Subscribe with a per-element callback.
    pub fn subscribe(&self, on_next: impl Fn(T) + Send + Sync + 'static) -> Subscription {
        self.subscribe_observer(observer(on_next))
    }

    /// Subscribe with an already-wrapped observer.
    pub fn subscribe_observer(&self, observer: Observer<T>) -> Subscription {
        (self.subscribe)(observer)
    }

    /// Drop the first `count` elements of each subscription.
    #[must_use]
    pub fn skip(&self, count: usize) -> Self {
        let upstream = self.clone();
        Self::new(move |downstream| {
            let skipped = AtomicUsize::new(0);
            upstream.subscribe(move |value| {
                let dropped = skipped
                    .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                        (n < count).then_some(n + 1)
                    })
                    .is_ok();
                if !dropped {
                    downstream(value);
                }
            })
        })
    }

    /// Transform every element.
    #[must_use]
    pub fn map<U, F>(&self, f: F) -> Observable<U>
    where
        U: Clone + Send + Sync + 'static,
        F: Fn(T) -> U + Send + Sync + 'static,
    {
        let upstream = self.clone();
        let f = Arc::new(f);
        Observable::new(move |downstream| {
            let f = Arc::clone(&f);
            upstream.subscribe(move |value| downstream(f(value)))
        })
    }

    /// Multicast one upstream subscription to every subscriber.
    ///
    /// The first subscriber connects upstream; when the last subscriber
    /// leaves, the connection is dropped and the replay buffer is cleared.
    /// Subscribers arriving while connected first receive up to `replay` of
    /// the most recent values.
    #[must_use]
    pub fn share_replay(&self, replay: usize) -> Self {
        share::share_replay(self.clone(), replay)
    }
}
