#![forbid(unsafe_code)]

//! Publish subject: a hot source without replay.

use std::fmt;
use std::sync::Arc;

use parking_lot::ReentrantMutex;

use crate::observable::Observable;
use crate::observer::{Observer, ObserverList, observer};
use crate::subscription::Subscription;

struct SubjectInner<T> {
    gate: ReentrantMutex<()>,
    observers: ObserverList<T>,
}

impl<T: Clone + Send + Sync + 'static> SubjectInner<T> {
    fn subscribe(self: &Arc<Self>, observer: Observer<T>) -> Subscription {
        let _gate = self.gate.lock();
        let id = self.observers.insert(observer);
        let weak = Arc::downgrade(self);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.observers.remove(id);
            }
        })
    }
}

/// Broadcasts each value to the observers registered at the time it is
/// pushed. Late subscribers see nothing that happened before they arrived.
///
/// Cloning a `PublishSubject` creates a new handle to the same observer list.
pub struct PublishSubject<T> {
    inner: Arc<SubjectInner<T>>,
}

impl<T> Clone for PublishSubject<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for PublishSubject<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublishSubject")
            .field("observers", &self.inner.observers.len())
            .finish()
    }
}

impl<T: Clone + Send + Sync + 'static> PublishSubject<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(SubjectInner {
                gate: ReentrantMutex::new(()),
                observers: ObserverList::new(),
            }),
        }
    }

    /// Push `value` to every current observer.
    pub fn next(&self, value: T) {
        let _gate = self.inner.gate.lock();
        self.inner.observers.emit(&value);
    }

    pub fn as_observable(&self) -> Observable<T> {
        let inner = Arc::clone(&self.inner);
        Observable::new(move |observer| inner.subscribe(observer))
    }

    pub fn subscribe(&self, on_next: impl Fn(T) + Send + Sync + 'static) -> Subscription {
        self.inner.subscribe(observer(on_next))
    }

    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.inner.observers.len()
    }
}

impl<T: Clone + Send + Sync + 'static> Default for PublishSubject<T> {
    fn default() -> Self {
        Self::new()
    }
}
