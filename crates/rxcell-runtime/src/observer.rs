#![forbid(unsafe_code)]

//! Observer callbacks and the registration list shared by every hot source.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

/// A per-element callback.
///
/// Observers are reference counted so a source can call them from a snapshot
/// without holding any lock.
pub type Observer<T> = Arc<dyn Fn(T) + Send + Sync>;

/// Wrap a closure as an [`Observer`].
pub fn observer<T>(on_next: impl Fn(T) + Send + Sync + 'static) -> Observer<T> {
    Arc::new(on_next)
}

struct Entries<T> {
    next_id: u64,
    /// Sorted by id, which is registration order.
    observers: Vec<(u64, Observer<T>)>,
}

/// Values waiting for the in-progress [`ObserverList::emit`] to deliver them.
struct Pending<T> {
    draining: bool,
    queue: VecDeque<T>,
}

/// Registration-ordered observer list with stable ids.
///
/// # Invariants
///
/// 1. Ids are never reused within one list.
/// 2. [`snapshot`](Self::snapshot) yields observers in registration order.
/// 3. No lock is held while the caller runs the snapshot, so an observer may
///    insert into or remove from the same list re-entrantly.
/// 4. Every observer receives emitted values in emission order. An `emit`
///    made while another is delivering is queued and delivered by the
///    outer call once its current value has reached every observer.
pub struct ObserverList<T> {
    entries: Mutex<Entries<T>>,
    pending: Mutex<Pending<T>>,
}

impl<T> ObserverList<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Entries {
                next_id: 0,
                observers: Vec::new(),
            }),
            pending: Mutex::new(Pending {
                draining: false,
                queue: VecDeque::new(),
            }),
        }
    }

    /// Register an observer and return its id.
    pub fn insert(&self, observer: Observer<T>) -> u64 {
        let mut entries = self.entries.lock();
        let id = entries.next_id;
        entries.next_id += 1;
        entries.observers.push((id, observer));
        id
    }

    /// Remove the observer with `id`. Returns `false` if it was already gone.
    pub fn remove(&self, id: u64) -> bool {
        let mut entries = self.entries.lock();
        match entries.observers.binary_search_by_key(&id, |(k, _)| *k) {
            Ok(idx) => {
                entries.observers.remove(idx);
                true
            }
            Err(_) => false,
        }
    }

    /// Clone out the current observers.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Observer<T>> {
        self.entries
            .lock()
            .observers
            .iter()
            .map(|(_, observer)| Arc::clone(observer))
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().observers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Clone> ObserverList<T> {
    /// Deliver `value` to a snapshot of the list, cloning per observer.
    ///
    /// Called from inside an observer, the value is queued and returns
    /// immediately; the outermost call delivers it after the current value.
    pub fn emit(&self, value: &T) {
        {
            let mut pending = self.pending.lock();
            pending.queue.push_back(value.clone());
            if pending.draining {
                return;
            }
            pending.draining = true;
        }

        let _reset = DrainReset(&self.pending);
        loop {
            let next = {
                let mut pending = self.pending.lock();
                match pending.queue.pop_front() {
                    Some(next) => next,
                    None => {
                        pending.draining = false;
                        return;
                    }
                }
            };
            for observer in self.snapshot() {
                observer(next.clone());
            }
        }
    }
}

/// Unblocks the list when an observer panics mid-delivery.
struct DrainReset<'a, T>(&'a Mutex<Pending<T>>);

impl<T> Drop for DrainReset<'_, T> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            let mut pending = self.0.lock();
            pending.draining = false;
            pending.queue.clear();
        }
    }
}

impl<T> Default for ObserverList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for ObserverList<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObserverList")
            .field("len", &self.len())
            .finish()
    }
}
