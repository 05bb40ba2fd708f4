#![forbid(unsafe_code)]

//! Read-only reactive properties.
//!
//! # Design
//!
//! [`ReadOnlyProperty<T>`] keeps a [`BehaviorRelay<T>`] private and exposes
//! only its read and observe half: [`value`](ReadOnlyProperty::value),
//! [`as_stream`](ReadOnlyProperty::as_stream) and
//! [`changes`](ReadOnlyProperty::changes). Writes arrive either through an
//! externally owned relay handle or through a forwarding subscription from a
//! source observable.
//!
//! # Forwarding lifetime
//!
//! The forwarding subscription is detached when the property is built. The
//! source's observer list owns the forwarder, and the forwarder owns the
//! relay, so the relay keeps updating for as long as the source lives.
//! Dropping the property never cancels forwarding and never cuts off
//! subscribers of `as_stream()` or `changes()`.
//!
//! # Invariants
//!
//! 1. The relay always holds a value.
//! 2. The first element of every `as_stream()` subscription is `value()` at
//!    subscription time.
//! 3. `changes()` is `as_stream()` without its first element.
//! 4. Only the forwarding subscription writes to a relay the property
//!    created itself.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use rxcell_runtime::{BehaviorRelay, Observable};

use crate::error::{PropertyError, Result};

/// Total number of forwarding subscriptions detached by property
/// constructors.
static FORWARDING_SUBSCRIPTIONS_TOTAL: AtomicU64 = AtomicU64::new(0);

/// Read the number of forwarding subscriptions created so far (for
/// diagnostics).
#[must_use]
pub fn forwarding_subscriptions_total() -> u64 {
    FORWARDING_SUBSCRIPTIONS_TOTAL.load(Ordering::Relaxed)
}

/// A continuously updated value that callers can read and observe but not
/// set.
///
/// Cloning a `ReadOnlyProperty` creates a new handle to the **same** relay.
///
/// ```
/// use std::sync::{Arc, Mutex};
/// use rxcell::{Observable, ReadOnlyProperty};
///
/// let property = ReadOnlyProperty::with_source(0, Observable::of([1, 2, 3]));
/// assert_eq!(property.value(), 3);
///
/// let seen = Arc::new(Mutex::new(Vec::new()));
/// let seen_clone = Arc::clone(&seen);
/// let _sub = property
///     .as_stream()
///     .subscribe(move |v| seen_clone.lock().unwrap().push(v));
/// assert_eq!(*seen.lock().unwrap(), vec![3]);
/// ```
pub struct ReadOnlyProperty<T> {
    relay: BehaviorRelay<T>,
}

impl<T> Clone for ReadOnlyProperty<T> {
    fn clone(&self) -> Self {
        Self {
            relay: self.relay.clone(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for ReadOnlyProperty<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadOnlyProperty")
            .field("relay", &self.relay)
            .finish()
    }
}

impl<T: Clone + Send + Sync + 'static> ReadOnlyProperty<T> {
    /// A property that holds `value` forever.
    pub fn new(value: T) -> Self {
        Self {
            relay: BehaviorRelay::new(value),
        }
    }

    /// A read-only view over an externally owned relay.
    ///
    /// Writes made through `relay.accept` (or any other handle to the same
    /// relay) are visible through the property immediately.
    pub fn from_relay(relay: BehaviorRelay<T>) -> Self {
        Self { relay }
    }

    /// A property seeded with `initial` and then fed by every value `source`
    /// produces, in emission order.
    ///
    /// The forwarding subscription is detached: dropping the property does
    /// not cancel it.
    pub fn with_source(initial: T, source: Observable<T>) -> Self {
        let relay = BehaviorRelay::new(initial);
        let target = relay.clone();
        source.subscribe(move |value| target.accept(value)).detach();

        let _total = FORWARDING_SUBSCRIPTIONS_TOTAL.fetch_add(1, Ordering::Relaxed) + 1;
        #[cfg(feature = "tracing")]
        tracing::debug!(message = "property.forward", forwarders_total = _total);

        Self { relay }
    }

    /// A property whose initial value is whatever `source` delivers
    /// synchronously on subscription.
    ///
    /// `source` is shared with a one-element replay, a capturing observer
    /// records the values delivered before `subscribe` returns (the last one
    /// wins) and is then unsubscribed, and the property is built as
    /// [`with_source`](Self::with_source) over the shared stream.
    ///
    /// # Panics
    ///
    /// Panics if `source` does not emit at least one value synchronously.
    /// This is a caller precondition, not a recoverable error; use
    /// [`try_from_sync_stream`](Self::try_from_sync_stream) to check it.
    ///
    /// Whether the panic terminates the process is decided by the final
    /// binary's `panic` strategy. Under the default `unwind` strategy it is
    /// an ordinary panic that `std::panic::catch_unwind` can intercept.
    pub fn from_sync_stream(source: Observable<T>) -> Self {
        match Self::try_from_sync_stream(source) {
            Ok(property) => property,
            Err(err) => {
                #[cfg(feature = "tracing")]
                tracing::error!(message = "property.sync_capture_failed", error = %err);
                panic!("ReadOnlyProperty::from_sync_stream: {err}");
            }
        }
    }

    /// Checked form of [`from_sync_stream`](Self::from_sync_stream).
    ///
    /// # Errors
    ///
    /// Returns [`PropertyError::NoSynchronousValue`] if `source` delivers
    /// nothing before its `subscribe` returns.
    pub fn try_from_sync_stream(source: Observable<T>) -> Result<Self> {
        let shared = source.share_replay(1);

        let slot: Arc<Mutex<(Option<T>, usize)>> = Arc::new(Mutex::new((None, 0)));
        let capture = Arc::clone(&slot);
        shared
            .subscribe(move |value| {
                let mut captured = capture.lock();
                captured.0 = Some(value);
                captured.1 += 1;
            })
            .unsubscribe();

        let (initial, _count) = std::mem::take(&mut *slot.lock());
        #[cfg(feature = "tracing")]
        tracing::trace!(message = "property.sync_capture", captured = _count);

        let initial = initial.ok_or(PropertyError::NoSynchronousValue)?;
        Ok(Self::with_source(initial, shared))
    }

    /// Clone out the current value.
    #[must_use]
    pub fn value(&self) -> T {
        self.relay.value()
    }

    /// Access the current value by reference without cloning.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.relay.with(f)
    }

    /// The current value, then every later update.
    ///
    /// Each subscription replays the value current at the moment it
    /// subscribes. Unsubscribing has no effect on the property.
    #[must_use]
    pub fn as_stream(&self) -> Observable<T> {
        self.relay.as_observable()
    }

    /// Every update after the moment of subscription.
    #[must_use]
    pub fn changes(&self) -> Observable<T> {
        self.as_stream().skip(1)
    }

    /// A derived property holding `f(value)`, updated on every change.
    pub fn map<U, F>(&self, f: F) -> ReadOnlyProperty<U>
    where
        U: Clone + Send + Sync + 'static,
        F: Fn(T) -> U + Send + Sync + 'static,
    {
        let initial = f(self.value());
        // Follow the full stream: its replay covers any write that lands
        // between reading `initial` and subscribing.
        ReadOnlyProperty::with_source(initial, self.as_stream().map(f))
    }
}

impl<T: Clone + Send + Sync + 'static> From<BehaviorRelay<T>> for ReadOnlyProperty<T> {
    fn from(relay: BehaviorRelay<T>) -> Self {
        Self::from_relay(relay)
    }
}

impl<T: Clone + Send + Sync + Default + 'static> Default for ReadOnlyProperty<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}
