#![forbid(unsafe_code)]

//! Reactive primitives backing rxcell properties.
//!
//! - [`BehaviorRelay`]: a mutable cell that always holds a value and replays
//!   it to each new subscriber before forwarding later writes.
//! - [`PublishSubject`]: a hot source without replay.
//! - [`Observable`]: a cloneable subscribe function with the `skip`, `map`
//!   and `share_replay` combinators.
//! - [`Subscription`]: RAII guard that unsubscribes on drop, or can be
//!   detached so the source owns the observer.
//!
//! # Architecture
//!
//! Every type is `Send + Sync` and shares its state through `Arc`. Each hot
//! source serializes its own emissions behind a re-entrant gate and calls
//! observers from a snapshot of its observer list, so observers may write,
//! subscribe, or unsubscribe from inside a callback. There is no scheduler:
//! values are delivered on the thread that produced them.
//!
//! # Invariants
//!
//! 1. A relay is never empty.
//! 2. A relay subscription's first element is the value current at
//!    subscription time.
//! 3. Observers of one source are notified in registration order.
//! 4. Every observer of one source receives values in emission order, even
//!    when an observer emits into the same source from inside its callback.
//! 5. Dropping a [`Subscription`] removes the observer before the source's
//!    next emission; a detached subscription is never removed by its guard.
//!
//! # Example
//!
//! ```
//! use std::sync::{Arc, Mutex};
//! use rxcell_runtime::BehaviorRelay;
//!
//! let relay = BehaviorRelay::new(1);
//! let seen = Arc::new(Mutex::new(Vec::new()));
//! let seen_clone = Arc::clone(&seen);
//! let sub = relay.subscribe(move |v| seen_clone.lock().unwrap().push(v));
//!
//! relay.accept(2);
//! drop(sub);
//! relay.accept(3);
//!
//! assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
//! ```

pub mod observable;
pub mod observer;
pub mod relay;
mod share;
pub mod subject;
pub mod subscription;

pub use observable::Observable;
pub use observer::{Observer, ObserverList, observer};
pub use relay::BehaviorRelay;
pub use subject::PublishSubject;
pub use subscription::Subscription;
