#![forbid(unsafe_code)]

//! Read-only reactive properties.
//!
//! A [`ReadOnlyProperty<T>`] presents a continuously updated value with two
//! observation modes: [`as_stream`](ReadOnlyProperty::as_stream) replays the
//! current value and then every change, [`changes`](ReadOnlyProperty::changes)
//! yields the changes only. There is no setter. Values arrive through one of
//! four constructors:
//!
//! | Constructor | Source of updates |
//! |---|---|
//! | [`ReadOnlyProperty::new`] | none; the value is fixed |
//! | [`ReadOnlyProperty::from_relay`] | writes to an externally owned [`BehaviorRelay`] |
//! | [`ReadOnlyProperty::with_source`] | every value of a source [`Observable`] |
//! | [`ReadOnlyProperty::from_sync_stream`] | a source that must emit synchronously on subscription |
//!
//! # Example
//!
//! ```
//! use std::sync::{Arc, Mutex};
//! use rxcell::{PublishSubject, ReadOnlyProperty};
//!
//! let temperature = PublishSubject::new();
//! let reading = ReadOnlyProperty::with_source(20, temperature.as_observable());
//!
//! let changes = Arc::new(Mutex::new(Vec::new()));
//! let changes_clone = Arc::clone(&changes);
//! let _sub = reading
//!     .changes()
//!     .subscribe(move |v| changes_clone.lock().unwrap().push(v));
//!
//! temperature.next(21);
//! temperature.next(23);
//!
//! assert_eq!(reading.value(), 23);
//! assert_eq!(*changes.lock().unwrap(), vec![21, 23]);
//! ```

pub mod error;
pub mod property;

pub use error::{PropertyError, Result};
pub use property::{ReadOnlyProperty, forwarding_subscriptions_total};
pub use rxcell_runtime::{BehaviorRelay, Observable, Observer, PublishSubject, Subscription};
