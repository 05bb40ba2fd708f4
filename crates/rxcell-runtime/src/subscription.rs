#![forbid(unsafe_code)]

//! RAII subscription guards.
//!
//! Every `subscribe` call in this crate returns a [`Subscription`]. Dropping
//! it removes the observer from its source. Call [`Subscription::detach`] to
//! keep the observer registered for as long as the source itself lives.

use std::fmt;

type Teardown = Box<dyn FnOnce() + Send + Sync>;

/// Guard for a registered observer.
///
/// The teardown runs at most once: on [`unsubscribe`](Self::unsubscribe) or
/// on drop, whichever happens first. A detached subscription never runs it.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    teardown: Option<Teardown>,
}

impl Subscription {
    /// Create a subscription that runs `teardown` when cancelled.
    pub fn new(teardown: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            teardown: Some(Box::new(teardown)),
        }
    }

    /// A subscription with nothing to tear down.
    ///
    /// Returned by sources that finish all their work inside `subscribe`.
    pub fn empty() -> Self {
        Self { teardown: None }
    }

    /// Whether cancelling this subscription would still do anything.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.teardown.is_some()
    }

    /// Remove the observer from its source now.
    pub fn unsubscribe(mut self) {
        self.cancel();
    }

    /// Give up the ability to cancel.
    ///
    /// The observer stays registered until the source drops it. Use this when
    /// the observer's lifetime belongs to the source rather than to whoever
    /// called `subscribe`.
    pub fn detach(mut self) {
        self.teardown = None;
    }

    fn cancel(&mut self) {
        if let Some(teardown) = self.teardown.take() {
            teardown();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}
