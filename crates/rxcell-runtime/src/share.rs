#![forbid(unsafe_code)]

//! Reference-counted multicast with a bounded replay buffer.
//!
//! # Design
//!
//! A shared observable keeps one upstream connection for all of its
//! subscribers. The connection is scoped to "while connected":
//!
//! - The first subscriber connects upstream.
//! - Values from upstream go into a replay buffer of at most `replay`
//!   elements and then to every subscriber.
//! - A subscriber arriving while connected receives the buffer first.
//! - When the last subscriber leaves, the upstream subscription is dropped
//!   and the buffer is cleared, so a later subscriber reconnects from
//!   scratch.
//!
//! # Invariants
//!
//! 1. At most one upstream connection exists at any time.
//! 2. The buffer never holds more than `replay` elements.
//! 3. The buffer is empty whenever the share is disconnected.
//! 4. `subscribe` and `remove` release the share's gate before touching
//!    upstream, so chained shares do not lock against each other.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::{Mutex, ReentrantMutex};

use crate::observable::Observable;
use crate::observer::{Observer, ObserverList};
use crate::subscription::Subscription;

enum Connection {
    Idle,
    /// Upstream `subscribe` is in progress on some thread.
    Connecting,
    Connected(Subscription),
}

struct ShareState<T> {
    connection: Connection,
    buffer: VecDeque<T>,
}

struct ShareInner<T> {
    upstream: Observable<T>,
    replay: usize,
    gate: ReentrantMutex<()>,
    state: Mutex<ShareState<T>>,
    observers: ObserverList<T>,
}

impl<T: Clone + Send + Sync + 'static> ShareInner<T> {
    fn new(upstream: Observable<T>, replay: usize) -> Arc<Self> {
        Arc::new(Self {
            upstream,
            replay,
            gate: ReentrantMutex::new(()),
            state: Mutex::new(ShareState {
                connection: Connection::Idle,
                buffer: VecDeque::with_capacity(replay),
            }),
            observers: ObserverList::new(),
        })
    }

    fn subscribe(self: &Arc<Self>, observer: Observer<T>) -> Subscription {
        let (id, connect) = {
            let _gate = self.gate.lock();
            let id = self.observers.insert(Arc::clone(&observer));
            let replay: Vec<T> = self.state.lock().buffer.iter().cloned().collect();
            for value in replay {
                observer(value);
            }

            let mut state = self.state.lock();
            let connect = matches!(state.connection, Connection::Idle);
            if connect {
                state.connection = Connection::Connecting;
            }
            (id, connect)
        };

        if connect {
            self.connect();
        }

        let weak = Arc::downgrade(self);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.remove(id);
            }
        })
    }

    fn connect(self: &Arc<Self>) {
        #[cfg(feature = "tracing")]
        tracing::debug!(message = "share.connect", replay = self.replay);

        // The forwarder holds the share strongly: while connected, upstream
        // owns the share rather than the other way round.
        let forward_to = Arc::clone(self);
        let upstream = self.upstream.subscribe(move |value| forward_to.on_upstream(value));

        let stale = {
            let mut state = self.state.lock();
            if matches!(state.connection, Connection::Connecting) {
                state.connection = Connection::Connected(upstream);
                None
            } else {
                // Every subscriber left (or a nested connect won) while
                // upstream was still delivering synchronously.
                Some(upstream)
            }
        };
        if let Some(upstream) = stale {
            upstream.unsubscribe();
        }
    }

    fn on_upstream(&self, value: T) {
        let _gate = self.gate.lock();
        if self.replay > 0 {
            let mut state = self.state.lock();
            if state.buffer.len() == self.replay {
                state.buffer.pop_front();
            }
            state.buffer.push_back(value.clone());
        }
        self.observers.emit(&value);
    }

    fn remove(&self, id: u64) {
        let disconnected = {
            let _gate = self.gate.lock();
            if !self.observers.remove(id) || !self.observers.is_empty() {
                return;
            }
            let mut state = self.state.lock();
            state.buffer.clear();
            match std::mem::replace(&mut state.connection, Connection::Idle) {
                Connection::Connected(upstream) => Some(upstream),
                Connection::Connecting | Connection::Idle => None,
            }
        };

        if let Some(upstream) = disconnected {
            #[cfg(feature = "tracing")]
            tracing::debug!(message = "share.disconnect");
            upstream.unsubscribe();
        }
    }

    #[cfg(test)]
    fn is_connected(&self) -> bool {
        matches!(self.state.lock().connection, Connection::Connected(_))
    }
}

pub(crate) fn share_replay<T: Clone + Send + Sync + 'static>(
    upstream: Observable<T>,
    replay: usize,
) -> Observable<T> {
    let inner = ShareInner::new(upstream, replay);
    Observable::new(move |observer| inner.subscribe(observer))
}

/// Same as [`share_replay`], plus a probe reporting the connection state.
#[cfg(test)]
fn share_replay_with_probe<T: Clone + Send + Sync + 'static>(
    upstream: Observable<T>,
    replay: usize,
) -> (Observable<T>, impl Fn() -> bool) {
    let inner = ShareInner::new(upstream, replay);
    let probe = Arc::clone(&inner);
    (
        Observable::new(move |observer| inner.subscribe(observer)),
        move || probe.is_connected(),
    )
}
