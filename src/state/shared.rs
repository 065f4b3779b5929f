//! Shared state container with atomic updates and change notification.
//!
//! A `SharedState<S>` holds one immutable snapshot. Mutation only happens
//! through [`SharedState::update`], which applies a function to the current
//! snapshot while holding the cell lock, so concurrent producers are applied
//! serially and never from a stale base.
//!
//! Two ways to follow changes:
//! - [`SharedState::observe`] returns a [`Subscription`], an unbounded stream of
//!   committed snapshots for collaborators that poll or `.await`.
//! - [`SharedState::watch`] registers a synchronous observer, which is what the
//!   form and pager controllers use. Observers run after the lock is released.

use std::collections::VecDeque;
use std::ops::ControlFlow;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::task::{Context, Poll};

use futures_core::Stream;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::mvi::Snapshot;

type WatchFn<S> = Box<dyn FnMut(&S) -> ControlFlow<()> + Send>;

struct Cell<S> {
    value: S,
    version: u64,
    streams: Vec<mpsc::UnboundedSender<S>>,
}

struct Watcher<S> {
    id: u64,
    active: AtomicBool,
    callback: Mutex<WatchFn<S>>,
}

struct SharedInner<S> {
    cell: Mutex<Cell<S>>,
    watchers: Mutex<Vec<Arc<Watcher<S>>>>,
    /// Committed snapshots not yet delivered to watchers, in commit order.
    pending: Mutex<VecDeque<S>>,
    dispatching: AtomicBool,
    next_watcher: AtomicU64,
}

/// Observable holder of an immutable snapshot.
///
/// Cloning the handle is cheap and every clone refers to the same cell.
#[derive(Clone)]
pub struct SharedState<S> {
    inner: Arc<SharedInner<S>>,
}

impl<S: Snapshot> SharedState<S> {
    /// Create a container holding `value`.
    pub fn new(value: S) -> Self {
        Self {
            inner: Arc::new(SharedInner {
                cell: Mutex::new(Cell {
                    value,
                    version: 0,
                    streams: Vec::new(),
                }),
                watchers: Mutex::new(Vec::new()),
                pending: Mutex::new(VecDeque::new()),
                dispatching: AtomicBool::new(false),
                next_watcher: AtomicU64::new(0),
            }),
        }
    }

    /// Current snapshot.
    pub fn get(&self) -> S {
        self.inner.cell.lock().value.clone()
    }

    /// Number of committed updates so far.
    pub fn version(&self) -> u64 {
        self.inner.cell.lock().version
    }

    /// Atomically replace the snapshot with `f(current)` and return the result.
    ///
    /// If the result equals the current snapshot nothing is committed and no
    /// subscriber is notified. `f` runs under the cell lock and must not touch
    /// this same container; a panic in `f` leaves the snapshot unchanged and
    /// propagates to the caller.
    pub fn update<F>(&self, f: F) -> S
    where
        F: FnOnce(S) -> S,
    {
        let next = {
            let mut cell = self.inner.cell.lock();
            let next = f(cell.value.clone());
            if next == cell.value {
                return next;
            }
            cell.value = next.clone();
            cell.version += 1;
            cell.streams.retain(|tx| tx.send(next.clone()).is_ok());
            // Queued under the cell lock so delivery order matches commit order.
            self.inner.pending.lock().push_back(next.clone());
            next
        };
        self.flush();
        next
    }

    /// Subscribe to every snapshot committed from now on.
    pub fn observe(&self) -> Subscription<S> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner.cell.lock().streams.push(tx);
        Subscription { receiver: rx }
    }

    /// Register a synchronous observer for snapshots committed from now on.
    ///
    /// The observer is removed when it returns `ControlFlow::Break(())`, when
    /// the returned handle is cancelled or dropped, or when the container goes
    /// away. Updates issued from inside an observer are delivered after the
    /// current snapshot has reached every observer.
    pub fn watch<F>(&self, callback: F) -> WatchHandle
    where
        F: FnMut(&S) -> ControlFlow<()> + Send + 'static,
    {
        let id = self.inner.next_watcher.fetch_add(1, Ordering::Relaxed);
        let watcher = Arc::new(Watcher {
            id,
            active: AtomicBool::new(true),
            callback: Mutex::new(Box::new(callback)),
        });
        self.inner.watchers.lock().push(watcher);

        let weak = Arc::downgrade(&self.inner);
        WatchHandle {
            cancel: Some(Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    remove_watcher(&inner, id);
                }
            })),
        }
    }

    /// Number of live watch observers.
    pub fn watcher_count(&self) -> usize {
        self.inner.watchers.lock().len()
    }

    /// Non-owning handle to this container.
    pub fn downgrade(&self) -> WeakState<S> {
        WeakState {
            inner: Arc::downgrade(&self.inner),
        }
    }

    fn flush(&self) {
        loop {
            if self.inner.dispatching.swap(true, Ordering::AcqRel) {
                // Someone further up the stack (or another producer) is draining.
                return;
            }
            loop {
                let next = self.inner.pending.lock().pop_front();
                let Some(snapshot) = next else { break };
                self.deliver(&snapshot);
            }
            self.inner.dispatching.store(false, Ordering::Release);
            if self.inner.pending.lock().is_empty() {
                return;
            }
        }
    }

    fn deliver(&self, snapshot: &S) {
        let watchers: Vec<Arc<Watcher<S>>> = self.inner.watchers.lock().clone();
        for watcher in watchers {
            if !watcher.active.load(Ordering::Acquire) {
                continue;
            }
            let flow = {
                let mut callback = watcher.callback.lock();
                (*callback)(snapshot)
            };
            if flow.is_break() {
                remove_watcher(&self.inner, watcher.id);
            }
        }
    }
}

impl<S: Snapshot + Default> Default for SharedState<S> {
    fn default() -> Self {
        Self::new(S::default())
    }
}

impl<S: Snapshot + std::fmt::Debug> std::fmt::Debug for SharedState<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let cell = self.inner.cell.lock();
        f.debug_struct("SharedState")
            .field("value", &cell.value)
            .field("version", &cell.version)
            .finish()
    }
}

fn remove_watcher<S>(inner: &SharedInner<S>, id: u64) {
    let mut watchers = inner.watchers.lock();
    if let Some(index) = watchers.iter().position(|w| w.id == id) {
        let watcher = watchers.remove(index);
        watcher.active.store(false, Ordering::Release);
    }
}

/// Back reference to a [`SharedState`] that does not keep it alive.
#[derive(Clone)]
pub struct WeakState<S> {
    inner: Weak<SharedInner<S>>,
}

impl<S: Snapshot> WeakState<S> {
    /// Upgrade to a usable handle if the container still exists.
    pub fn upgrade(&self) -> Option<SharedState<S>> {
        self.inner.upgrade().map(|inner| SharedState { inner })
    }
}

/// Cancels a [`SharedState::watch`] observer when dropped.
pub struct WatchHandle {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl WatchHandle {
    /// Remove the observer now.
    pub fn cancel(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for WatchHandle {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

/// Stream of committed snapshots for one subscriber.
///
/// Ends once the container is dropped. Dropping the subscription unsubscribes.
pub struct Subscription<S> {
    receiver: mpsc::UnboundedReceiver<S>,
}

impl<S> Subscription<S> {
    /// Wait for the next committed snapshot.
    pub async fn next(&mut self) -> Option<S> {
        self.receiver.recv().await
    }

    /// Next snapshot if one is already queued.
    pub fn try_next(&mut self) -> Option<S> {
        self.receiver.try_recv().ok()
    }

    /// All snapshots queued so far, oldest first.
    pub fn drain(&mut self) -> Vec<S> {
        let mut out = Vec::new();
        while let Ok(snapshot) = self.receiver.try_recv() {
            out.push(snapshot);
        }
        out
    }
}

impl<S> Stream for Subscription<S> {
    type Item = S;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<S>> {
        self.receiver.poll_recv(cx)
    }
}
