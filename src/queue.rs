// Copyright (C) 2026 the tracing-gelf authors
//
// This file is part of tracing-gelf.
//
// tracing-gelf is free software: you can redistribute it and/or modify it under the terms of the
// GNU General Public License as published by the Free Software Foundation, either version 3 of the
// License, or (at your option) any later version.
//
// tracing-gelf is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without
// even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU
// General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with tracing-gelf.  If
// not, see <http://www.gnu.org/licenses/>.

//! A thread-safe FIFO that notifies listeners of its own mutations.
//!
//! [`ObservableQueue`] decouples threads that *produce* log records from the (slow) consumer
//! that writes them: producers enqueue and return immediately; a listener registered with
//! [`on_enqueued`](ObservableQueue::on_enqueued) drains the queue in batches via
//! [`dequeue_all`](ObservableQueue::dequeue_all) and performs the I/O. Draining everything in
//! one call from the notification handler is what gives the consumer at-most-one-active-drain
//! behavior without any further coordination: a batch is removed atomically, so no record can
//! be written twice, and one notification covers the whole batch.
//!
//! Notifications are fire-and-forget. They run on a detached thread, after the lock has been
//! released, with each listener wrapped in [`catch_unwind`](std::panic::catch_unwind) --
//! a slow, re-entrant or panicking listener can neither stall nor crash a producer. The price
//! is that delivery is best-effort and carries no ordering guarantee relative to queue
//! operations that follow the mutation.

use tracing::error;

use std::{
    collections::VecDeque,
    panic::AssertUnwindSafe,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

/// Capacity used by [`ObservableQueue::new`].
pub const DEFAULT_CAPACITY: usize = 16;

type Listener = Arc<dyn Fn() + Send + Sync + 'static>;

/// A list of listeners for one kind of queue event.
///
/// Registration is expected to be rare (typically once, at wiring time), so a `Mutex<Vec>`
/// snapshot-cloned at dispatch is plenty.
struct Listeners(Mutex<Vec<Listener>>);

impl Listeners {
    fn new() -> Listeners {
        Listeners(Mutex::new(Vec::new()))
    }

    fn push(&self, listener: Listener) {
        self.0.lock().unwrap_or_else(std::sync::PoisonError::into_inner).push(listener);
    }

    /// Invoke every listener on a detached thread; never blocks the caller.
    fn notify(&self) {
        let snapshot: Vec<Listener> = self.0.lock().unwrap_or_else(std::sync::PoisonError::into_inner).clone();
        if snapshot.is_empty() {
            return;
        }
        let spawned = std::thread::Builder::new()
            .name("observable-queue-notify".to_string())
            .spawn(move || {
                for listener in snapshot {
                    // A listener that panics must not take the notification thread (or any
                    // sibling listener) down with it.
                    if std::panic::catch_unwind(AssertUnwindSafe(|| listener())).is_err() {
                        error!("a queue listener panicked; continuing");
                    }
                }
            });
        if let Err(err) = spawned {
            error!(error = %err, "failed to spawn queue notification thread");
        }
    }
}

/// A generic, thread-safe FIFO with fire-and-forget mutation notifications.
///
/// All mutators take the same internal lock and hold it only for in-memory work; `len` and
/// `is_empty` read an atomic counter without locking. Callers only ever receive owned items
/// (or clones, for [`peek`](ObservableQueue::peek)) -- never a reference into the backing
/// buffer.
///
/// Absent entries are spelled [`None`]: [`enqueue`](ObservableQueue::enqueue) accepts
/// anything convertible into an `Option` so call sites can pass either a bare item or an
/// optional one, and `None` is silently ignored.
pub struct ObservableQueue<T> {
    items: Mutex<VecDeque<T>>,
    count: AtomicUsize,
    enqueued: Listeners,
    dequeued: Listeners,
}

impl<T> std::default::Default for ObservableQueue<T> {
    fn default() -> Self {
        ObservableQueue::new()
    }
}

impl<T> ObservableQueue<T> {
    /// An empty queue with the default initial capacity.
    pub fn new() -> ObservableQueue<T> {
        ObservableQueue::with_capacity(DEFAULT_CAPACITY)
    }

    /// An empty queue whose backing buffer starts out able to hold `capacity` items.
    pub fn with_capacity(capacity: usize) -> ObservableQueue<T> {
        ObservableQueue {
            items: Mutex::new(VecDeque::with_capacity(capacity)),
            count: AtomicUsize::new(0),
            enqueued: Listeners::new(),
            dequeued: Listeners::new(),
        }
    }

    /// Register a listener invoked (asynchronously) after items are added.
    pub fn on_enqueued(&self, listener: impl Fn() + Send + Sync + 'static) {
        self.enqueued.push(Arc::new(listener));
    }

    /// Register a listener invoked (asynchronously) after items are removed.
    pub fn on_dequeued(&self, listener: impl Fn() + Send + Sync + 'static) {
        self.dequeued.push(Arc::new(listener));
    }

    /// Append an item to the tail.
    ///
    /// Passing [`None`] is a silent no-op: nothing is stored, no notification fires. The call
    /// never blocks on listener execution.
    pub fn enqueue(&self, item: impl Into<Option<T>>) {
        let item = match item.into() {
            Some(item) => item,
            None => return,
        };
        {
            let mut items = self.items.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
            items.push_back(item);
            self.count.store(items.len(), Ordering::Release);
        }
        self.enqueued.notify();
    }

    /// Remove and return the head, or [`None`] if the queue is empty.
    ///
    /// The empty case returns without taking the lock. One `dequeued` notification fires per
    /// successful removal.
    pub fn dequeue(&self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        let popped = {
            let mut items = self.items.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
            let popped = items.pop_front();
            self.count.store(items.len(), Ordering::Release);
            popped
        };
        // A racing consumer may have emptied the queue between the fast-path check and the
        // lock; only a removal that actually happened is announced.
        if popped.is_some() {
            self.dequeued.notify();
        }
        popped
    }

    /// Remove and return every currently-queued item, in FIFO order.
    ///
    /// The whole batch is removed under one lock acquisition and announced with exactly one
    /// `dequeued` notification, however many items it holds. An empty queue yields an empty
    /// `Vec` and no notification.
    pub fn dequeue_all(&self) -> Vec<T> {
        if self.is_empty() {
            return Vec::new();
        }
        let drained: Vec<T> = {
            let mut items = self.items.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
            let drained = items.drain(..).collect();
            self.count.store(0, Ordering::Release);
            drained
        };
        if !drained.is_empty() {
            self.dequeued.notify();
        }
        drained
    }

    /// A clone of the head item, or [`None`] if the queue is empty. Never notifies.
    pub fn peek(&self) -> Option<T>
    where
        T: Clone,
    {
        self.items.lock().unwrap_or_else(std::sync::PoisonError::into_inner).front().cloned()
    }

    /// Discard every queued item. Never notifies.
    pub fn clear(&self) {
        let mut items = self.items.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        items.clear();
        self.count.store(0, Ordering::Release);
    }

    /// Shrink the backing buffer to fit the current item count.
    ///
    /// Capacity management only; contents and count are unaffected. Note that [`VecDeque`]
    /// guarantees only `capacity() >= len()` afterwards.
    pub fn trim(&self) {
        self.items.lock().unwrap_or_else(std::sync::PoisonError::into_inner).shrink_to_fit();
    }

    /// Current item count. Lock-free; exact with respect to completed mutations.
    pub fn len(&self) -> usize {
        self.count.load(Ordering::Acquire)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current backing-buffer capacity (which may exceed [`len`](ObservableQueue::len) until
    /// [`trim`](ObservableQueue::trim) is called).
    pub fn capacity(&self) -> usize {
        self.items.lock().unwrap_or_else(std::sync::PoisonError::into_inner).capacity()
    }
}
