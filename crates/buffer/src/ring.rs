//! Ring buffer with cursor-based subscriptions
//!
//! `RingBuffer` stores the last `capacity` items in a fixed array indexed by
//! `position % capacity`. Positions are absolute:
//!
//! - `write_pos` is the next position to write and only grows (except on
//!   [`RingBuffer::clear`])
//! - `head` is the oldest readable position
//!
//! Subscribers are delivered to on the Tokio runtime, never inline with
//! `put`. Each `put` cancels every subscriber's outstanding delivery and
//! schedules a new one, so a burst of puts collapses into a single pass per
//! subscriber.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tracing::{debug, trace};

use crate::subscriber::{PendingDelivery, Subscriber, SubscriptionId};
use crate::{DEFAULT_CAPACITY, MAX_CAPACITY};

/// A buffered item and when it was inserted
#[derive(Debug)]
pub struct Slot<T> {
    /// Absolute position of the item
    pub position: u64,
    /// Wall clock time of insertion
    pub inserted_at: DateTime<Utc>,
    /// The item
    pub item: Arc<T>,
}

impl<T> Clone for Slot<T> {
    fn clone(&self) -> Self {
        Self {
            position: self.position,
            inserted_at: self.inserted_at,
            item: Arc::clone(&self.item),
        }
    }
}

struct RingInner<T> {
    /// The ring
    slots: Vec<Option<Slot<T>>>,
    /// Capacity
    capacity: usize,
    /// Next position to write
    write_pos: u64,
    /// Oldest readable position
    head: u64,
    /// Total items ever put (survives clear)
    total_put: u64,
    /// Delivery passes that ran
    delivery_passes: u64,
    /// Live subscribers
    subscribers: HashMap<SubscriptionId, Subscriber<T>>,
}

impl<T> RingInner<T> {
    fn get(&self, pos: u64) -> Option<&Slot<T>> {
        if pos < self.head || pos >= self.write_pos {
            return None;
        }

        self.slots[(pos % self.capacity as u64) as usize]
            .as_ref()
            .filter(|slot| slot.position == pos)
    }

    /// Deliver everything from the subscriber's cursor up to `write_pos`
    fn deliver(&mut self, id: SubscriptionId) {
        let Some(subscriber) = self.subscribers.get_mut(&id) else {
            return;
        };

        self.delivery_passes += 1;

        // Anything below head was evicted while the subscriber lagged
        let mut pos = subscriber.pos.max(self.head);
        subscriber.pos = pos;

        let mut delivered = 0usize;
        while pos < self.write_pos {
            if let Some(slot) = &self.slots[(pos % self.capacity as u64) as usize]
                && slot.position == pos
            {
                subscriber.notify(Arc::clone(&slot.item));
                delivered += 1;
            }
            pos += 1;
            subscriber.pos = pos;
        }

        trace!(id, delivered, cursor = pos, "delivery pass complete");
    }
}

/// Read-only view of the buffer, valid while the buffer lock is held
pub struct RingView<'a, T> {
    inner: &'a RingInner<T>,
}

impl<'a, T> RingView<'a, T> {
    /// Oldest readable position
    #[inline]
    pub fn head(&self) -> u64 {
        self.inner.head
    }

    /// Next position to write
    #[inline]
    pub fn write_pos(&self) -> u64 {
        self.inner.write_pos
    }

    /// Item at an absolute position, if still buffered
    #[inline]
    pub fn get(&self, pos: u64) -> Option<&'a T> {
        self.inner.get(pos).map(|slot| slot.item.as_ref())
    }

    /// Slot at an absolute position, if still buffered
    #[inline]
    pub fn slot(&self, pos: u64) -> Option<&'a Slot<T>> {
        self.inner.get(pos)
    }
}

/// Fixed-capacity ring buffer with live subscribers
pub struct RingBuffer<T> {
    inner: Arc<Mutex<RingInner<T>>>,
}

impl<T: Send + Sync + 'static> RingBuffer<T> {
    /// Create a buffer with default capacity
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a buffer with specified capacity (clamped to `1..=MAX_CAPACITY`)
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.clamp(1, MAX_CAPACITY);
        Self {
            inner: Arc::new(Mutex::new(RingInner {
                slots: (0..capacity).map(|_| None).collect(),
                capacity,
                write_pos: 0,
                head: 0,
                total_put: 0,
                delivery_passes: 0,
                subscribers: HashMap::new(),
            })),
        }
    }

    /// Insert an item, returning the item it evicted (if any)
    ///
    /// Schedules a delivery pass for every subscriber.
    pub fn put(&self, item: Arc<T>) -> Option<Arc<T>> {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;

        let pos = inner.write_pos;
        let idx = (pos % inner.capacity as u64) as usize;
        let evicted = inner.slots[idx].take().map(|slot| slot.item);

        inner.slots[idx] = Some(Slot {
            position: pos,
            inserted_at: Utc::now(),
            item,
        });
        inner.write_pos += 1;
        inner.head = inner
            .head
            .max(inner.write_pos.saturating_sub(inner.capacity as u64));
        inner.total_put += 1;

        let ids: Vec<SubscriptionId> = inner.subscribers.keys().copied().collect();
        for id in ids {
            self.schedule_delivery(inner, id);
        }

        evicted
    }

    /// Subscribe from the oldest buffered item onward
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(Arc<T>) + Send + Sync + 'static,
    {
        self.subscribe_after(callback, |_| None)
    }

    /// Subscribe starting right after the position returned by `locate`
    ///
    /// `locate` runs under the buffer lock. When it returns None, or a
    /// position that is no longer buffered, the subscriber starts at `head`
    /// and receives everything currently buffered.
    pub fn subscribe_after<F, L>(&self, callback: F, locate: L) -> SubscriptionId
    where
        F: Fn(Arc<T>) + Send + Sync + 'static,
        L: FnOnce(&RingView<'_, T>) -> Option<u64>,
    {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;

        let start = match locate(&RingView { inner: &*inner }) {
            Some(pos) if pos >= inner.head && pos < inner.write_pos => pos + 1,
            _ => inner.head,
        };

        let subscriber = Subscriber::new(Arc::new(callback), start);
        let id = subscriber.id();
        inner.subscribers.insert(id, subscriber);

        debug!(id, start, "new subscriber");

        self.schedule_delivery(inner, id);
        id
    }

    /// Remove a subscriber and cancel its pending delivery
    ///
    /// Returns false if the subscriber was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut inner = self.inner.lock();
        match inner.subscribers.remove(&id) {
            Some(mut subscriber) => {
                subscriber.cancel_pending();
                debug!(id, "subscriber removed");
                true
            }
            None => false,
        }
    }

    /// Snapshot of buffered slots passing `predicate`, newest first
    pub fn read_where<P>(&self, mut predicate: P) -> Vec<Slot<T>>
    where
        P: FnMut(&Slot<T>) -> bool,
    {
        let inner = self.inner.lock();
        let mut result = Vec::new();

        for pos in (inner.head..inner.write_pos).rev() {
            if let Some(slot) = inner.get(pos)
                && predicate(slot)
            {
                result.push(slot.clone());
            }
        }

        result
    }

    /// Run `f` against a consistent view of the buffer
    pub fn inspect<R>(&self, f: impl FnOnce(&RingView<'_, T>) -> R) -> R {
        let inner = self.inner.lock();
        f(&RingView { inner: &*inner })
    }

    /// Hard reset: drop everything and rewind all cursors to zero
    pub fn clear(&self) {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;

        inner.slots.iter_mut().for_each(|slot| *slot = None);
        inner.write_pos = 0;
        inner.head = 0;

        for subscriber in inner.subscribers.values_mut() {
            subscriber.cancel_pending();
            subscriber.pos = inner.head;
        }
    }

    /// Soft reset: drop everything but keep positions and cursors
    ///
    /// Lagging cursors are clamped to `head` on their next delivery pass.
    pub fn reset(&self) {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;

        inner.slots.iter_mut().for_each(|slot| *slot = None);
        inner.head = inner.write_pos;
    }

    /// Number of buffered items
    pub fn len(&self) -> usize {
        let inner = self.inner.lock();
        (inner.write_pos - inner.head) as usize
    }

    /// Check if the buffer is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get capacity
    pub fn capacity(&self) -> usize {
        self.inner.lock().capacity
    }

    /// Number of live subscribers
    pub fn subscriber_count(&self) -> usize {
        self.inner.lock().subscribers.len()
    }

    /// Get buffer statistics
    pub fn stats(&self) -> BufferStats {
        let inner = self.inner.lock();
        BufferStats {
            capacity: inner.capacity,
            len: (inner.write_pos - inner.head) as usize,
            head: inner.head,
            write_pos: inner.write_pos,
            total_put: inner.total_put,
            subscriber_count: inner.subscribers.len(),
            delivery_passes: inner.delivery_passes,
        }
    }

    /// Replace the subscriber's pending delivery with a new one
    ///
    /// Without a Tokio runtime the pass runs inline.
    fn schedule_delivery(&self, inner: &mut RingInner<T>, id: SubscriptionId) {
        let Ok(runtime) = Handle::try_current() else {
            inner.deliver(id);
            return;
        };

        let Some(subscriber) = inner.subscribers.get_mut(&id) else {
            return;
        };

        subscriber.cancel_pending();
        let ticket = subscriber.issue_ticket();

        let weak = Arc::downgrade(&self.inner);
        let task = runtime.spawn(async move {
            // Let the rest of the current burst land first
            tokio::task::yield_now().await;
            run_delivery(&weak, id, ticket);
        });

        subscriber.pending = Some(PendingDelivery {
            ticket,
            handle: task.abort_handle(),
        });
    }
}

/// Body of a scheduled delivery task
fn run_delivery<T>(inner: &Weak<Mutex<RingInner<T>>>, id: SubscriptionId, ticket: u64) {
    let Some(inner) = inner.upgrade() else {
        return;
    };

    let mut inner = inner.lock();
    match inner.subscribers.get_mut(&id) {
        Some(subscriber) => subscriber.complete(ticket),
        // Unsubscribed after this pass was scheduled
        None => return,
    }
    inner.deliver(id);
}

impl<T: Send + Sync + 'static> Default for RingBuffer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for RingBuffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("RingBuffer")
            .field("capacity", &inner.capacity)
            .field("head", &inner.head)
            .field("write_pos", &inner.write_pos)
            .field("subscribers", &inner.subscribers.len())
            .finish()
    }
}

/// Statistics about the buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferStats {
    /// Slot count
    pub capacity: usize,
    /// Items currently buffered
    pub len: usize,
    /// Oldest readable position
    pub head: u64,
    /// Next position to write
    pub write_pos: u64,
    /// Total items ever put
    pub total_put: u64,
    /// Current number of subscribers
    pub subscriber_count: usize,
    /// Delivery passes that ran
    pub delivery_passes: u64,
}

#[cfg(test)]
#[path = "ring_test.rs"]
mod tests;
