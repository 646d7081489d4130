//! EnvelopeBuffer - the ring buffer specialised for envelope units
//!
//! Wraps a [`RingBuffer<EnvelopeUnit>`] with the parts that only make sense
//! for envelopes:
//!
//! - Filename index kept in step with insertion and eviction
//! - Resume-by-identity subscriptions (`Last-Event-ID`)
//! - Lookup by identity
//! - Filtered, paginated snapshot reads
//!
//! One instance is created per process and shared by handle.
//!
//! # Locking
//!
//! Every operation that touches the index takes the index lock first and
//! the ring lock second. Delivery tasks take the ring lock only, so the two
//! never wait on each other in the opposite order.
//!
//! # Identity
//!
//! `put` mints the unit's identity while holding the index lock. Concurrent
//! ingests are serialised there, so identities strictly increase with buffer
//! position and identity lookups can binary search.

use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;
use tracing::debug;

use spotlight_envelope::{EnvelopeUnit, Uuid, next_envelope_id};

use crate::filter::ReadFilter;
use crate::index::FilenameIndex;
use crate::ring::{BufferStats, RingBuffer, RingView};
use crate::search::find_position;
use crate::subscriber::SubscriptionId;
use crate::DEFAULT_CAPACITY;

/// Envelope store with live subscriptions
#[derive(Debug)]
pub struct EnvelopeBuffer {
    ring: RingBuffer<EnvelopeUnit>,
    index: Mutex<FilenameIndex>,
}

impl EnvelopeBuffer {
    /// Create a buffer with default capacity
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a buffer with specified capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            ring: RingBuffer::with_capacity(capacity),
            index: Mutex::new(FilenameIndex::new()),
        }
    }

    /// Store a unit, evicting the oldest one when full
    ///
    /// The unit is given a fresh identity, newer than every buffered one.
    /// Use the returned handle for the stored identity.
    pub fn put(&self, mut unit: EnvelopeUnit) -> Arc<EnvelopeUnit> {
        let mut index = self.index.lock();

        unit.assign_id(next_envelope_id());
        let unit = Arc::new(unit);
        if let Some(evicted) = self.ring.put(Arc::clone(&unit)) {
            index.remove(&evicted);
            debug!(id = %evicted.id(), "evicted envelope");
        }
        index.insert(&unit);

        unit
    }

    /// Subscribe to buffered and future units
    ///
    /// With `last_id` the subscriber resumes right after that unit. An
    /// unknown or evicted identity replays everything currently buffered.
    pub fn subscribe<F>(&self, callback: F, last_id: Option<Uuid>) -> SubscriptionId
    where
        F: Fn(Arc<EnvelopeUnit>) + Send + Sync + 'static,
    {
        self.ring.subscribe_after(callback, |view| {
            let last_id = last_id?;
            let found = locate(view, last_id);
            if found.is_none() {
                debug!(%last_id, "resume id not buffered, replaying from head");
            }
            found
        })
    }

    /// Remove a subscriber; false if it was not registered
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.ring.unsubscribe(id)
    }

    /// Filtered snapshot, newest first
    pub fn read(&self, filter: &ReadFilter) -> Vec<Arc<EnvelopeUnit>> {
        let cutoff = filter.cutoff(Utc::now());

        let index = self.index.lock();
        let file_ids = filter
            .filename
            .as_deref()
            .map(|file| index.ids_matching(file));

        let slots = self.ring.read_where(|slot| {
            filter.matches(slot.item.id(), slot.inserted_at, cutoff, file_ids.as_ref())
        });
        drop(index);

        filter.paginate(slots.into_iter().map(|slot| slot.item).collect())
    }

    /// Buffered unit with the given identity
    pub fn get(&self, id: Uuid) -> Option<Arc<EnvelopeUnit>> {
        self.ring.inspect(|view| {
            let pos = locate(view, id)?;
            view.slot(pos).map(|slot| Arc::clone(&slot.item))
        })
    }

    /// Hard reset: drop everything and rewind subscribers to the start
    pub fn clear(&self) {
        let mut index = self.index.lock();
        self.ring.clear();
        index.clear();
        debug!("buffer cleared");
    }

    /// Soft reset: drop everything, subscribers continue with new units only
    pub fn reset(&self) {
        let mut index = self.index.lock();
        self.ring.reset();
        index.clear();
        debug!("buffer reset");
    }

    /// Number of distinct files in the filename index
    pub fn indexed_files(&self) -> usize {
        self.index.lock().len()
    }

    /// Snapshot of buffer counters
    pub fn stats(&self) -> BufferStats {
        self.ring.stats()
    }

    /// Number of buffered units
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    /// Check if nothing is buffered
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    /// Maximum number of buffered units
    pub fn capacity(&self) -> usize {
        self.ring.capacity()
    }

    /// Number of active subscriptions
    pub fn subscriber_count(&self) -> usize {
        self.ring.subscriber_count()
    }
}

impl Default for EnvelopeBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Position of the unit with identity `id`
fn locate(view: &RingView<'_, EnvelopeUnit>, id: Uuid) -> Option<u64> {
    find_position(view, &id, |unit| Some(unit.id()))
}

#[cfg(test)]
#[path = "envelope_buffer_test.rs"]
mod tests;
