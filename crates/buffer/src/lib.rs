//! Spotlight Buffer - in-memory envelope store with live streaming
//!
//! A fixed-capacity ring buffer that serves two kinds of readers at once:
//!
//! - Snapshot reads: newest-first filtered copies of what is buffered now
//! - Subscribers: per-client cursors that receive every item from their
//!   start position onward, resumable by envelope identity
//!
//! # Architecture
//!
//! ```text
//! ingest ──→ EnvelopeBuffer.put()
//!                 │
//!                 ├──→ FilenameIndex (insert / evict)
//!                 │
//!                 └──→ RingBuffer<EnvelopeUnit>
//!                           │  slots[pos % capacity]
//!                           │
//!                           └──→ schedule delivery (debounced per subscriber)
//!                                     │
//!                                     ▼
//!                               callback(item) for pos in cursor..write_pos
//! ```
//!
//! Positions are absolute and only grow: `head = max(0, write_pos - capacity)`
//! and position `i` is readable iff `head <= i < write_pos`. A subscriber whose
//! cursor falls behind `head` silently skips the evicted range.

mod envelope_buffer;
mod filter;
mod index;
mod ring;
mod search;
mod subscriber;

#[cfg(test)]
mod test_support;

pub use envelope_buffer::EnvelopeBuffer;
pub use filter::ReadFilter;
pub use index::FilenameIndex;
pub use ring::{BufferStats, RingBuffer, RingView, Slot};
pub use search::find_position;
pub use subscriber::SubscriptionId;

/// Default buffer capacity
pub const DEFAULT_CAPACITY: usize = 500;

/// Maximum capacity to prevent memory issues
pub const MAX_CAPACITY: usize = 100_000;
