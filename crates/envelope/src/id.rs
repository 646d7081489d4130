//! Envelope identity generation
//!
//! Identities are UUID v7: millisecond timestamp in the high bits, so byte
//! order follows ingestion order. Two identities minted within the same
//! millisecond are forced apart so the sequence is strictly increasing.

use parking_lot::Mutex;
use uuid::Uuid;

/// Process-wide generator used for ingested envelopes
static ENVELOPE_IDS: IdGenerator = IdGenerator::new();

/// Strictly increasing UUID v7 generator
#[derive(Debug)]
pub(crate) struct IdGenerator {
    last: Mutex<u128>,
}

impl IdGenerator {
    /// Create a generator
    pub const fn new() -> Self {
        Self {
            last: parking_lot::const_mutex(0),
        }
    }

    /// Mint the next identity
    ///
    /// Always greater than every identity previously returned by this
    /// generator.
    pub fn next_id(&self) -> Uuid {
        let candidate = Uuid::now_v7().as_u128();
        let mut last = self.last.lock();
        let value = candidate.max(last.wrapping_add(1));
        *last = value;
        Uuid::from_u128(value)
    }
}

/// Mint an identity for a newly ingested envelope
pub fn next_envelope_id() -> Uuid {
    ENVELOPE_IDS.next_id()
}
