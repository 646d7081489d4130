//! Envelope buffer configuration

use serde::Deserialize;

/// Default number of buffered envelopes
pub const DEFAULT_CAPACITY: usize = 500;

/// Largest accepted capacity
pub const MAX_CAPACITY: usize = 100_000;

/// Envelope buffer configuration
///
/// ```toml
/// [buffer]
/// capacity = 500
/// ```
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BufferConfig {
    /// Envelopes kept before the oldest is evicted
    pub capacity: usize,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
        }
    }
}
