//! Shared handler state
//!
//! One `AppState` is built per process and cloned into every handler. It
//! owns the only envelope buffer, so every route sees the same envelopes.

use std::sync::Arc;

use spotlight_buffer::EnvelopeBuffer;
use spotlight_config::Config;
use spotlight_origin::OriginValidator;
use tokio_util::sync::CancellationToken;

use crate::config::validator_config;

/// State shared by all handlers
#[derive(Debug, Clone)]
pub struct AppState {
    /// Envelope store
    pub buffer: Arc<EnvelopeBuffer>,
    /// Origin policy for cross-origin requests
    pub validator: OriginValidator,
    /// Cancelled when the server shuts down; ends open event streams
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(buffer: Arc<EnvelopeBuffer>, validator: OriginValidator) -> Self {
        Self {
            buffer,
            validator,
            shutdown: CancellationToken::new(),
        }
    }

    /// Build the buffer and validator described by a configuration
    pub fn from_config(config: &Config) -> Self {
        let buffer = Arc::new(EnvelopeBuffer::with_capacity(config.buffer.capacity));
        let validator = OriginValidator::new(validator_config(&config.origin));
        Self::new(buffer, validator)
    }
}
