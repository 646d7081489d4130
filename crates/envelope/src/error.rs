//! Envelope error types

use std::io;

use thiserror::Error;

/// Errors that can occur while decoding or encoding envelopes
#[derive(Debug, Error)]
pub enum EnvelopeError {
    /// Input is empty or starts with a blank line
    #[error("missing envelope header")]
    MissingHeader,

    /// Header line is not a JSON object
    #[error("invalid envelope header: {0}")]
    InvalidHeader(#[source] serde_json::Error),

    /// Item header line is not a JSON object
    #[error("invalid header for item {index}: {source}")]
    InvalidItemHeader {
        index: usize,
        #[source]
        source: serde_json::Error,
    },

    /// Stream ends before a length-prefixed payload is complete
    #[error("truncated payload for item {index}: expected {expected} bytes, {available} available")]
    Truncated {
        index: usize,
        expected: usize,
        available: usize,
    },

    /// Decompressing the request body failed
    #[error("failed to decode {encoding} body: {source}")]
    Decompress {
        encoding: &'static str,
        #[source]
        source: io::Error,
    },

    /// Serializing an envelope failed
    #[error("failed to serialize envelope: {0}")]
    Serialize(#[source] serde_json::Error),
}

impl EnvelopeError {
    /// Check if this error means the input was structurally corrupt
    ///
    /// Such envelopes are kept as raw bytes instead of being decoded.
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            Self::MissingHeader
                | Self::InvalidHeader(_)
                | Self::InvalidItemHeader { .. }
                | Self::Truncated { .. }
        )
    }
}
