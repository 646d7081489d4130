//! Spotlight Envelope - wire format for telemetry envelopes
//!
//! An envelope is a JSON header line followed by any number of items. Each
//! item is a JSON item-header line followed by its payload:
//!
//! ```text
//! {"event_id":"9ec79c33ec9942ab8353589fcb2e04dc","sent_at":"2024-01-01T00:00:00Z"}
//! {"type":"event","length":41}
//! {"message":"hello","level":"error"}
//! {"type":"attachment"}
//! raw text payload running to the next newline
//! ```
//!
//! When an item header declares `length`, exactly that many bytes are read
//! (binary-safe) and a single trailing newline is skipped. Without `length`
//! the payload runs to the next newline.
//!
//! # Decoding
//!
//! [`decode`] never aborts on a bad payload: a payload that is not JSON
//! becomes [`ItemPayload::Raw`]. Only structural corruption (missing header,
//! unparseable item header, truncated length-prefixed payload) fails.
//!
//! [`EnvelopeUnit`] is what the buffer stores: raw bytes plus request
//! metadata, decoded lazily on first access and cached.

mod codec;
mod compression;
mod content_type;
mod envelope;
mod error;
mod id;
mod item;
mod unit;

pub use codec::{decode, encode};
pub use compression::{ContentEncoding, decompress};
pub use content_type::{
    DEFAULT_CONTENT_TYPE, ENVELOPE_CONTENT_TYPE, is_browser_sdk, is_envelope_content_type,
    resolve_content_type,
};
pub use envelope::{Envelope, EnvelopeHeader, SdkInfo, TraceContext};
pub use error::EnvelopeError;
pub use id::next_envelope_id;
pub use item::{
    EventPayload, Exception, ExceptionList, Frame, Item, ItemHeader, ItemPayload, ItemType,
    Stacktrace,
};
pub use unit::{Decoded, EnvelopeUnit, StreamEvent};

pub use uuid::Uuid;

/// Result type for envelope operations
pub type Result<T> = std::result::Result<T, EnvelopeError>;
