//! Stored envelope units
//!
//! An `EnvelopeUnit` is one ingested request body: the raw bytes, the
//! content type it was filed under, and the sender's user agent. A unit
//! gets a provisional identity when created; the buffer replaces it on
//! insertion so identities follow buffer order. The body is decoded at most
//! once, on first access.

use std::collections::BTreeSet;
use std::sync::OnceLock;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use tracing::warn;
use uuid::Uuid;

use crate::codec;
use crate::content_type::is_envelope_content_type;
use crate::envelope::Envelope;
use crate::id::next_envelope_id;

/// Outcome of decoding a unit
#[derive(Debug, Clone, Copy)]
pub enum Decoded<'a> {
    /// Body decoded as an envelope
    Envelope(&'a Envelope),
    /// Not an envelope, or malformed; only the raw bytes are available
    Raw(&'a [u8]),
}

/// A unit rendered for an event stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamEvent {
    /// Event name: the content type, suffixed `;base64` for raw bodies
    pub name: String,
    /// Event id: the unit's identity
    pub id: String,
    /// Serialized envelope JSON, or base64 of the raw body
    pub data: String,
}

/// An ingested body as held by the buffer
#[derive(Debug)]
pub struct EnvelopeUnit {
    id: Uuid,
    received_at: DateTime<Utc>,
    raw: Bytes,
    content_type: String,
    user_agent: Option<String>,
    parsed: OnceLock<Option<Envelope>>,
}

impl EnvelopeUnit {
    /// Create a unit with a freshly minted provisional identity
    pub fn new(
        raw: impl Into<Bytes>,
        content_type: impl Into<String>,
        user_agent: Option<String>,
    ) -> Self {
        Self::with_id(next_envelope_id(), raw, content_type, user_agent)
    }

    /// Create a unit with a given identity
    pub fn with_id(
        id: Uuid,
        raw: impl Into<Bytes>,
        content_type: impl Into<String>,
        user_agent: Option<String>,
    ) -> Self {
        Self {
            id,
            received_at: Utc::now(),
            raw: raw.into(),
            content_type: content_type.into(),
            user_agent,
            parsed: OnceLock::new(),
        }
    }

    /// Replace the identity
    ///
    /// Drops any cached decode so the envelope header reports the new id.
    pub fn assign_id(&mut self, id: Uuid) {
        self.id = id;
        self.parsed = OnceLock::new();
    }

    #[inline]
    pub fn id(&self) -> Uuid {
        self.id
    }

    #[inline]
    pub fn received_at(&self) -> DateTime<Utc> {
        self.received_at
    }

    #[inline]
    pub fn raw(&self) -> &Bytes {
        &self.raw
    }

    #[inline]
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    #[inline]
    pub fn user_agent(&self) -> Option<&str> {
        self.user_agent.as_deref()
    }

    /// Check if the unit was filed as an envelope
    pub fn is_envelope(&self) -> bool {
        is_envelope_content_type(&self.content_type)
    }

    /// Decoded envelope, or None when the body is not a valid envelope
    ///
    /// Decoding happens once; the result is cached for the unit's lifetime.
    pub fn envelope(&self) -> Option<&Envelope> {
        self.parsed.get_or_init(|| self.parse()).as_ref()
    }

    /// Decoded envelope or raw bytes
    pub fn decoded(&self) -> Decoded<'_> {
        match self.envelope() {
            Some(envelope) => Decoded::Envelope(envelope),
            None => Decoded::Raw(&self.raw),
        }
    }

    fn parse(&self) -> Option<Envelope> {
        if !self.is_envelope() {
            return None;
        }

        match codec::decode(&self.raw) {
            Ok(mut envelope) => {
                envelope.header.envelope_id = Some(self.id);
                Some(envelope)
            }
            Err(e) => {
                warn!(id = %self.id, error = %e, "malformed envelope, keeping raw bytes");
                None
            }
        }
    }

    /// Distinct files referenced by exception stack frames
    pub fn filenames(&self) -> BTreeSet<&str> {
        let Some(envelope) = self.envelope() else {
            return BTreeSet::new();
        };

        envelope
            .items
            .iter()
            .filter_map(|item| item.payload.as_event())
            .flat_map(|event| event.frames())
            .filter_map(|frame| frame.file())
            .collect()
    }

    /// Render the unit for an event stream
    pub fn stream_event(&self) -> StreamEvent {
        let id = self.id.to_string();

        if let Decoded::Envelope(envelope) = self.decoded() {
            match serde_json::to_string(envelope) {
                Ok(data) => {
                    return StreamEvent {
                        name: self.content_type.clone(),
                        id,
                        data,
                    };
                }
                Err(e) => {
                    warn!(id = %self.id, error = %e, "failed to serialize envelope, sending raw bytes");
                }
            }
        }

        StreamEvent {
            name: format!("{};base64", self.content_type),
            id,
            data: BASE64.encode(&self.raw),
        }
    }
}

#[cfg(test)]
#[path = "unit_test.rs"]
mod tests;
