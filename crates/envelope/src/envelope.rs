//! Envelope and envelope header

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::item::Item;

/// SDK that produced the envelope
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SdkInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Distributed trace context attached to the envelope
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TraceContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// First line of an envelope
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnvelopeHeader {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sdk: Option<SdkInfo>,

    /// RFC 3339 send time as reported by the SDK
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sent_at: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace: Option<TraceContext>,

    /// Identity assigned on ingestion. Any value sent by the SDK is replaced.
    #[serde(
        rename = "__spotlight_envelope_id",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub envelope_id: Option<Uuid>,

    /// Remaining header fields, preserved as-is
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A decoded envelope: header plus ordered items
///
/// Serializes as `{"header": {...}, "items": [[item_header, payload], ...]}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Envelope {
    pub header: EnvelopeHeader,
    pub items: Vec<Item>,
}

impl Envelope {
    /// Create an envelope with no items
    pub fn new(header: EnvelopeHeader) -> Self {
        Self {
            header,
            items: Vec::new(),
        }
    }

    /// Append an item
    pub fn push(&mut self, item: Item) {
        self.items.push(item);
    }

    /// SDK name from the header, if any
    pub fn sdk_name(&self) -> Option<&str> {
        self.header.sdk.as_ref().map(|sdk| sdk.name.as_str())
    }
}
