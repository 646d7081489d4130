//! Envelope items
//!
//! Each item is a header (type, optional length, optional content type) and a
//! payload. Payloads are classified at the decode boundary into
//! [`ItemPayload`] so downstream code matches on a tag instead of probing
//! untyped JSON.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use bytes::Bytes;
use serde::ser::SerializeTuple;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

// =============================================================================
// Item Type
// =============================================================================

/// Item type declared in the item header
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ItemType {
    /// Error event
    Event,
    /// Performance transaction
    Transaction,
    /// Structured log batch
    Log,
    /// Trace-connected metric batch (`trace_metric`)
    TraceMetric,
    /// Metric batch under the older `metric` name
    Metric,
    /// Continuous or transaction profile
    Profile,
    /// Chunk of a continuous profile
    ProfileChunk,
    /// Binary attachment
    Attachment,
    /// Anything else, name preserved
    Other(String),
}

impl ItemType {
    /// Get the wire name of this item type
    pub fn as_str(&self) -> &str {
        match self {
            Self::Event => "event",
            Self::Transaction => "transaction",
            Self::Log => "log",
            Self::TraceMetric => "trace_metric",
            Self::Metric => "metric",
            Self::Profile => "profile",
            Self::ProfileChunk => "profile_chunk",
            Self::Attachment => "attachment",
            Self::Other(name) => name,
        }
    }
}

impl From<&str> for ItemType {
    fn from(name: &str) -> Self {
        match name {
            "event" => Self::Event,
            "transaction" => Self::Transaction,
            "log" => Self::Log,
            "trace_metric" => Self::TraceMetric,
            "metric" => Self::Metric,
            "profile" => Self::Profile,
            "profile_chunk" => Self::ProfileChunk,
            "attachment" => Self::Attachment,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for ItemType {
    fn from(name: String) -> Self {
        match ItemType::from(name.as_str()) {
            Self::Other(_) => Self::Other(name),
            known => known,
        }
    }
}

impl From<ItemType> for String {
    fn from(item_type: ItemType) -> Self {
        match item_type {
            ItemType::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Item Header
// =============================================================================

/// Header line preceding each item payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemHeader {
    /// Declared item type
    #[serde(rename = "type")]
    pub item_type: ItemType,

    /// Payload length in bytes (None = payload runs to the next newline)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<usize>,

    /// Payload content type (attachments mostly)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,

    /// Remaining header fields, preserved as-is
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ItemHeader {
    /// Create a header for the given type with no length
    pub fn new(item_type: ItemType) -> Self {
        Self {
            item_type,
            length: None,
            content_type: None,
            extra: Map::new(),
        }
    }
}

// =============================================================================
// Event payload (errors and transactions)
// =============================================================================

/// Stack frame of an exception
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abs_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lineno: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colno: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_app: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Frame {
    /// File this frame points at, preferring `filename` over `abs_path`
    pub fn file(&self) -> Option<&str> {
        self.filename
            .as_deref()
            .or(self.abs_path.as_deref())
            .filter(|f| !f.is_empty())
    }
}

/// Stack trace of an exception
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Stacktrace {
    #[serde(default)]
    pub frames: Vec<Frame>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A single exception value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Exception {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub ty: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stacktrace: Option<Stacktrace>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Exception interface of an event
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExceptionList {
    #[serde(default)]
    pub values: Vec<Exception>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Error or transaction event
///
/// Only the fields the sidecar inspects are typed; everything else is kept in
/// `extra` so serializing the event reproduces what the SDK sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exception: Option<ExceptionList>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl EventPayload {
    /// Iterate over every stack frame of every exception
    pub fn frames(&self) -> impl Iterator<Item = &Frame> {
        self.exception
            .iter()
            .flat_map(|list| list.values.iter())
            .filter_map(|exception| exception.stacktrace.as_ref())
            .flat_map(|stacktrace| stacktrace.frames.iter())
    }
}

// =============================================================================
// Item Payload
// =============================================================================

/// Decoded item payload
#[derive(Debug, Clone, PartialEq)]
pub enum ItemPayload {
    /// Error event
    Error(Box<EventPayload>),
    /// Transaction event
    Transaction(Box<EventPayload>),
    /// Log batch
    Log(Value),
    /// Metric batch
    Metric(Value),
    /// Profile
    Profile(Value),
    /// Profile chunk
    ProfileChunk(Value),
    /// Valid JSON of an unknown type, or JSON not matching its declared type
    Other(Value),
    /// Payload that is not JSON, kept byte for byte
    Raw(Bytes),
}

impl ItemPayload {
    /// Classify a payload by its declared item type
    ///
    /// Never fails: invalid JSON becomes `Raw`, JSON that does not fit the
    /// typed shape of its item type becomes `Other`.
    pub fn parse(item_type: &ItemType, bytes: &[u8]) -> Self {
        let value: Value = match serde_json::from_slice(bytes) {
            Ok(value) => value,
            Err(_) => return Self::Raw(Bytes::copy_from_slice(bytes)),
        };

        match item_type {
            ItemType::Event => match EventPayload::deserialize(&value) {
                Ok(event) => Self::Error(Box::new(event)),
                Err(_) => Self::Other(value),
            },
            ItemType::Transaction => match EventPayload::deserialize(&value) {
                Ok(event) => Self::Transaction(Box::new(event)),
                Err(_) => Self::Other(value),
            },
            ItemType::Log => Self::Log(value),
            ItemType::TraceMetric | ItemType::Metric => Self::Metric(value),
            ItemType::Profile => Self::Profile(value),
            ItemType::ProfileChunk => Self::ProfileChunk(value),
            ItemType::Attachment | ItemType::Other(_) => Self::Other(value),
        }
    }

    /// Check if the payload failed JSON parsing
    pub fn is_raw(&self) -> bool {
        matches!(self, Self::Raw(_))
    }

    /// Get the event, if this is an error or transaction
    pub fn as_event(&self) -> Option<&EventPayload> {
        match self {
            Self::Error(event) | Self::Transaction(event) => Some(event),
            _ => None,
        }
    }

    /// Serialize back to payload bytes
    pub fn to_bytes(&self) -> serde_json::Result<Vec<u8>> {
        match self {
            Self::Raw(bytes) => Ok(bytes.to_vec()),
            other => serde_json::to_vec(other),
        }
    }
}

impl Serialize for ItemPayload {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Error(event) | Self::Transaction(event) => event.serialize(serializer),
            Self::Log(value)
            | Self::Metric(value)
            | Self::Profile(value)
            | Self::ProfileChunk(value)
            | Self::Other(value) => value.serialize(serializer),
            // Text as a string, binary as base64
            Self::Raw(bytes) => match std::str::from_utf8(bytes) {
                Ok(text) => serializer.serialize_str(text),
                Err(_) => serializer.serialize_str(&BASE64.encode(bytes)),
            },
        }
    }
}

// =============================================================================
// Item
// =============================================================================

/// One item of an envelope
///
/// Serializes as a `[header, payload]` pair.
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub header: ItemHeader,
    pub payload: ItemPayload,
}

impl Item {
    /// Create an item from a header and payload
    pub fn new(header: ItemHeader, payload: ItemPayload) -> Self {
        Self { header, payload }
    }

    /// Declared type of this item
    pub fn item_type(&self) -> &ItemType {
        &self.header.item_type
    }
}

impl Serialize for Item {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut pair = serializer.serialize_tuple(2)?;
        pair.serialize_element(&self.header)?;
        pair.serialize_element(&self.payload)?;
        pair.end()
    }
}
