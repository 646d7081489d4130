//! Line-delimited envelope codec

use crate::envelope::{Envelope, EnvelopeHeader};
use crate::error::EnvelopeError;
use crate::item::{Item, ItemHeader, ItemPayload};
use crate::Result;

/// Cursor over the envelope body
struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Next line without its terminating newline, None at end of input
    fn next_line(&mut self) -> Option<&'a [u8]> {
        if self.pos >= self.buf.len() {
            return None;
        }

        let rest = &self.buf[self.pos..];
        match rest.iter().position(|&b| b == b'\n') {
            Some(end) => {
                self.pos += end + 1;
                Some(&rest[..end])
            }
            None => {
                self.pos = self.buf.len();
                Some(rest)
            }
        }
    }

    /// Exactly `len` bytes, then skip one newline if present
    fn take_exact(&mut self, len: usize) -> Option<&'a [u8]> {
        if len > self.remaining() {
            return None;
        }

        let payload = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        if self.buf.get(self.pos) == Some(&b'\n') {
            self.pos += 1;
        }
        Some(payload)
    }
}

/// Decode an envelope from its wire format
///
/// Item payloads that are not JSON are kept as raw bytes; only structural
/// corruption returns an error.
pub fn decode(bytes: &[u8]) -> Result<Envelope> {
    let mut reader = Reader::new(bytes);

    let header_line = reader
        .next_line()
        .filter(|line| !line.trim_ascii().is_empty())
        .ok_or(EnvelopeError::MissingHeader)?;
    let header: EnvelopeHeader =
        serde_json::from_slice(header_line).map_err(EnvelopeError::InvalidHeader)?;

    let mut envelope = Envelope::new(header);

    while let Some(line) = reader.next_line() {
        // Trailing blank lines between or after items
        if line.trim_ascii().is_empty() {
            continue;
        }

        let index = envelope.items.len();
        let item_header: ItemHeader = serde_json::from_slice(line)
            .map_err(|source| EnvelopeError::InvalidItemHeader { index, source })?;

        let payload = match item_header.length {
            Some(len) => reader.take_exact(len).ok_or(EnvelopeError::Truncated {
                index,
                expected: len,
                available: reader.remaining(),
            })?,
            None => reader.next_line().unwrap_or_default(),
        };

        let payload = ItemPayload::parse(&item_header.item_type, payload);
        envelope.push(Item::new(item_header, payload));
    }

    Ok(envelope)
}

/// Encode an envelope into its wire format
///
/// Every item is written with an explicit `length` so binary and multi-line
/// payloads survive a decode.
pub fn encode(envelope: &Envelope) -> Result<Vec<u8>> {
    let mut out = serde_json::to_vec(&envelope.header).map_err(EnvelopeError::Serialize)?;
    out.push(b'\n');

    for item in &envelope.items {
        let payload = item.payload.to_bytes().map_err(EnvelopeError::Serialize)?;

        let mut header = item.header.clone();
        header.length = Some(payload.len());

        serde_json::to_writer(&mut out, &header).map_err(EnvelopeError::Serialize)?;
        out.push(b'\n');
        out.extend_from_slice(&payload);
        out.push(b'\n');
    }

    Ok(out)
}

#[cfg(test)]
#[path = "codec_test.rs"]
mod tests;
