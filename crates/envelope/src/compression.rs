//! Request body decompression
//!
//! Applied to the whole body before any line splitting. Codings listed in
//! `Content-Encoding` are undone in reverse order; unknown codings pass the
//! bytes through untouched.

use std::borrow::Cow;
use std::io::{self, Read};

use flate2::read::{DeflateDecoder, MultiGzDecoder, ZlibDecoder};
use tracing::debug;

use crate::error::EnvelopeError;
use crate::Result;

/// Brotli window buffer size
const BROTLI_BUFFER_SIZE: usize = 4096;

/// Supported content codings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentEncoding {
    Gzip,
    Deflate,
    Brotli,
    Identity,
}

impl ContentEncoding {
    /// Parse a single coding token (case-insensitive)
    pub fn from_token(token: &str) -> Option<Self> {
        let token = token.trim();
        if token.eq_ignore_ascii_case("gzip") || token.eq_ignore_ascii_case("x-gzip") {
            Some(Self::Gzip)
        } else if token.eq_ignore_ascii_case("deflate") {
            Some(Self::Deflate)
        } else if token.eq_ignore_ascii_case("br") {
            Some(Self::Brotli)
        } else if token.eq_ignore_ascii_case("identity") {
            Some(Self::Identity)
        } else {
            None
        }
    }

    /// Name used in errors and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gzip => "gzip",
            Self::Deflate => "deflate",
            Self::Brotli => "br",
            Self::Identity => "identity",
        }
    }

    fn decode(&self, data: &[u8]) -> io::Result<Vec<u8>> {
        match self {
            Self::Gzip => read_all(MultiGzDecoder::new(data)),
            // HTTP deflate is zlib-wrapped, but some clients send raw deflate
            Self::Deflate => {
                read_all(ZlibDecoder::new(data)).or_else(|_| read_all(DeflateDecoder::new(data)))
            }
            Self::Brotli => read_all(brotli::Decompressor::new(data, BROTLI_BUFFER_SIZE)),
            Self::Identity => Ok(data.to_vec()),
        }
    }
}

fn read_all(mut reader: impl Read) -> io::Result<Vec<u8>> {
    let mut out = Vec::new();
    reader.read_to_end(&mut out)?;
    Ok(out)
}

/// Undo the `Content-Encoding` of a request body
///
/// Returns the input unchanged (borrowed) when no known coding applies.
pub fn decompress<'a>(bytes: &'a [u8], encoding: Option<&str>) -> Result<Cow<'a, [u8]>> {
    let Some(encoding) = encoding else {
        return Ok(Cow::Borrowed(bytes));
    };

    let mut data = Cow::Borrowed(bytes);

    for token in encoding.rsplit(',').map(str::trim).filter(|t| !t.is_empty()) {
        match ContentEncoding::from_token(token) {
            Some(ContentEncoding::Identity) => {}
            Some(coding) => {
                let decoded = coding
                    .decode(&data)
                    .map_err(|source| EnvelopeError::Decompress {
                        encoding: coding.as_str(),
                        source,
                    })?;
                data = Cow::Owned(decoded);
            }
            None => {
                debug!(encoding = token, "unknown content encoding, using body as-is");
            }
        }
    }

    Ok(data)
}

#[cfg(test)]
#[path = "compression_test.rs"]
mod tests;
