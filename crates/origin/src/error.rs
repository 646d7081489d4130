//! Error types for origin validation
//!
//! None of these escape [`OriginValidator::is_allowed`](crate::OriginValidator::is_allowed):
//! every error there means "not allowed".

use std::io;
use std::time::Duration;

use thiserror::Error;

/// Errors raised while checking an origin
#[derive(Error, Debug)]
pub enum OriginError {
    /// Origin header is empty
    #[error("empty origin")]
    Empty,

    /// Origin is not a valid URL
    #[error("invalid origin URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Origin URL has no host (e.g. `file:` or `null`)
    #[error("origin has no host")]
    MissingHost,

    /// Resolver returned an error
    #[error("failed to resolve {host}: {message}")]
    Resolve { host: String, message: String },

    /// Resolver answered with no addresses
    #[error("no addresses for {host}")]
    NoAddresses { host: String },

    /// Lookup took longer than the configured timeout
    #[error("lookup for {host} timed out after {after:?}")]
    Timeout { host: String, after: Duration },

    /// I/O error (OS lookup, interface enumeration)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Result type for origin operations
pub type Result<T> = std::result::Result<T, OriginError>;
