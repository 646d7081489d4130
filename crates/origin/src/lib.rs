//! Spotlight Origin - decides which browser origins may reach the sidecar
//!
//! The sidecar listens on the local network, so any web page the developer
//! opens could try to talk to it. This crate gates cross-origin requests:
//! localhost, machine-local addresses, and one allow-listed public domain
//! are accepted; hostnames are accepted only when they resolve to this
//! machine in a way that resists DNS rebinding.
//!
//! # Example
//!
//! ```no_run
//! use spotlight_origin::{OriginValidator, ValidatorConfig};
//!
//! # async fn example() {
//! let validator = OriginValidator::new(ValidatorConfig::default());
//! assert!(validator.is_allowed("http://localhost:3000").await);
//! # }
//! ```

mod error;
mod interfaces;
mod resolver;
mod validator;

pub use error::{OriginError, Result};
pub use interfaces::{InterfaceAddrs, SystemInterfaces};
pub use resolver::{DnsAnswer, HostResolver, SystemResolver};
pub use validator::{OriginValidator, ValidatorConfig};
