//! HTTP server configuration

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use serde::Deserialize;

/// Default sidecar port
pub const DEFAULT_PORT: u16 = 8969;

/// Default maximum request body (64MB)
pub const DEFAULT_MAX_BODY_SIZE: usize = 64 * 1024 * 1024;

/// HTTP server configuration
///
/// # Example
///
/// ```toml
/// [server]
/// address = "127.0.0.1"     # default: 0.0.0.0
/// port = 8969               # default
/// max_body_size = 67108864  # default (64MB)
/// ```
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address
    pub address: IpAddr,

    /// Listen port
    pub port: u16,

    /// Largest accepted request body in bytes, before decompression
    pub max_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            max_body_size: DEFAULT_MAX_BODY_SIZE,
        }
    }
}

impl ServerConfig {
    /// Socket address to bind to
    pub fn bind_address(&self) -> SocketAddr {
        SocketAddr::new(self.address, self.port)
    }
}
