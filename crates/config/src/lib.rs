//! Spotlight Configuration
//!
//! TOML-based configuration loading with sensible defaults.
//! An empty file is a valid configuration: only specify what you need to change.
//!
//! # Parsing
//!
//! Use the `FromStr` trait to parse configuration:
//!
//! ```
//! use spotlight_config::Config;
//! use std::str::FromStr;
//!
//! let config = Config::from_str("[server]\nport = 9000").unwrap();
//! assert_eq!(config.server.port, 9000);
//! ```
//!
//! # Example Full Config
//!
//! ```toml
//! [server]
//! address = "127.0.0.1"
//! port = 8969
//!
//! [buffer]
//! capacity = 1000
//!
//! [origin]
//! allowed_domains = ["spotlightjs.com"]
//! min_dns_ttl_secs = 3600
//!
//! [log]
//! level = "debug"
//! format = "json"
//! ```

mod buffer;
mod error;
mod logging;
mod origin;
mod server;
mod validation;

use std::fs;
use std::path::Path;
use std::str::FromStr;

pub use buffer::{BufferConfig, DEFAULT_CAPACITY, MAX_CAPACITY};
pub use error::{ConfigError, Result};
pub use logging::{LogConfig, LogFormat, LogLevel, LogOutput};
pub use origin::OriginConfig;
pub use server::{DEFAULT_MAX_BODY_SIZE, DEFAULT_PORT, ServerConfig};

use serde::Deserialize;

/// Main configuration structure
///
/// All sections are optional with sensible defaults.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// HTTP listener
    pub server: ServerConfig,

    /// Envelope buffer
    pub buffer: BufferConfig,

    /// Origin validation policy
    pub origin: OriginConfig,

    /// Logging configuration
    pub log: LogConfig,
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read, contains invalid TOML, or fails
    /// validation.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;

        Self::from_str(&contents)
    }

    /// Parse configuration from a TOML string
    ///
    /// Prefer using the `FromStr` trait implementation.
    fn parse(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s).map_err(ConfigError::ParseError)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    ///
    /// Run again after applying command-line overrides.
    pub fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::net::{IpAddr, Ipv4Addr};

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::from_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.server.port, 8969);
        assert_eq!(config.server.address, IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        assert_eq!(config.server.max_body_size, 64 * 1024 * 1024);
        assert_eq!(config.buffer.capacity, 500);
        assert_eq!(config.origin.allowed_domains, vec!["spotlightjs.com"]);
        assert_eq!(config.origin.min_dns_ttl().as_secs(), 3600);
        assert_eq!(config.origin.negative_cache_ttl().as_secs(), 300);
        assert_eq!(config.origin.machine_ip_cache_ttl().as_secs(), 60);
        assert_eq!(config.origin.dns_timeout().as_millis(), 2000);
    }

    #[test]
    fn test_full_config_parse() {
        let toml = r#"
[server]
address = "127.0.0.1"
port = 9000
max_body_size = 1048576

[buffer]
capacity = 1000

[origin]
allowed_domains = ["spotlightjs.com", "example.dev"]
min_dns_ttl_secs = 7200
negative_cache_secs = 60
machine_ip_cache_secs = 30
dns_timeout_ms = 500

[log]
level = "debug"
format = "json"
output = "stderr"
"#;
        let config = Config::from_str(toml).unwrap();

        assert_eq!(config.server.bind_address().to_string(), "127.0.0.1:9000");
        assert_eq!(config.server.max_body_size, 1_048_576);
        assert_eq!(config.buffer.capacity, 1000);
        assert_eq!(config.origin.allowed_domains.len(), 2);
        assert_eq!(config.origin.min_dns_ttl().as_secs(), 7200);
        assert_eq!(config.origin.dns_timeout().as_millis(), 500);
        assert_eq!(config.log.level, LogLevel::Debug);
        assert_eq!(config.log.format, LogFormat::Json);
        assert_eq!(config.log.output, LogOutput::Stderr);
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let config = Config::from_str("[origin]\nmin_dns_ttl_secs = 60").unwrap();
        assert_eq!(config.origin.min_dns_ttl_secs, 60);
        assert_eq!(config.origin.allowed_domains, vec!["spotlightjs.com"]);
    }

    #[test]
    fn test_invalid_toml() {
        let result = Config::from_str("invalid { toml");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let err = Config::from_str("[buffer]\ncapacity = 0").unwrap_err();
        assert!(err.to_string().contains("capacity"));
    }

    #[test]
    fn test_oversized_capacity_rejected() {
        let err = Config::from_str("[buffer]\ncapacity = 100001").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                section: "buffer",
                ..
            }
        ));
    }

    #[test]
    fn test_zero_port_rejected() {
        let err = Config::from_str("[server]\nport = 0").unwrap_err();
        assert!(err.to_string().contains("port"));
    }

    #[test]
    fn test_empty_domain_rejected() {
        let err = Config::from_str("[origin]\nallowed_domains = [\"spotlightjs.com\", \" \"]")
            .unwrap_err();
        assert!(err.to_string().contains("entry 1"));
    }

    #[test]
    fn test_zero_ttl_floor_rejected() {
        let err = Config::from_str("[origin]\nmin_dns_ttl_secs = 0").unwrap_err();
        assert!(err.to_string().contains("min_dns_ttl_secs"));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nport = 7777\n\n[buffer]\ncapacity = 42").unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.server.port, 7777);
        assert_eq!(config.buffer.capacity, 42);
    }

    #[test]
    fn test_from_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.toml");

        let err = Config::from_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::IoError { .. }));
    }
}
