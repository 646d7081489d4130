//! Configuration validation
//!
//! Rejects values that would leave the sidecar unusable:
//! - Zero buffer capacity or capacity above the maximum
//! - Port 0
//! - Empty allowed-domain entries
//! - A zero DNS TTL floor (it would disable rebinding protection)

use crate::Config;
use crate::buffer::MAX_CAPACITY;
use crate::error::{ConfigError, Result};

/// Validate the entire configuration
pub fn validate_config(config: &Config) -> Result<()> {
    validate_server(config)?;
    validate_buffer(config)?;
    validate_origin(config)?;
    Ok(())
}

fn validate_server(config: &Config) -> Result<()> {
    if config.server.port == 0 {
        return Err(ConfigError::invalid_value(
            "server",
            "port",
            "must be between 1 and 65535",
        ));
    }

    if config.server.max_body_size == 0 {
        return Err(ConfigError::invalid_value(
            "server",
            "max_body_size",
            "must be greater than 0",
        ));
    }

    Ok(())
}

fn validate_buffer(config: &Config) -> Result<()> {
    let capacity = config.buffer.capacity;
    if capacity == 0 || capacity > MAX_CAPACITY {
        return Err(ConfigError::invalid_value(
            "buffer",
            "capacity",
            format!("must be between 1 and {MAX_CAPACITY}, got {capacity}"),
        ));
    }

    Ok(())
}

fn validate_origin(config: &Config) -> Result<()> {
    let origin = &config.origin;

    if let Some(i) = origin
        .allowed_domains
        .iter()
        .position(|domain| domain.trim().is_empty())
    {
        return Err(ConfigError::invalid_value(
            "origin",
            "allowed_domains",
            format!("entry {i} is empty"),
        ));
    }

    if origin.min_dns_ttl_secs == 0 {
        return Err(ConfigError::invalid_value(
            "origin",
            "min_dns_ttl_secs",
            "must be greater than 0",
        ));
    }

    if origin.dns_timeout_ms == 0 {
        return Err(ConfigError::invalid_value(
            "origin",
            "dns_timeout_ms",
            "must be greater than 0",
        ));
    }

    Ok(())
}
