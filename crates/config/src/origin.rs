//! Origin validation configuration
//!
//! These are policy knobs for the origin validator. The defaults match the
//! behavior browsers and SDKs already expect from the sidecar.

use std::time::Duration;

use serde::Deserialize;

/// Origin validation configuration
///
/// # Example
///
/// ```toml
/// [origin]
/// allowed_domains = ["spotlightjs.com"]
/// min_dns_ttl_secs = 3600       # reject local DNS answers with shorter TTLs
/// negative_cache_secs = 300     # how long rejections are remembered
/// machine_ip_cache_secs = 60    # how long interface addresses are reused
/// dns_timeout_ms = 2000
/// ```
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct OriginConfig {
    /// Public domains (and subdomains) allowed over https on the default port
    pub allowed_domains: Vec<String>,

    /// Lowest DNS TTL accepted for a hostname resolving to this machine
    pub min_dns_ttl_secs: u64,

    /// Cache lifetime for rejected or unresolvable hostnames
    pub negative_cache_secs: u64,

    /// Cache lifetime for the machine's interface addresses
    pub machine_ip_cache_secs: u64,

    /// Timeout for each DNS or OS lookup
    pub dns_timeout_ms: u64,
}

impl Default for OriginConfig {
    fn default() -> Self {
        Self {
            allowed_domains: vec!["spotlightjs.com".to_string()],
            min_dns_ttl_secs: 3600,
            negative_cache_secs: 300,
            machine_ip_cache_secs: 60,
            dns_timeout_ms: 2000,
        }
    }
}

impl OriginConfig {
    pub fn min_dns_ttl(&self) -> Duration {
        Duration::from_secs(self.min_dns_ttl_secs)
    }

    pub fn negative_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.negative_cache_secs)
    }

    pub fn machine_ip_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.machine_ip_cache_secs)
    }

    pub fn dns_timeout(&self) -> Duration {
        Duration::from_millis(self.dns_timeout_ms)
    }
}
