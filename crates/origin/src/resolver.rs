//! Host resolution
//!
//! Two lookups are needed per hostname: an authoritative DNS query that
//! reports record TTLs, and an OS lookup that also consults the hosts file.
//! Only the OS lookup sees hosts-file entries, so a name the DNS query cannot
//! resolve but the OS can is taken to be a hosts-file entry.

use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use hickory_resolver::TokioAsyncResolver;
use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::system_conf::read_system_conf;
use tracing::{debug, warn};

use crate::error::{OriginError, Result};

/// Answer to an authoritative DNS query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsAnswer {
    /// A and AAAA addresses
    pub addrs: Vec<IpAddr>,
    /// Lowest TTL across every returned record
    pub min_ttl: Duration,
}

/// Resolver used by the origin validator
#[async_trait]
pub trait HostResolver: Send + Sync {
    /// Query DNS directly, bypassing the hosts file and any cache
    async fn lookup_dns(&self, host: &str) -> Result<DnsAnswer>;

    /// Resolve through the operating system (hosts file included)
    async fn lookup_os(&self, host: &str) -> Result<Vec<IpAddr>>;
}

/// Production resolver: hickory for DNS, tokio for the OS lookup
pub struct SystemResolver {
    dns: TokioAsyncResolver,
}

impl SystemResolver {
    /// Create a resolver from the system DNS configuration
    ///
    /// Falls back to the hickory default upstreams when the system
    /// configuration cannot be read.
    pub fn new(timeout: Duration) -> Self {
        let (config, mut opts) = match read_system_conf() {
            Ok(conf) => conf,
            Err(e) => {
                warn!(error = %e, "cannot read system DNS configuration, using defaults");
                (ResolverConfig::default(), ResolverOpts::default())
            }
        };

        // Fresh answers only: TTLs must come from the upstream, and hosts
        // entries must not masquerade as DNS answers
        opts.cache_size = 0;
        opts.use_hosts_file = false;
        opts.timeout = timeout;

        Self {
            dns: TokioAsyncResolver::tokio(config, opts),
        }
    }
}

impl std::fmt::Debug for SystemResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SystemResolver").finish_non_exhaustive()
    }
}

#[async_trait]
impl HostResolver for SystemResolver {
    async fn lookup_dns(&self, host: &str) -> Result<DnsAnswer> {
        let lookup = self
            .dns
            .lookup_ip(host)
            .await
            .map_err(|e| OriginError::Resolve {
                host: host.to_owned(),
                message: e.to_string(),
            })?;

        let addrs: Vec<IpAddr> = lookup.iter().collect();
        let min_ttl = lookup
            .as_lookup()
            .records()
            .iter()
            .map(|record| record.ttl())
            .min();

        match min_ttl {
            Some(ttl) if !addrs.is_empty() => {
                debug!(host, addrs = addrs.len(), ttl, "dns answer");
                Ok(DnsAnswer {
                    addrs,
                    min_ttl: Duration::from_secs(u64::from(ttl)),
                })
            }
            _ => Err(OriginError::NoAddresses {
                host: host.to_owned(),
            }),
        }
    }

    async fn lookup_os(&self, host: &str) -> Result<Vec<IpAddr>> {
        let addrs = tokio::net::lookup_host((host, 0u16)).await?;
        Ok(addrs.map(|addr| addr.ip()).collect())
    }
}
