//! Origin validator
//!
//! Decides whether a browser `Origin` may talk to the sidecar. The decision
//! order is:
//!
//! 1. Unparseable or empty origin: reject
//! 2. `localhost`: allow
//! 3. Allow-listed domain or subdomain: allow over `https` on the default
//!    port only
//! 4. IP literal: allow iff the address is bound to this machine
//! 5. Any other hostname: resolve it and allow iff it points at this machine
//!    through a hosts-file entry, or through DNS records whose lowest TTL
//!    meets the rebinding floor
//!
//! Hostname decisions are cached, and concurrent checks for the same
//! hostname share one in-flight lookup.

use std::collections::{HashMap, HashSet};
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};
use url::{Host, Url};

use crate::error::{OriginError, Result};
use crate::interfaces::{InterfaceAddrs, SystemInterfaces, normalize};
use crate::resolver::{HostResolver, SystemResolver};

/// Reserved name that always refers to this machine
const LOCALHOST: &str = "localhost";

/// Validator policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatorConfig {
    /// Public domains (and their subdomains) allowed over https
    pub allowed_domains: Vec<String>,
    /// Lowest DNS TTL accepted for a machine-local answer
    pub min_dns_ttl: Duration,
    /// How long rejections and lookup failures are cached
    pub negative_cache_ttl: Duration,
    /// How long the interface address list is reused
    pub machine_ip_cache_ttl: Duration,
    /// Bound on each DNS or OS lookup
    pub dns_timeout: Duration,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            allowed_domains: vec!["spotlightjs.com".to_string()],
            min_dns_ttl: Duration::from_secs(3600),
            negative_cache_ttl: Duration::from_secs(300),
            machine_ip_cache_ttl: Duration::from_secs(60),
            dns_timeout: Duration::from_secs(2),
        }
    }
}

/// Cached decision for a hostname
#[derive(Debug, Clone, Copy)]
struct CacheEntry {
    allowed: bool,
    expires_at: Instant,
}

type Lookup = Shared<BoxFuture<'static, bool>>;

struct Inner {
    config: ValidatorConfig,
    resolver: Arc<dyn HostResolver>,
    interfaces: Arc<dyn InterfaceAddrs>,
    /// Interface addresses and when they were read
    machine_ips: Mutex<Option<(Instant, Arc<HashSet<IpAddr>>)>>,
    /// Decisions per hostname
    hosts: Mutex<HashMap<String, CacheEntry>>,
    /// Lookups in flight per hostname
    in_flight: Mutex<HashMap<String, Lookup>>,
}

/// Checks request origins; cheap to clone
#[derive(Clone)]
pub struct OriginValidator {
    inner: Arc<Inner>,
}

impl OriginValidator {
    /// Create a validator backed by the system resolver and interfaces
    pub fn new(config: ValidatorConfig) -> Self {
        let resolver = Arc::new(SystemResolver::new(config.dns_timeout));
        Self::with_sources(config, resolver, Arc::new(SystemInterfaces))
    }

    /// Create a validator with custom resolver and interface sources
    pub fn with_sources(
        config: ValidatorConfig,
        resolver: Arc<dyn HostResolver>,
        interfaces: Arc<dyn InterfaceAddrs>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                resolver,
                interfaces,
                machine_ips: Mutex::new(None),
                hosts: Mutex::new(HashMap::new()),
                in_flight: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.inner.config
    }

    /// Check whether `origin` may talk to the sidecar
    ///
    /// Never fails: any error while parsing or resolving means false.
    pub async fn is_allowed(&self, origin: &str) -> bool {
        match self.check(origin).await {
            Ok(allowed) => {
                debug!(origin, allowed, "origin checked");
                allowed
            }
            Err(e) => {
                debug!(origin, error = %e, "origin rejected");
                false
            }
        }
    }

    async fn check(&self, origin: &str) -> Result<bool> {
        let origin = origin.trim();
        if origin.is_empty() {
            return Err(OriginError::Empty);
        }

        let url = Url::parse(origin)?;
        let host = url.host().ok_or(OriginError::MissingHost)?;

        let domain = match host {
            Host::Ipv4(ip) => return Ok(self.is_machine_ip(IpAddr::V4(ip))),
            Host::Ipv6(ip) => return Ok(self.is_machine_ip(IpAddr::V6(ip))),
            Host::Domain(domain) => domain.trim_end_matches('.').to_ascii_lowercase(),
        };

        // Hosts of non-special schemes are never parsed as IP literals
        if let Ok(ip) = domain.parse::<IpAddr>() {
            return Ok(self.is_machine_ip(ip));
        }

        if domain == LOCALHOST {
            return Ok(true);
        }

        if self.is_allow_listed(&domain) {
            return Ok(url.scheme() == "https" && url.port().is_none());
        }

        Ok(self.resolve_host(domain).await)
    }

    fn is_allow_listed(&self, domain: &str) -> bool {
        self.inner.config.allowed_domains.iter().any(|allowed| {
            domain == allowed
                || domain
                    .strip_suffix(allowed.as_str())
                    .is_some_and(|rest| rest.ends_with('.'))
        })
    }

    /// Check if an address is bound to this machine
    fn is_machine_ip(&self, ip: IpAddr) -> bool {
        let ip = normalize(ip);
        ip.is_loopback() || self.machine_ips().contains(&ip)
    }

    /// Interface addresses, re-read once the cache window has passed
    fn machine_ips(&self) -> Arc<HashSet<IpAddr>> {
        let mut cached = self.inner.machine_ips.lock();
        let now = Instant::now();

        if let Some((read_at, ips)) = cached.as_ref()
            && now.duration_since(*read_at) < self.inner.config.machine_ip_cache_ttl
        {
            return Arc::clone(ips);
        }

        let ips: HashSet<IpAddr> = match self.inner.interfaces.addrs() {
            Ok(addrs) => addrs.into_iter().map(normalize).collect(),
            Err(e) => {
                warn!(error = %e, "failed to enumerate network interfaces");
                HashSet::new()
            }
        };
        debug!(count = ips.len(), "machine addresses refreshed");

        let ips = Arc::new(ips);
        *cached = Some((now, Arc::clone(&ips)));
        ips
    }

    /// Cached or coalesced hostname decision
    async fn resolve_host(&self, host: String) -> bool {
        if let Some(allowed) = self.cached(&host) {
            return allowed;
        }

        let lookup = {
            let mut in_flight = self.inner.in_flight.lock();
            match in_flight.get(&host) {
                Some(lookup) => lookup.clone(),
                None => {
                    let this = self.clone();
                    let key = host.clone();
                    let lookup = async move { this.lookup_and_cache(key).await }
                        .boxed()
                        .shared();
                    in_flight.insert(host, lookup.clone());
                    lookup
                }
            }
        };

        lookup.await
    }

    /// Unexpired cached decision
    fn cached(&self, host: &str) -> Option<bool> {
        self.inner
            .hosts
            .lock()
            .get(host)
            .filter(|entry| entry.expires_at > Instant::now())
            .map(|entry| entry.allowed)
    }

    async fn lookup_and_cache(&self, host: String) -> bool {
        let (allowed, ttl) = self.lookup(&host).await;

        self.inner.hosts.lock().insert(
            host.clone(),
            CacheEntry {
                allowed,
                expires_at: Instant::now() + ttl,
            },
        );
        self.inner.in_flight.lock().remove(&host);

        allowed
    }

    /// Resolve a hostname, returning the decision and how long to cache it
    async fn lookup(&self, host: &str) -> (bool, Duration) {
        let config = &self.inner.config;
        let negative = config.negative_cache_ttl;

        let (dns, os) = tokio::join!(
            self.bounded(host, self.inner.resolver.lookup_dns(host)),
            self.bounded(host, self.inner.resolver.lookup_os(host)),
        );

        match dns {
            Ok(answer) => {
                if !answer.addrs.iter().any(|ip| self.is_machine_ip(*ip)) {
                    return (false, negative);
                }

                if answer.min_ttl < config.min_dns_ttl {
                    warn!(
                        host,
                        ttl_secs = answer.min_ttl.as_secs(),
                        "local DNS answer with short TTL, possible rebinding"
                    );
                    return (false, negative);
                }

                (true, answer.min_ttl)
            }
            Err(dns_error) => match os {
                // Only a hosts-file entry resolves here without DNS
                Ok(addrs) if addrs.iter().any(|ip| self.is_machine_ip(*ip)) => {
                    debug!(host, "trusting hosts-file entry");
                    (true, config.min_dns_ttl)
                }
                Ok(_) => (false, negative),
                Err(os_error) => {
                    debug!(host, dns = %dns_error, os = %os_error, "host did not resolve");
                    (false, negative)
                }
            },
        }
    }

    /// Apply the lookup timeout
    async fn bounded<T>(
        &self,
        host: &str,
        lookup: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        let after = self.inner.config.dns_timeout;
        match tokio::time::timeout(after, lookup).await {
            Ok(result) => result,
            Err(_) => Err(OriginError::Timeout {
                host: host.to_owned(),
                after,
            }),
        }
    }
}

impl std::fmt::Debug for OriginValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OriginValidator")
            .field("config", &self.inner.config)
            .field("cached_hosts", &self.inner.hosts.lock().len())
            .finish()
    }
}

#[cfg(test)]
#[path = "validator_test.rs"]
mod tests;
