//! Mapping from file configuration to component settings

use spotlight_config::OriginConfig;
use spotlight_origin::ValidatorConfig;

/// Origin validator policy from the `[origin]` section
pub fn validator_config(origin: &OriginConfig) -> ValidatorConfig {
    ValidatorConfig {
        allowed_domains: origin
            .allowed_domains
            .iter()
            .map(|domain| domain.trim().trim_end_matches('.').to_ascii_lowercase())
            .collect(),
        min_dns_ttl: origin.min_dns_ttl(),
        negative_cache_ttl: origin.negative_cache_ttl(),
        machine_ip_cache_ttl: origin.machine_ip_cache_ttl(),
        dns_timeout: origin.dns_timeout(),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_defaults_match_validator_defaults() {
        assert_eq!(
            validator_config(&OriginConfig::default()),
            ValidatorConfig::default()
        );
    }

    #[test]
    fn test_domains_normalized() {
        let origin = OriginConfig {
            allowed_domains: vec![" Example.DEV. ".to_string()],
            dns_timeout_ms: 250,
            ..OriginConfig::default()
        };

        let config = validator_config(&origin);
        assert_eq!(config.allowed_domains, vec!["example.dev"]);
        assert_eq!(config.dns_timeout, Duration::from_millis(250));
    }
}
