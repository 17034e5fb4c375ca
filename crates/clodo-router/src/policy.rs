//! Per-`(domain, env)` routing policy (spec.md §4.I). Defaults are
//! keyed by environment; each domain picks up its environment's
//! defaults unless overridden.

use clodo_core::domain::Environment;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingPolicy {
    pub rate_limit_per_minute: u32,
    pub cache_ttl_secs: u64,
    pub strategies: Vec<String>,
}

impl RoutingPolicy {
    pub fn defaults_for(environment: Environment) -> Self {
        match environment {
            Environment::Development => Self {
                rate_limit_per_minute: 1000,
                cache_ttl_secs: 5,
                strategies: vec!["bypass-cache".to_string()],
            },
            Environment::Staging => Self {
                rate_limit_per_minute: 300,
                cache_ttl_secs: 60,
                strategies: vec!["cache-first".to_string(), "log-verbose".to_string()],
            },
            Environment::Production => Self {
                rate_limit_per_minute: 100,
                cache_ttl_secs: 300,
                strategies: vec!["cache-first".to_string(), "rate-limit-strict".to_string()],
            },
        }
    }
}

/// Validates the router's configuration: at least one domain, all
/// domain names non-empty, unknown environment keys are warnings (not
/// errors) and returned for the caller to log.
pub fn validate_config(domains: &[String], env_map_keys: &[String]) -> Result<Vec<String>, crate::error::RouterError> {
    if domains.is_empty() {
        return Err(crate::error::RouterError::NoDomainsConfigured);
    }
    for domain in domains {
        if domain.trim().is_empty() {
            return Err(crate::error::RouterError::BlankDomainName);
        }
    }

    let known = ["development", "staging", "production"];
    let warnings = env_map_keys
        .iter()
        .filter(|key| !known.contains(&key.as_str()))
        .map(|key| format!("unknown environment key '{key}' in domain env map"))
        .collect();
    Ok(warnings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn production_policy_is_stricter_than_development() {
        let dev = RoutingPolicy::defaults_for(Environment::Development);
        let prod = RoutingPolicy::defaults_for(Environment::Production);
        assert!(prod.rate_limit_per_minute < dev.rate_limit_per_minute);
        assert!(prod.cache_ttl_secs > dev.cache_ttl_secs);
    }

    #[test]
    fn validate_config_rejects_empty_domain_list() {
        let err = validate_config(&[], &[]).unwrap_err();
        assert!(matches!(err, crate::error::RouterError::NoDomainsConfigured));
    }

    #[test]
    fn validate_config_rejects_blank_domain_name() {
        let err = validate_config(&["  ".to_string()], &[]).unwrap_err();
        assert!(matches!(err, crate::error::RouterError::BlankDomainName));
    }

    #[test]
    fn validate_config_warns_on_unknown_env_key() {
        let warnings = validate_config(&["a.example.com".to_string()], &["prod".to_string()]).unwrap();
        assert_eq!(warnings.len(), 1);
    }
}
