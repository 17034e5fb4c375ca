//! Domain router: combines discovery, selection and the per-`(domain,
//! env)` policy cache into one entry point for `clodo-orchestrator`.

use crate::discovery::DomainSource;
use crate::error::RouterError;
use crate::policy::{validate_config, RoutingPolicy};
use crate::selection::{select_domains, Selection};
use clodo_core::domain::Environment;
use moka::future::Cache;
use std::collections::HashMap;
use std::time::Duration;

/// TTL config cache, grounded on `aion-core::cache::CacheManager`'s
/// `Cache::builder().max_capacity(..).time_to_live(..)` pattern.
pub struct DomainRouter {
    sources: Vec<Box<dyn DomainSource>>,
    env_map: HashMap<String, Vec<String>>,
    policy_cache: Cache<String, RoutingPolicy>,
}

impl DomainRouter {
    pub fn new(sources: Vec<Box<dyn DomainSource>>, env_map: HashMap<String, Vec<String>>) -> Self {
        let policy_cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(300))
            .build();

        Self {
            sources,
            env_map,
            policy_cache,
        }
    }

    /// Discovers and validates the configured domain set, returning any
    /// non-fatal warnings alongside the sorted, de-duplicated list.
    pub async fn discover_and_validate(&self) -> Result<(Vec<String>, Vec<String>), RouterError> {
        let domains = crate::discovery::merge_domains(&self.sources).await?;
        let warnings = validate_config(&domains, &self.env_map.keys().cloned().collect::<Vec<_>>())?;
        Ok((domains, warnings))
    }

    pub async fn select(&self, available: &[String], selection: &Selection) -> Result<Vec<String>, RouterError> {
        select_domains(available, selection, &self.env_map)
    }

    /// Returns the routing policy for `(domain, env)`, computing and
    /// caching the environment default on first lookup.
    pub async fn policy_for(&self, domain: &str, environment: Environment) -> RoutingPolicy {
        let key = format!("{domain}::{}", environment.as_str());
        if let Some(cached) = self.policy_cache.get(&key).await {
            return cached;
        }
        let policy = RoutingPolicy::defaults_for(environment);
        self.policy_cache.insert(key, policy.clone()).await;
        policy
    }

    pub async fn invalidate_policy(&self, domain: &str, environment: Environment) {
        let key = format!("{domain}::{}", environment.as_str());
        self.policy_cache.invalidate(&key).await;
    }
}
