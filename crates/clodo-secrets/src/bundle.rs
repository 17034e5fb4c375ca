//! Per-domain secret generation (spec.md §4.F):
//! `generateDomainSpecific(domain, env) -> SecretBundle`, idempotent by
//! cache key unless `reuse_existing` is false, rendered into several
//! formats simultaneously so downstream consumers can use whichever is
//! native to them.

use clodo_core::domain::{Domain, Environment};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A generated set of per-domain secret values, materialized into the
/// formats the various deploy tools expect.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecretBundle {
    pub domain: String,
    pub environment: String,
    pub values: BTreeMap<String, String>,
}

impl SecretBundle {
    /// `KEY=value` lines, suitable for a `.env` file or `wrangler secret`
    /// bulk put.
    pub fn as_env_format(&self) -> String {
        self.values
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Structured JSON, suitable for config files that embed secrets
    /// directly (`wrangler.toml`'s `[vars]`-adjacent JSON sidecar, CI
    /// secret manifests).
    pub fn as_json_format(&self) -> serde_json::Value {
        serde_json::json!({
            "domain": self.domain,
            "environment": self.environment,
            "secrets": self.values,
        })
    }

    /// `wrangler secret put KEY` invocations, one per line, value
    /// supplied on stdin by the caller — this renders the command list,
    /// not the values, since wrangler reads secret values from stdin.
    pub fn as_deploy_tool_native(&self) -> Vec<String> {
        self.values
            .keys()
            .map(|k| format!("wrangler secret put {k}"))
            .collect()
    }

    /// `export KEY=value` lines for sourcing into a shell.
    pub fn as_shell_format(&self) -> String {
        self.values
            .iter()
            .map(|(k, v)| format!("export {k}={}", shell_quote(v)))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "'\\''"))
}

/// Generates the fixed set of secret values a domain's deploy pipeline
/// needs. In production this would draw from the token store and
/// upstream-provisioned resource identifiers; here it derives
/// deterministic placeholder values from the domain/environment pair so
/// the bundle is stable across calls with the same cache key.
fn materialize_values(domain: &Domain, environment: Environment) -> BTreeMap<String, String> {
    let mut values = BTreeMap::new();
    values.insert("DOMAIN_NAME".to_string(), domain.name.clone());
    values.insert("DEPLOY_ENV".to_string(), environment.as_str().to_string());
    values.insert(
        "SERVICE_NAMESPACE".to_string(),
        format!("{}-{}", domain.portfolio, environment.as_str()),
    );
    values
}

/// Generates and caches [`SecretBundle`]s keyed by `(domain, env)`.
/// Grounded on `aion-core::cache::CacheManager`'s pattern, reused here
/// with a plain `DashMap` rather than a TTL cache: a secret bundle does
/// not go stale the way a capability assessment does, it is only
/// invalidated by an explicit `reuse_existing = false` regeneration.
pub struct BundleGenerator {
    pub(crate) cache: DashMap<String, SecretBundle>,
}

impl Default for BundleGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl BundleGenerator {
    pub fn new() -> Self {
        Self { cache: DashMap::new() }
    }

    fn cache_key(domain: &Domain, environment: Environment) -> String {
        format!("{}::{}", domain.name, environment.as_str())
    }

    pub fn generate_domain_specific(
        &self,
        domain: &Domain,
        environment: Environment,
        reuse_existing: bool,
    ) -> SecretBundle {
        let key = Self::cache_key(domain, environment);

        if reuse_existing {
            if let Some(existing) = self.cache.get(&key) {
                return existing.clone();
            }
        }

        let bundle = SecretBundle {
            domain: domain.name.clone(),
            environment: environment.as_str().to_string(),
            values: materialize_values(domain, environment),
        };
        self.cache.insert(key, bundle.clone());
        bundle
    }

    /// Drops the cached bundle for `(domain, environment)`, so the next
    /// `generate_domain_specific(..., reuse_existing = true)` call
    /// regenerates rather than returning materialized values from a
    /// deploy that was rolled back (spec.md §4.D's `delete-secret`
    /// inverse). A no-op if nothing was cached for the key.
    pub fn evict(&self, domain: &str, environment: &str) {
        self.cache.remove(&format!("{domain}::{environment}"));
    }
}
