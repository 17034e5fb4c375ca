//! Capability manifests: the static table of what each inferred
//! service type requires/permits, keyed off `ServiceType`. Grounded on
//! the small hand-rolled capability tables in `aion-core::platform`
//! (per-provider feature flags keyed off an enum) rather than anything
//! dynamic — the table is fixed, only the gap analysis built from it
//! varies per service.

use clodo_core::Environment;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ServiceType {
    /// Worker backed by a D1 database. The default/fallback inference
    /// target when discovery can't prove a lighter-weight shape —
    /// every example in spec.md's walkthroughs is a data service, and
    /// treating it as the fallback is what makes "valid deploy
    /// manifest, no migrations" surface a real gap instead of a false
    /// "fully configured".
    DataService,
    StaticSite,
    ApiGateway,
    Generic,
}

impl ServiceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceType::DataService => "data-service",
            ServiceType::StaticSite => "static-site",
            ServiceType::ApiGateway => "api-gateway",
            ServiceType::Generic => "generic",
        }
    }
}

impl std::str::FromStr for ServiceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "data-service" | "data_service" => Ok(ServiceType::DataService),
            "static-site" | "static_site" => Ok(ServiceType::StaticSite),
            "api-gateway" | "api_gateway" => Ok(ServiceType::ApiGateway),
            "generic" => Ok(ServiceType::Generic),
            other => Err(format!("unknown service type '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapabilityManifest {
    pub service_type: ServiceType,
    pub required_capabilities: Vec<String>,
    pub optional_capabilities: Vec<String>,
    pub infrastructure: Vec<String>,
    pub endpoints: Vec<String>,
    /// Upstream permission scopes required to configure each
    /// capability, e.g. `"database" -> ["D1:Edit"]`. A capability whose
    /// scopes aren't covered by the verified token's permissions is
    /// blocked, not merely missing (spec.md §4.A.5).
    pub required_permissions: HashMap<String, Vec<String>>,
}

impl CapabilityManifest {
    pub fn for_service_type(service_type: ServiceType, environment: Environment) -> Self {
        let mut manifest = match service_type {
            ServiceType::DataService => Self {
                service_type,
                required_capabilities: vec!["deployment".into(), "database".into()],
                optional_capabilities: vec!["kv-storage".into(), "object-storage".into(), "caching".into()],
                infrastructure: vec!["worker".into(), "d1".into()],
                endpoints: vec!["/health".into(), "/api/data".into()],
                required_permissions: HashMap::from([
                    ("deployment".to_string(), vec!["Workers:Edit".to_string()]),
                    ("database".to_string(), vec!["D1:Edit".to_string()]),
                ]),
            },
            ServiceType::StaticSite => Self {
                service_type,
                required_capabilities: vec!["deployment".into()],
                optional_capabilities: vec!["cdn".into(), "caching".into()],
                infrastructure: vec!["pages".into()],
                endpoints: vec!["/health".into()],
                required_permissions: HashMap::from([(
                    "deployment".to_string(),
                    vec!["Workers:Edit".to_string()],
                )]),
            },
            ServiceType::ApiGateway => Self {
                service_type,
                required_capabilities: vec!["deployment".into(), "rate-limiting".into()],
                optional_capabilities: vec!["kv-storage".into(), "caching".into()],
                infrastructure: vec!["worker".into()],
                endpoints: vec!["/health".into(), "/api".into()],
                required_permissions: HashMap::from([
                    ("deployment".to_string(), vec!["Workers:Edit".to_string()]),
                    ("rate-limiting".to_string(), vec!["Workers:Edit".to_string()]),
                ]),
            },
            ServiceType::Generic => Self {
                service_type,
                required_capabilities: vec!["deployment".into()],
                optional_capabilities: vec!["kv-storage".into()],
                infrastructure: vec!["worker".into()],
                endpoints: vec!["/health".into()],
                required_permissions: HashMap::from([(
                    "deployment".to_string(),
                    vec!["Workers:Edit".to_string()],
                )]),
            },
        };

        // Environment-specific additions (spec.md §4.A.4).
        match environment {
            Environment::Production => {
                manifest.optional_capabilities.push("rate-limiting".into());
                manifest.optional_capabilities.push("error-tracking".into());
                manifest.optional_capabilities.push("cors".into());
            }
            Environment::Development => {
                manifest.optional_capabilities.push("debug-logging".into());
            }
            Environment::Staging => {}
        }
        manifest.optional_capabilities.dedup();
        manifest
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn production_data_service_gains_rate_limiting_and_cors() {
        let manifest = CapabilityManifest::for_service_type(ServiceType::DataService, Environment::Production);
        assert!(manifest.optional_capabilities.contains(&"rate-limiting".to_string()));
        assert!(manifest.optional_capabilities.contains(&"cors".to_string()));
    }

    #[test]
    fn data_service_requires_database_permission() {
        let manifest = CapabilityManifest::for_service_type(ServiceType::DataService, Environment::Staging);
        assert_eq!(
            manifest.required_permissions.get("database"),
            Some(&vec!["D1:Edit".to_string()])
        );
    }

    #[test]
    fn service_type_round_trips_through_str() {
        for st in [
            ServiceType::DataService,
            ServiceType::StaticSite,
            ServiceType::ApiGateway,
            ServiceType::Generic,
        ] {
            let parsed: ServiceType = st.as_str().parse().unwrap();
            assert_eq!(parsed, st);
        }
    }
}
