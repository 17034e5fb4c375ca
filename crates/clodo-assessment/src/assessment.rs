//! The assessment engine itself: ties discovery, the capability
//! manifest, and the upstream token/ownership probes together into one
//! [`CapabilityAssessment`], cached by [`crate::cache::AssessmentCache`].

use crate::discovery::{self, DiscoveredArtifacts};
use crate::gap::{Gap, GapAnalysis, GapPriority, GapStatus};
use crate::manifest::{CapabilityManifest, ServiceType};
use clodo_core::{DnsConflictStatus, Environment, OrchestratorError, OwnershipStatus, TokenVerification, UpstreamApi};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// Everything the caller supplied up front (CLI flags, env vars). Any
/// field left `None` is filled in by discovery/inference instead.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserInputs {
    pub service_type: Option<ServiceType>,
    pub domain: Option<String>,
    pub environment: Option<Environment>,
    pub api_token: Option<String>,
    pub database_name: Option<String>,
    pub bucket_name: Option<String>,
    pub namespace_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub capability: String,
    pub priority: GapPriority,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapabilityAssessment {
    pub service_type: ServiceType,
    pub manifest: CapabilityManifest,
    pub gap_analysis: GapAnalysis,
    pub recommendations: Vec<Recommendation>,
    /// 0-100; see [`crate::assessment::compute_confidence`].
    pub confidence: u8,
    pub cache_key: String,
}

impl CapabilityAssessment {
    pub fn is_deployable(&self) -> bool {
        self.gap_analysis.is_deployable()
    }
}

fn permission_satisfied(manifest: &CapabilityManifest, capability: &str, granted: &[String]) -> bool {
    match manifest.required_permissions.get(capability) {
        Some(required) => required.iter().all(|p| granted.iter().any(|g| g == p)),
        None => true,
    }
}

fn missing_permissions(manifest: &CapabilityManifest, capability: &str, granted: &[String]) -> Vec<String> {
    manifest
        .required_permissions
        .get(capability)
        .map(|required| required.iter().filter(|p| !granted.contains(p)).cloned().collect())
        .unwrap_or_default()
}

fn analyze_capability_gaps(
    manifest: &CapabilityManifest,
    discovered: &DiscoveredArtifacts,
    token: Option<&TokenVerification>,
) -> GapAnalysis {
    let mut analysis = GapAnalysis::default();

    for capability in &manifest.required_capabilities {
        let is_discovered = discovered.discovered_capabilities.iter().any(|c| c == capability);
        if is_discovered {
            continue; // fully configured, no gap row
        }

        let gap = match token {
            Some(tv) if permission_satisfied(manifest, capability, &tv.permissions) => Gap {
                capability: capability.clone(),
                status: GapStatus::Missing,
                priority: GapPriority::High,
                deployable: true,
                reason: Some("capability not yet configured".to_string()),
            },
            Some(tv) => Gap {
                capability: capability.clone(),
                status: GapStatus::Missing,
                priority: GapPriority::Blocked,
                deployable: false,
                reason: Some(format!(
                    "missing required permission(s): {}",
                    missing_permissions(manifest, capability, &tv.permissions).join(", ")
                )),
            },
            None => Gap {
                capability: capability.clone(),
                status: GapStatus::Missing,
                priority: GapPriority::High,
                deployable: true,
                reason: Some(
                    "capability not yet configured; provide a token to verify required permissions".to_string(),
                ),
            },
        };
        analysis.push(gap);
    }

    analysis
}

fn compute_confidence(user_inputs: &UserInputs, discovered: &DiscoveredArtifacts, gaps: &GapAnalysis) -> u8 {
    let mut score: i32 = 50;
    if user_inputs.service_type.is_some() {
        score += 10;
    }
    if user_inputs.api_token.is_some() {
        score += 10;
    }
    score += 2 * discovered.discovered_capabilities.len() as i32;
    score -= 20 * gaps.blocked_count() as i32;
    score -= 5 * gaps.high_priority_count() as i32;
    score.clamp(0, 100) as u8
}

fn build_recommendations(gaps: &GapAnalysis) -> Vec<Recommendation> {
    gaps.gaps
        .iter()
        .map(|gap| Recommendation {
            capability: gap.capability.clone(),
            priority: gap.priority,
            message: match gap.priority {
                GapPriority::Blocked => format!(
                    "resolve before deploying: {}",
                    gap.reason.clone().unwrap_or_else(|| "blocked".to_string())
                ),
                GapPriority::Warning => format!(
                    "review before deploying: {}",
                    gap.reason.clone().unwrap_or_default()
                ),
                _ => format!(
                    "configure '{}': {}",
                    gap.capability,
                    gap.reason.clone().unwrap_or_default()
                ),
            },
        })
        .collect()
}

pub struct AssessmentEngine {
    upstream: Arc<dyn UpstreamApi>,
    cache: crate::cache::AssessmentCache,
}

impl AssessmentEngine {
    pub fn new(upstream: Arc<dyn UpstreamApi>, cache: crate::cache::AssessmentCache) -> Self {
        Self { upstream, cache }
    }

    pub async fn assess(
        &self,
        service_path: &Path,
        user_inputs: UserInputs,
        force_refresh: bool,
    ) -> Result<CapabilityAssessment, OrchestratorError> {
        let cache_key = crate::cache::cache_key(service_path, &user_inputs);

        if !force_refresh {
            if let Some(cached) = self.cache.get(&cache_key).await {
                return Ok(cached);
            }
        }

        let artifacts = discovery::discover(service_path);
        let service_type = user_inputs
            .service_type
            .unwrap_or_else(|| discovery::infer_service_type(&artifacts));
        let environment = user_inputs.environment.unwrap_or(Environment::Development);
        let manifest = CapabilityManifest::for_service_type(service_type, environment);

        let token_verification = match &user_inputs.api_token {
            Some(token) => Some(self.upstream.verify_token(token).await?),
            None => None,
        };

        let mut gap_analysis = analyze_capability_gaps(&manifest, &artifacts, token_verification.as_ref());

        if let (Some(domain), Some(tv)) = (&user_inputs.domain, &token_verification) {
            if tv.valid {
                match self.upstream.check_domain_ownership(domain).await? {
                    OwnershipStatus::Owned => {}
                    OwnershipStatus::NotOwned => gap_analysis.push(Gap {
                        capability: "domain-ownership".to_string(),
                        status: GapStatus::Missing,
                        priority: GapPriority::Blocked,
                        deployable: false,
                        reason: Some(format!("domain '{domain}' is not owned by this account")),
                    }),
                    OwnershipStatus::Unknown => gap_analysis.push(Gap {
                        capability: "domain-ownership".to_string(),
                        status: GapStatus::PartiallyConfigured,
                        priority: GapPriority::Warning,
                        deployable: true,
                        reason: Some(format!("ownership of '{domain}' could not be determined")),
                    }),
                }

                if self.upstream.check_dns_conflict(domain).await? == DnsConflictStatus::Conflict {
                    gap_analysis.push(Gap {
                        capability: "dns".to_string(),
                        status: GapStatus::PartiallyConfigured,
                        priority: GapPriority::Warning,
                        deployable: true,
                        reason: Some(format!("a conflicting DNS record already exists for '{domain}'")),
                    });
                }
            }
        }

        let confidence = compute_confidence(&user_inputs, &artifacts, &gap_analysis);
        let recommendations = build_recommendations(&gap_analysis);

        let assessment = CapabilityAssessment {
            service_type,
            manifest,
            gap_analysis,
            recommendations,
            confidence,
            cache_key: cache_key.clone(),
        };

        self.cache.insert(cache_key, assessment.clone()).await;
        Ok(assessment)
    }
}
