//! Injectable collaborators: the upstream platform API and the
//! interactive-confirmation surface. Both are out of scope per
//! spec.md §1 ("modeled as an injectable client interface" / "the
//! shell/CLI framing ... is injectable") — this module only defines
//! the seam. Grounded on `aion-cloud`'s `CloudProvider` `async_trait`
//! (one trait, one real impl per backend, one fake impl for tests).

use crate::error::OrchestratorError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenVerification {
    pub valid: bool,
    pub account_id: Option<String>,
    pub permissions: Vec<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OwnershipStatus {
    Owned,
    NotOwned,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DnsConflictStatus {
    NoConflict,
    Conflict,
}

/// A handle to a resource created on the upstream platform (database,
/// worker script, DNS record, ...). Opaque id plus whatever endpoint
/// the resource exposes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceHandle {
    pub id: String,
    pub endpoint: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthProbeResult {
    Healthy { status_code: u16, elapsed_ms: u64 },
    Unhealthy { status_code: Option<u16>, elapsed_ms: u64 },
}

impl HealthProbeResult {
    pub fn is_healthy(&self) -> bool {
        matches!(self, HealthProbeResult::Healthy { .. })
    }

    pub fn elapsed_ms(&self) -> u64 {
        match self {
            HealthProbeResult::Healthy { elapsed_ms, .. } => *elapsed_ms,
            HealthProbeResult::Unhealthy { elapsed_ms, .. } => *elapsed_ms,
        }
    }
}

/// The upstream managed-platform API, modeled as a trait so
/// `clodo-ratelimit` can wrap any implementation with quota/backoff
/// behavior and tests can swap in a scripted fake.
#[async_trait]
pub trait UpstreamApi: Send + Sync {
    async fn verify_token(&self, token: &str) -> Result<TokenVerification, OrchestratorError>;
    async fn check_domain_ownership(&self, domain: &str) -> Result<OwnershipStatus, OrchestratorError>;
    async fn check_dns_conflict(&self, domain: &str) -> Result<DnsConflictStatus, OrchestratorError>;

    async fn create_database(&self, name: &str) -> Result<ResourceHandle, OrchestratorError>;
    async fn delete_database(&self, id: &str) -> Result<(), OrchestratorError>;
    async fn apply_migrations(&self, database_id: &str, migrations: &[String]) -> Result<(), OrchestratorError>;
    async fn restore_database_snapshot(&self, database_id: &str, snapshot_id: &str) -> Result<(), OrchestratorError>;

    async fn push_worker(
        &self,
        domain: &str,
        artifact_revision: &str,
        env_vars: HashMap<String, String>,
    ) -> Result<ResourceHandle, OrchestratorError>;
    async fn revert_deploy_config(&self, domain: &str, previous_revision: &str) -> Result<(), OrchestratorError>;
    async fn redeploy_previous_artifact(&self, domain: &str, previous_revision: &str) -> Result<(), OrchestratorError>;

    async fn upsert_dns_record(&self, domain: &str, target: &str) -> Result<ResourceHandle, OrchestratorError>;
    async fn delete_dns_record(&self, id: &str) -> Result<(), OrchestratorError>;

    async fn health_probe(&self, url: &str) -> Result<HealthProbeResult, OrchestratorError>;
}

/// Interactive-confirmation seam (DESIGN NOTES §9): a non-interactive
/// implementation auto-declines destructive operations, an
/// interactive one (owned by `clodo-cli`) prompts the operator.
pub trait Confirmer: Send + Sync {
    fn confirm(&self, prompt: &str) -> bool;
}

pub struct NonInteractiveConfirmer;

impl Confirmer for NonInteractiveConfirmer {
    fn confirm(&self, _prompt: &str) -> bool {
        false
    }
}
