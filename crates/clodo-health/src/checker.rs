//! Health probes (spec.md §4.G): `/health` plus whatever
//! service-type-specific endpoints the capability manifest enumerates,
//! each probed within a deadline with a bounded number of retries.

use clodo_core::traits::{HealthProbeResult, UpstreamApi};
use clodo_core::OrchestratorError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct HealthCheckConfig {
    pub initial_deadline: Duration,
    pub propagation_wait: Duration,
    pub max_retries: u32,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            initial_deadline: Duration::from_secs(10),
            propagation_wait: Duration::from_secs(10),
            max_retries: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointOutcome {
    pub url: String,
    pub healthy: bool,
    pub status_code: Option<u16>,
    pub elapsed_ms: u64,
    pub attempts: u32,
}

pub struct HealthChecker {
    upstream: Arc<dyn UpstreamApi>,
    config: HealthCheckConfig,
}

impl HealthChecker {
    pub fn new(upstream: Arc<dyn UpstreamApi>, config: HealthCheckConfig) -> Self {
        Self { upstream, config }
    }

    /// Probes one endpoint, retrying on a non-healthy result up to
    /// `max_retries` times, waiting `propagation_wait` between
    /// attempts. The overall probe, retries included, is bounded by
    /// `initial_deadline` via `tokio::time::timeout`.
    pub async fn check_endpoint(&self, url: &str) -> Result<EndpointOutcome, OrchestratorError> {
        let mut attempts = 0u32;
        let outcome = tokio::time::timeout(self.config.initial_deadline, async {
            loop {
                attempts += 1;
                let probe = self.upstream.health_probe(url).await?;
                if probe.is_healthy() || attempts > self.config.max_retries {
                    return Ok::<HealthProbeResult, OrchestratorError>(probe);
                }
                tokio::time::sleep(self.config.propagation_wait).await;
            }
        })
        .await
        .map_err(|_| OrchestratorError::Transient(format!("health probe of '{url}' timed out")))??;

        Ok(EndpointOutcome {
            url: url.to_string(),
            healthy: outcome.is_healthy(),
            status_code: match outcome {
                HealthProbeResult::Healthy { status_code, .. } => Some(status_code),
                HealthProbeResult::Unhealthy { status_code, .. } => status_code,
            },
            elapsed_ms: outcome.elapsed_ms(),
            attempts,
        })
    }

    /// Probes every endpoint in `endpoints`; the service as a whole is
    /// healthy only if every endpoint is (spec.md §4.B.4: "a single
    /// non-2xx ... escalates to failure").
    pub async fn check_service(&self, endpoints: &[String]) -> Result<Vec<EndpointOutcome>, OrchestratorError> {
        let mut outcomes = Vec::with_capacity(endpoints.len());
        for endpoint in endpoints {
            outcomes.push(self.check_endpoint(endpoint).await?);
        }
        Ok(outcomes)
    }
}

pub fn all_healthy(outcomes: &[EndpointOutcome]) -> bool {
    outcomes.iter().all(|o| o.healthy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use clodo_core::traits::{DnsConflictStatus, OwnershipStatus, ResourceHandle, TokenVerification};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct ScriptedUpstream {
        healthy_after_attempt: u32,
        calls: AtomicU32,
    }

    #[async_trait]
    impl UpstreamApi for ScriptedUpstream {
        async fn verify_token(&self, _token: &str) -> Result<TokenVerification, OrchestratorError> {
            unimplemented!()
        }
        async fn check_domain_ownership(&self, _domain: &str) -> Result<OwnershipStatus, OrchestratorError> {
            unimplemented!()
        }
        async fn check_dns_conflict(&self, _domain: &str) -> Result<DnsConflictStatus, OrchestratorError> {
            unimplemented!()
        }
        async fn create_database(&self, _name: &str) -> Result<ResourceHandle, OrchestratorError> {
            unimplemented!()
        }
        async fn delete_database(&self, _id: &str) -> Result<(), OrchestratorError> {
            unimplemented!()
        }
        async fn apply_migrations(&self, _database_id: &str, _migrations: &[String]) -> Result<(), OrchestratorError> {
            unimplemented!()
        }
        async fn restore_database_snapshot(&self, _database_id: &str, _snapshot_id: &str) -> Result<(), OrchestratorError> {
            unimplemented!()
        }
        async fn push_worker(
            &self,
            _domain: &str,
            _artifact_revision: &str,
            _env_vars: HashMap<String, String>,
        ) -> Result<ResourceHandle, OrchestratorError> {
            unimplemented!()
        }
        async fn revert_deploy_config(&self, _domain: &str, _previous_revision: &str) -> Result<(), OrchestratorError> {
            unimplemented!()
        }
        async fn redeploy_previous_artifact(&self, _domain: &str, _previous_revision: &str) -> Result<(), OrchestratorError> {
            unimplemented!()
        }
        async fn upsert_dns_record(&self, _domain: &str, _target: &str) -> Result<ResourceHandle, OrchestratorError> {
            unimplemented!()
        }
        async fn delete_dns_record(&self, _id: &str) -> Result<(), OrchestratorError> {
            unimplemented!()
        }
        async fn health_probe(&self, _url: &str) -> Result<HealthProbeResult, OrchestratorError> {
            let attempt = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if attempt >= self.healthy_after_attempt {
                Ok(HealthProbeResult::Healthy { status_code: 200, elapsed_ms: 5 })
            } else {
                Ok(HealthProbeResult::Unhealthy { status_code: Some(503), elapsed_ms: 5 })
            }
        }
    }

    #[tokio::test]
    async fn healthy_first_attempt_reports_one_attempt() {
        let upstream = Arc::new(ScriptedUpstream { healthy_after_attempt: 1, calls: AtomicU32::new(0) });
        let checker = HealthChecker::new(
            upstream,
            HealthCheckConfig { initial_deadline: Duration::from_secs(5), propagation_wait: Duration::from_millis(1), max_retries: 3 },
        );
        let outcome = checker.check_endpoint("https://api.example.com/health").await.unwrap();
        assert!(outcome.healthy);
        assert_eq!(outcome.attempts, 1);
    }

    #[tokio::test]
    async fn retries_until_healthy_within_budget() {
        let upstream = Arc::new(ScriptedUpstream { healthy_after_attempt: 2, calls: AtomicU32::new(0) });
        let checker = HealthChecker::new(
            upstream,
            HealthCheckConfig { initial_deadline: Duration::from_secs(5), propagation_wait: Duration::from_millis(1), max_retries: 3 },
        );
        let outcome = checker.check_endpoint("https://api.example.com/health").await.unwrap();
        assert!(outcome.healthy);
        assert_eq!(outcome.attempts, 2);
    }

    #[tokio::test]
    async fn service_is_unhealthy_if_any_endpoint_never_recovers() {
        let upstream = Arc::new(ScriptedUpstream { healthy_after_attempt: 999, calls: AtomicU32::new(0) });
        let checker = HealthChecker::new(
            upstream,
            HealthCheckConfig { initial_deadline: Duration::from_secs(5), propagation_wait: Duration::from_millis(1), max_retries: 1 },
        );
        let outcomes = checker.check_service(&["https://api.example.com/health".to_string()]).await.unwrap();
        assert!(!all_healthy(&outcomes));
    }
}
