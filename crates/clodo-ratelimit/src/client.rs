//! [`RateLimitedClient`]: wraps any [`UpstreamApi`] with the quota,
//! queueing and backoff behavior from spec.md §4.E, and is itself an
//! `UpstreamApi` impl so callers (assessment, orchestrator, database,
//! health) never need to know rate limiting is happening.

use crate::backoff::delay_for_attempt;
use crate::class::{ApiClass, Priority};
use crate::queue::AdmissionQueue;
use crate::window::WindowCounter;
use async_trait::async_trait;
use clodo_core::{
    DnsConflictStatus, HealthProbeResult, OrchestratorError, OwnershipStatus, ResourceHandle,
    TokenVerification, UpstreamApi,
};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

const DEFAULT_MAX_ATTEMPTS: u32 = 5;

struct ClassGate {
    queue: AdmissionQueue,
    window: WindowCounter,
    class: ApiClass,
}

impl ClassGate {
    fn new(class: ApiClass) -> Self {
        Self {
            queue: AdmissionQueue::new(),
            window: WindowCounter::new(class.limits()),
            class,
        }
    }

    async fn acquire(&self, priority: Priority) {
        self.queue.acquire(priority, || self.window.try_reserve_slot()).await;
    }
}

pub struct RateLimitedClient {
    inner: Arc<dyn UpstreamApi>,
    workers: ClassGate,
    d1: ClassGate,
    general: ClassGate,
    max_attempts: u32,
}

impl RateLimitedClient {
    pub fn new(inner: Arc<dyn UpstreamApi>) -> Self {
        Self {
            inner,
            workers: ClassGate::new(ApiClass::Workers),
            d1: ClassGate::new(ApiClass::D1),
            general: ClassGate::new(ApiClass::General),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    fn gate(&self, class: ApiClass) -> &ClassGate {
        match class {
            ApiClass::Workers => &self.workers,
            ApiClass::D1 => &self.d1,
            ApiClass::General => &self.general,
        }
    }

    /// Runs `f` under this class's quota gate, retrying with backoff
    /// on [`OrchestratorError::Quota`] (the signal a concrete
    /// `UpstreamApi` impl returns for HTTP 429 / "too many requests")
    /// and propagating any other error immediately (spec.md §4.E: "non-quota
    /// errors propagate immediately without retry").
    async fn call<T, F, Fut>(&self, class: ApiClass, priority: Priority, f: F) -> Result<T, OrchestratorError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, OrchestratorError>>,
    {
        let gate = self.gate(class);
        let mut attempt = 0u32;

        loop {
            gate.acquire(priority).await;
            let result = f().await;
            gate.window.record_response().await;

            match result {
                Ok(value) => return Ok(value),
                Err(OrchestratorError::Quota { .. }) => {
                    attempt += 1;
                    if attempt >= self.max_attempts {
                        return Err(OrchestratorError::Quota {
                            api_class: class.as_str().to_string(),
                            attempts: attempt,
                        });
                    }
                    tokio::time::sleep(delay_for_attempt(&class.limits(), attempt)).await;
                }
                Err(other) => return Err(other),
            }
        }
    }
}

#[async_trait]
impl UpstreamApi for RateLimitedClient {
    async fn verify_token(&self, token: &str) -> Result<TokenVerification, OrchestratorError> {
        self.call(ApiClass::General, Priority::Normal, || self.inner.verify_token(token))
            .await
    }

    async fn check_domain_ownership(&self, domain: &str) -> Result<OwnershipStatus, OrchestratorError> {
        self.call(ApiClass::General, Priority::Normal, || {
            self.inner.check_domain_ownership(domain)
        })
        .await
    }

    async fn check_dns_conflict(&self, domain: &str) -> Result<DnsConflictStatus, OrchestratorError> {
        self.call(ApiClass::General, Priority::Normal, || {
            self.inner.check_dns_conflict(domain)
        })
        .await
    }

    async fn create_database(&self, name: &str) -> Result<ResourceHandle, OrchestratorError> {
        self.call(ApiClass::D1, Priority::Normal, || self.inner.create_database(name))
            .await
    }

    async fn delete_database(&self, id: &str) -> Result<(), OrchestratorError> {
        self.call(ApiClass::D1, Priority::Normal, || self.inner.delete_database(id))
            .await
    }

    async fn apply_migrations(&self, database_id: &str, migrations: &[String]) -> Result<(), OrchestratorError> {
        self.call(ApiClass::D1, Priority::Normal, || {
            self.inner.apply_migrations(database_id, migrations)
        })
        .await
    }

    async fn restore_database_snapshot(&self, database_id: &str, snapshot_id: &str) -> Result<(), OrchestratorError> {
        self.call(ApiClass::D1, Priority::High, || {
            self.inner.restore_database_snapshot(database_id, snapshot_id)
        })
        .await
    }

    async fn push_worker(
        &self,
        domain: &str,
        artifact_revision: &str,
        env_vars: HashMap<String, String>,
    ) -> Result<ResourceHandle, OrchestratorError> {
        self.call(ApiClass::Workers, Priority::Normal, || {
            self.inner.push_worker(domain, artifact_revision, env_vars.clone())
        })
        .await
    }

    async fn revert_deploy_config(&self, domain: &str, previous_revision: &str) -> Result<(), OrchestratorError> {
        self.call(ApiClass::Workers, Priority::High, || {
            self.inner.revert_deploy_config(domain, previous_revision)
        })
        .await
    }

    async fn redeploy_previous_artifact(&self, domain: &str, previous_revision: &str) -> Result<(), OrchestratorError> {
        self.call(ApiClass::Workers, Priority::High, || {
            self.inner.redeploy_previous_artifact(domain, previous_revision)
        })
        .await
    }

    async fn upsert_dns_record(&self, domain: &str, target: &str) -> Result<ResourceHandle, OrchestratorError> {
        self.call(ApiClass::General, Priority::Normal, || {
            self.inner.upsert_dns_record(domain, target)
        })
        .await
    }

    async fn delete_dns_record(&self, id: &str) -> Result<(), OrchestratorError> {
        self.call(ApiClass::General, Priority::High, || self.inner.delete_dns_record(id))
            .await
    }

    async fn health_probe(&self, url: &str) -> Result<HealthProbeResult, OrchestratorError> {
        self.call(ApiClass::General, Priority::Normal, || self.inner.health_probe(url))
            .await
    }
}
