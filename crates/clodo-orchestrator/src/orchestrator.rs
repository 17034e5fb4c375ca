//! [`Orchestrator`]: the public surface spec.md §4.B names —
//! `planDeployment`, `deploy`, `deploySingle`, `rollback` — built on
//! top of [`crate::pipeline::DomainPipeline`] and [`crate::plan::Plan`].
//! Bounded concurrency within a batch uses a `tokio::task::JoinSet`
//! gated by a `tokio::sync::Semaphore` sized to `parallelism`, per
//! DESIGN NOTES §9's "explicit task spawning + a bounded worker pool".

use crate::error::OrchestratorRuntimeError;
use crate::options::DeployOptions;
use crate::pipeline::DomainPipeline;
use crate::plan::{plan_deployment, Plan};
use crate::result::{DomainResult, PortfolioResult};
use clodo_core::domain::Domain;
use clodo_coordinator::Coordinator;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};

pub struct Orchestrator {
    pipeline: Arc<DomainPipeline>,
    coordinator: Arc<Coordinator>,
}

impl Orchestrator {
    pub fn new(pipeline: Arc<DomainPipeline>, coordinator: Arc<Coordinator>) -> Self {
        Self { pipeline, coordinator }
    }

    pub fn plan_deployment(&self, domains: Vec<Domain>, options: &DeployOptions) -> Plan {
        plan_deployment(domains, options.parallelism)
    }

    /// Publishes the run's session token under a single writer so
    /// every domain pipeline can observe it (spec.md §4.C).
    fn open_session(&self, options: &DeployOptions) -> Result<(), OrchestratorRuntimeError> {
        self.coordinator
            .share("session-token", "orchestrator", serde_json::Value::String(options.audit_token.clone()))?;
        Ok(())
    }

    fn close_session(&self) {
        if let Err(err) = self.coordinator.release("session-token", "orchestrator") {
            warn!(error = %err, "failed to release session token");
        }
    }

    pub async fn deploy_single(&self, domain: &Domain, options: &DeployOptions) -> DomainResult {
        self.pipeline.run(domain, options).await
    }

    /// Executes `plan` batch by batch. Each batch runs its domains
    /// concurrently (bounded by `options.parallelism`); the next batch
    /// only starts once every domain in the current one reached
    /// `verify` with outcome `ok`, or the whole run aborts when
    /// `rollback_on_error` is set and any domain in the batch failed.
    pub async fn deploy(&self, plan: &Plan, options: &DeployOptions) -> Result<PortfolioResult, OrchestratorRuntimeError> {
        self.open_session(options)?;
        let semaphore = Arc::new(Semaphore::new(options.parallelism.max(1)));
        let mut portfolio = PortfolioResult::default();

        for (batch_index, batch) in plan.batches.iter().enumerate() {
            info!(batch_index, size = batch.len(), "starting deployment batch");
            let mut joins = JoinSet::new();
            for domain in batch {
                let permit = semaphore.clone();
                let pipeline = self.pipeline.clone();
                let domain = domain.clone();
                let options = options.clone();
                joins.spawn(async move {
                    let _permit = permit.acquire_owned().await.expect("semaphore closed");
                    pipeline.run(&domain, &options).await
                });
            }

            let mut batch_ok = true;
            while let Some(joined) = joins.join_next().await {
                match joined {
                    Ok(result) => {
                        if !result.is_success() {
                            batch_ok = false;
                        }
                        portfolio.results.push(result);
                    }
                    Err(join_err) => {
                        batch_ok = false;
                        warn!(error = %join_err, "domain pipeline task panicked");
                    }
                }
            }

            if !batch_ok && options.rollback_on_error {
                portfolio.aborted_after_batch = Some(batch_index);
                self.close_session();
                return Ok(portfolio);
            }
        }

        self.close_session();
        Ok(portfolio)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::DomainPipeline;
    use async_trait::async_trait;
    use clodo_assessment::AssessmentEngine;
    use clodo_core::domain::Environment;
    use clodo_core::metrics::OrchestratorMetrics;
    use clodo_core::traits::{
        Confirmer, DnsConflictStatus, HealthProbeResult, NonInteractiveConfirmer, OwnershipStatus, ResourceHandle,
        TokenVerification, UpstreamApi,
    };
    use clodo_core::OrchestratorError;
    use clodo_database::DatabaseOrchestrator;
    use clodo_health::{HealthCheckConfig, HealthChecker, ProductionTester};
    use clodo_rollback::{NoopSecretRevoker, RollbackManager};
    use clodo_secrets::BundleGenerator;
    use clodo_store::StateStore;
    use std::collections::HashMap;
    use std::time::Duration;

    struct HealthyUpstream;

    #[async_trait]
    impl UpstreamApi for HealthyUpstream {
        async fn verify_token(&self, _token: &str) -> Result<TokenVerification, OrchestratorError> {
            Ok(TokenVerification { valid: true, account_id: Some("acct".into()), permissions: vec![], error: None })
        }
        async fn check_domain_ownership(&self, _domain: &str) -> Result<OwnershipStatus, OrchestratorError> {
            Ok(OwnershipStatus::Owned)
        }
        async fn check_dns_conflict(&self, _domain: &str) -> Result<DnsConflictStatus, OrchestratorError> {
            Ok(DnsConflictStatus::NoConflict)
        }
        async fn create_database(&self, name: &str) -> Result<ResourceHandle, OrchestratorError> {
            Ok(ResourceHandle { id: format!("db-{name}"), endpoint: None })
        }
        async fn delete_database(&self, _id: &str) -> Result<(), OrchestratorError> {
            Ok(())
        }
        async fn apply_migrations(&self, _database_id: &str, _migrations: &[String]) -> Result<(), OrchestratorError> {
            Ok(())
        }
        async fn restore_database_snapshot(&self, _database_id: &str, _snapshot_id: &str) -> Result<(), OrchestratorError> {
            Ok(())
        }
        async fn push_worker(
            &self,
            domain: &str,
            _artifact_revision: &str,
            _env_vars: HashMap<String, String>,
        ) -> Result<ResourceHandle, OrchestratorError> {
            Ok(ResourceHandle { id: format!("worker-{domain}"), endpoint: None })
        }
        async fn revert_deploy_config(&self, _domain: &str, _previous_revision: &str) -> Result<(), OrchestratorError> {
            Ok(())
        }
        async fn redeploy_previous_artifact(&self, _domain: &str, _previous_revision: &str) -> Result<(), OrchestratorError> {
            Ok(())
        }
        async fn upsert_dns_record(&self, _domain: &str, _target: &str) -> Result<ResourceHandle, OrchestratorError> {
            unimplemented!()
        }
        async fn delete_dns_record(&self, _id: &str) -> Result<(), OrchestratorError> {
            Ok(())
        }
        async fn health_probe(&self, _url: &str) -> Result<HealthProbeResult, OrchestratorError> {
            Ok(HealthProbeResult::Healthy { status_code: 200, elapsed_ms: 5 })
        }
    }

    async fn build_pipeline(tmp: &std::path::Path) -> DomainPipeline {
        let upstream: Arc<dyn UpstreamApi> = Arc::new(HealthyUpstream);
        let assessment = Arc::new(AssessmentEngine::new(upstream.clone(), clodo_assessment::AssessmentCache::new(60)));
        let bundles = Arc::new(BundleGenerator::new());
        let confirmer: Arc<dyn Confirmer> = Arc::new(NonInteractiveConfirmer);
        let database = Arc::new(DatabaseOrchestrator::new(upstream.clone(), confirmer, tmp).unwrap());
        let health_checker = Arc::new(HealthChecker::new(
            upstream.clone(),
            HealthCheckConfig { initial_deadline: Duration::from_secs(2), propagation_wait: Duration::from_millis(1), max_retries: 1 },
        ));
        let production_tester = Arc::new(ProductionTester::new(upstream.clone(), tmp.join("production-tests")));
        let rollback = Arc::new(RollbackManager::new(upstream.clone(), Arc::new(NoopSecretRevoker)));
        let store = Arc::new(StateStore::open(tmp).unwrap());
        let coordinator = Arc::new(Coordinator::new());
        let metrics = Arc::new(OrchestratorMetrics::new());

        DomainPipeline::new(upstream, assessment, bundles, database, health_checker, production_tester, rollback, store, coordinator, metrics)
    }

    #[tokio::test]
    async fn deploys_a_single_healthy_domain_successfully() {
        let tmp = tempfile::tempdir().unwrap();
        let pipeline = Arc::new(build_pipeline(tmp.path()).await);
        let coordinator = Arc::new(Coordinator::new());
        let orchestrator = Orchestrator::new(pipeline, coordinator);

        let domain = Domain::new("api.example.com", Environment::Development, "portfolio");
        let options = DeployOptions { parallelism: 2, ..Default::default() };
        let result = orchestrator.deploy_single(&domain, &options).await;
        assert!(result.is_success(), "{:?}", result.outcome);
    }

    #[tokio::test]
    async fn deploys_a_full_portfolio_in_batches() {
        let tmp = tempfile::tempdir().unwrap();
        let pipeline = Arc::new(build_pipeline(tmp.path()).await);
        let coordinator = Arc::new(Coordinator::new());
        let orchestrator = Orchestrator::new(pipeline, coordinator);

        let domains: Vec<Domain> = (0..5)
            .map(|i| Domain::new(format!("d{i}.example.com"), Environment::Development, "portfolio"))
            .collect();
        let options = DeployOptions { parallelism: 2, ..Default::default() };
        let plan = orchestrator.plan_deployment(domains, &options);
        assert_eq!(plan.batches.len(), 3);

        let result = orchestrator.deploy(&plan, &options).await.unwrap();
        assert!(result.all_succeeded());
        assert_eq!(result.results.len(), 5);
        assert!(result.aborted_after_batch.is_none());
    }
}
