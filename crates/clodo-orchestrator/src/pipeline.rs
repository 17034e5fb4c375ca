//! The per-domain `validate -> prepare -> deploy -> verify ->
//! (rollback)` pipeline (spec.md §4.B). One [`DomainPipeline`] instance
//! is shared across every domain in a run; `run` is safe to call
//! concurrently for distinct domains.

use crate::error::OrchestratorRuntimeError;
use crate::options::DeployOptions;
use crate::result::{DomainOutcome, DomainResult};
use chrono::Utc;
use clodo_assessment::AssessmentEngine;
use clodo_core::deployment::{Deployment, DeploymentId, Outcome, Phase, RollbackAction, RollbackActionKind};
use clodo_core::domain::Domain;
use clodo_core::metrics::OrchestratorMetrics;
use clodo_core::traits::UpstreamApi;
use clodo_coordinator::Coordinator;
use clodo_database::DatabaseOrchestrator;
use clodo_health::{HealthCheckConfig, HealthChecker, ProductionTester, TestBudgets, TestContext};
use clodo_rollback::RollbackManager;
use clodo_secrets::BundleGenerator;
use clodo_store::StateStore;
use std::sync::Arc;
use tracing::{info, warn};

pub struct DomainPipeline {
    upstream: Arc<dyn UpstreamApi>,
    assessment: Arc<AssessmentEngine>,
    bundles: Arc<BundleGenerator>,
    database: Arc<DatabaseOrchestrator>,
    health_checker: Arc<HealthChecker>,
    production_tester: Arc<ProductionTester>,
    rollback: Arc<RollbackManager>,
    store: Arc<StateStore>,
    coordinator: Arc<Coordinator>,
    metrics: Arc<OrchestratorMetrics>,
}

impl DomainPipeline {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        upstream: Arc<dyn UpstreamApi>,
        assessment: Arc<AssessmentEngine>,
        bundles: Arc<BundleGenerator>,
        database: Arc<DatabaseOrchestrator>,
        health_checker: Arc<HealthChecker>,
        production_tester: Arc<ProductionTester>,
        rollback: Arc<RollbackManager>,
        store: Arc<StateStore>,
        coordinator: Arc<Coordinator>,
        metrics: Arc<OrchestratorMetrics>,
    ) -> Self {
        Self {
            upstream,
            assessment,
            bundles,
            database,
            health_checker,
            production_tester,
            rollback,
            store,
            coordinator,
            metrics,
        }
    }

    async fn begin(&self, deployment: &mut Deployment, phase: Phase) -> Result<(), OrchestratorRuntimeError> {
        let now = Utc::now();
        deployment.begin_phase(phase, now)?;
        self.metrics.record_phase_start();
        self.store
            .record_phase_start(deployment.id.as_str(), &deployment.domain, deployment.environment.as_str(), phase, now)
            .await?;
        Ok(())
    }

    async fn finish(
        &self,
        deployment: &mut Deployment,
        phase: Phase,
        outcome: Outcome,
        error: Option<String>,
    ) -> Result<(), OrchestratorRuntimeError> {
        let now = Utc::now();
        deployment.finish_current_phase(outcome, now, error.clone())?;
        self.metrics.record_phase_outcome(outcome == Outcome::Ok);
        self.store
            .record_phase_end(deployment.id.as_str(), &deployment.domain, deployment.environment.as_str(), phase, outcome, now)
            .await?;
        if let Some(message) = error {
            self.store
                .record_error(deployment.id.as_str(), &deployment.domain, deployment.environment.as_str(), Some(phase), &message, now)
                .await?;
        }
        Ok(())
    }

    async fn register_rollback(
        &self,
        deployment: &mut Deployment,
        kind: RollbackActionKind,
        detail: serde_json::Value,
    ) -> Result<(), OrchestratorRuntimeError> {
        let now = Utc::now();
        deployment.register_rollback_action(RollbackAction::new(kind, detail.clone(), now))?;
        self.store
            .record_rollback_registered(
                deployment.id.as_str(),
                &deployment.domain,
                deployment.environment.as_str(),
                deployment.current_phase().map(|p| p.phase).unwrap_or(Phase::Prepare),
                serde_json::json!({ "kind": kind, "detail": detail }),
                now,
            )
            .await?;
        Ok(())
    }

    async fn run_rollback(&self, deployment: &Deployment) -> clodo_rollback::RollbackReport {
        let report = self.rollback.rollback_deployment(deployment).await;
        for action in &report.actions {
            self.metrics.record_rollback_action();
            if !action.succeeded {
                warn!(domain = %deployment.domain, kind = ?action.kind, "rollback action failed");
            }
        }
        report
    }

    /// Runs the full pipeline for one domain, returning its
    /// [`DomainResult`] regardless of outcome — failures are reported
    /// as data, never as a propagated error (DESIGN NOTES §9). Holds
    /// the exclusive per-`(domain, env)` lock (spec.md §3/§5) from
    /// `prepare` through `verify` or rollback completion, whichever
    /// comes last, so only one deployment is ever active for a given
    /// key at a time.
    pub async fn run(&self, domain: &Domain, options: &DeployOptions) -> DomainResult {
        let now = Utc::now();
        let deployment_id = DeploymentId::new_at(now);
        let mut deployment = Deployment::new(
            deployment_id.clone(),
            domain.name.clone(),
            domain.environment,
            options.artifact_revision.clone(),
            options.user.clone(),
            options.audit_token.clone(),
            now,
        );

        let mut domain_lock: Option<tokio::sync::OwnedMutexGuard<()>> = None;
        let result = self.run_inner(domain, options, &mut deployment, &mut domain_lock).await;
        match result {
            Ok(verify_report) => {
                drop(domain_lock);
                DomainResult {
                    domain: domain.name.clone(),
                    environment: domain.environment.as_str().to_string(),
                    deployment_id: deployment_id.to_string(),
                    outcome: DomainOutcome::Success { verify_report },
                }
            }
            Err((phase, err)) => {
                let message = err.to_string();
                if options.rollback_on_error {
                    let rollback = self.run_rollback(&deployment).await;
                    drop(domain_lock);
                    DomainResult {
                        domain: domain.name.clone(),
                        environment: domain.environment.as_str().to_string(),
                        deployment_id: deployment_id.to_string(),
                        outcome: DomainOutcome::RolledBack { phase, error: message, rollback },
                    }
                } else {
                    drop(domain_lock);
                    DomainResult {
                        domain: domain.name.clone(),
                        environment: domain.environment.as_str().to_string(),
                        deployment_id: deployment_id.to_string(),
                        outcome: DomainOutcome::Failed { phase, error: message },
                    }
                }
            }
        }
    }

    async fn run_inner(
        &self,
        domain: &Domain,
        options: &DeployOptions,
        deployment: &mut Deployment,
        domain_lock: &mut Option<tokio::sync::OwnedMutexGuard<()>>,
    ) -> Result<clodo_health::AggregateReport, (Phase, OrchestratorRuntimeError)> {
        // validate
        self.begin(deployment, Phase::Validate).await.map_err(|e| (Phase::Validate, e))?;
        let assessment = self
            .assessment
            .assess(&options.service_path, options.user_inputs.clone(), false)
            .await
            .map_err(OrchestratorRuntimeError::from);
        let assessment = match assessment {
            Ok(a) => a,
            Err(e) => {
                let _ = self.finish(deployment, Phase::Validate, Outcome::Failed, Some(e.to_string())).await;
                return Err((Phase::Validate, e));
            }
        };
        if !assessment.is_deployable() && !options.ignore_blocked {
            let err = OrchestratorRuntimeError::Blocked { domain: domain.name.clone() };
            let _ = self.finish(deployment, Phase::Validate, Outcome::Failed, Some(err.to_string())).await;
            return Err((Phase::Validate, err));
        }
        self.finish(deployment, Phase::Validate, Outcome::Ok, None).await.map_err(|e| (Phase::Validate, e))?;

        // prepare: acquire the exclusive per-(domain, env) lock before
        // recording any preimage, so no other deployment for this key
        // can run concurrently until this one reaches verify/rollback.
        self.begin(deployment, Phase::Prepare).await.map_err(|e| (Phase::Prepare, e))?;
        *domain_lock = Some(self.store.domain_lock(&domain.key()).lock_owned().await);
        let session_token = self.coordinator.get("session-token");
        info!(domain = %domain.name, session_token = ?session_token, "prepared domain pipeline");
        self.finish(deployment, Phase::Prepare, Outcome::Ok, None).await.map_err(|e| (Phase::Prepare, e))?;

        // deploy
        self.begin(deployment, Phase::Deploy).await.map_err(|e| (Phase::Deploy, e))?;
        if let Err(e) = self.run_deploy_steps(domain, options, deployment).await {
            let _ = self.finish(deployment, Phase::Deploy, Outcome::Failed, Some(e.to_string())).await;
            return Err((Phase::Deploy, e));
        }
        self.finish(deployment, Phase::Deploy, Outcome::Ok, None).await.map_err(|e| (Phase::Deploy, e))?;

        // verify
        self.begin(deployment, Phase::Verify).await.map_err(|e| (Phase::Verify, e))?;
        let endpoints: Vec<String> = assessment
            .manifest
            .endpoints
            .iter()
            .map(|path| format!("https://{}{path}", domain.name))
            .collect();

        let health_outcomes = match self.health_checker.check_service(&endpoints).await {
            Ok(outcomes) => outcomes,
            Err(e) => {
                let e = OrchestratorRuntimeError::from(e);
                let _ = self.finish(deployment, Phase::Verify, Outcome::Failed, Some(e.to_string())).await;
                return Err((Phase::Verify, e));
            }
        };
        if !clodo_health::all_healthy(&health_outcomes) {
            let err = OrchestratorRuntimeError::Upstream(clodo_core::OrchestratorError::Transient(
                "one or more endpoints failed health verification".to_string(),
            ));
            let _ = self.finish(deployment, Phase::Verify, Outcome::Failed, Some(err.to_string())).await;
            return Err((Phase::Verify, err));
        }

        let ctx = TestContext { domain: domain.name.clone(), endpoints, budgets: TestBudgets::default() };
        let report = self.production_tester.run_all(&ctx).await;
        if let Err(e) = self.production_tester.persist(&report).await {
            warn!(domain = %domain.name, error = %e, "failed to persist production test artifact");
        }
        if !report.all_passed() {
            let err = OrchestratorRuntimeError::Upstream(clodo_core::OrchestratorError::Transient(
                "production test suite reported failures".to_string(),
            ));
            let _ = self.finish(deployment, Phase::Verify, Outcome::Failed, Some(err.to_string())).await;
            return Err((Phase::Verify, err));
        }
        self.finish(deployment, Phase::Verify, Outcome::Ok, None).await.map_err(|e| (Phase::Verify, e))?;

        Ok(report)
    }

    async fn run_deploy_steps(
        &self,
        domain: &Domain,
        options: &DeployOptions,
        deployment: &mut Deployment,
    ) -> Result<(), OrchestratorRuntimeError> {
        // (a) reconcile deployment config: record the inverse before
        // pushing so a later failure can always revert to the artifact
        // revision that was live before this run started.
        let previous_revision = self
            .store
            .latest_successful_deployment(&domain.key())
            .await
            .unwrap_or_else(|| "none".to_string());
        self.register_rollback(
            deployment,
            RollbackActionKind::RevertDeployConfig,
            serde_json::json!({ "domain": domain.name, "previous_revision": previous_revision }),
        )
        .await?;

        // (b) create/verify database: the deterministic name is known
        // before the database exists, so the inverse is registered
        // against it ahead of the mutation (spec.md §4.B step 3) —
        // waiting for `handle.id` would leave a crash between create
        // and register with no recorded preimage (invariant 1).
        let database_name = clodo_database::database_name(&domain.name, domain.environment);
        self.register_rollback(
            deployment,
            RollbackActionKind::DeleteDb,
            serde_json::json!({ "database_id": database_name }),
        )
        .await?;
        let handle = self.database.ensure_database(&domain.name, domain.environment).await?;

        // (c) apply migrations; production requires a prior backup.
        let prior_backup = if domain.environment == clodo_core::domain::Environment::Production {
            Some(
                self.database
                    .backup(&domain.name, domain.environment, &handle.id, &database_name, Utc::now())
                    .await?,
            )
        } else {
            None
        };
        self.database
            .apply_migrations(&domain.name, domain.environment, &handle.id, &options.migrations, prior_backup.as_ref())
            .await?;

        // (d) materialize secrets
        let bundle = self.bundles.generate_domain_specific(domain, domain.environment, true);
        self.register_rollback(
            deployment,
            RollbackActionKind::DeleteSecret,
            serde_json::json!({ "domain": domain.name, "environment": domain.environment.as_str() }),
        )
        .await?;
        let env_vars: std::collections::HashMap<String, String> = bundle.values.clone().into_iter().collect();

        // (e) push the worker artifact: domain and previous revision
        // are both known ahead of the push, so the inverse is
        // registered first, same as steps (a)/(b)/(d).
        self.register_rollback(
            deployment,
            RollbackActionKind::RedeployPreviousArtifact,
            serde_json::json!({ "domain": domain.name, "previous_revision": previous_revision }),
        )
        .await?;
        self.upstream.push_worker(&domain.name, &options.artifact_revision, env_vars).await?;

        Ok(())
    }
}

pub fn health_checker_for(upstream: Arc<dyn UpstreamApi>) -> HealthChecker {
    HealthChecker::new(upstream, HealthCheckConfig::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::DeployOptions;
    use crate::result::DomainOutcome;
    use async_trait::async_trait;
    use clodo_core::domain::{Domain, Environment};
    use clodo_core::metrics::OrchestratorMetrics;
    use clodo_core::traits::{
        Confirmer, DnsConflictStatus, HealthProbeResult, NonInteractiveConfirmer, OwnershipStatus, ResourceHandle,
        TokenVerification, UpstreamApi,
    };
    use clodo_core::OrchestratorError;
    use clodo_rollback::NoopSecretRevoker;
    use std::collections::HashMap;
    use std::time::Duration;

    /// Fails exactly at the migration step, as scenario 5 of spec.md
    /// §8 requires — a database is created first, so its rollback
    /// action is registered before the failing step runs, but the
    /// worker is never pushed and so has no rollback action either.
    struct FailsAtMigration;

    #[async_trait]
    impl UpstreamApi for FailsAtMigration {
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
            Err(OrchestratorError::Invariant("migration tool reported a schema conflict".to_string()))
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

    async fn build_pipeline(upstream: Arc<dyn UpstreamApi>, tmp: &std::path::Path) -> DomainPipeline {
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
    async fn migration_failure_rolls_back_only_the_steps_that_ran() {
        let tmp = tempfile::tempdir().unwrap();
        let upstream: Arc<dyn UpstreamApi> = Arc::new(FailsAtMigration);
        let pipeline = build_pipeline(upstream, tmp.path()).await;

        let domain = Domain::new("api.example.com", Environment::Development, "portfolio");
        let options = DeployOptions { rollback_on_error: true, ..Default::default() };
        let result = pipeline.run(&domain, &options).await;

        match result.outcome {
            DomainOutcome::RolledBack { phase, rollback, .. } => {
                assert_eq!(phase, Phase::Deploy);
                // Only the database was created before the migration step
                // failed, so the replayed inverses are exactly delete-db
                // then revert-deploy-config (registered first, replayed
                // last) — no delete-secret or redeploy-previous-artifact,
                // since those steps never ran.
                let kinds: Vec<_> = rollback.actions.iter().map(|a| a.kind).collect();
                assert_eq!(kinds, vec![RollbackActionKind::DeleteDb, RollbackActionKind::RevertDeployConfig]);
                assert!(rollback.all_succeeded());
                assert!(!rollback.is_partial_recovery());
            }
            other => panic!("expected a rolled-back outcome, got {other:?}"),
        }
    }
}
