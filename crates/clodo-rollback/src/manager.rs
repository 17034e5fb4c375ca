//! Walks a deployment's registered rollback actions in descending
//! index order and replays each inverse (spec.md §4.D, invariant 1).

use crate::error::RollbackError;
use crate::executor::execute_inverse;
use crate::report::{ActionOutcome, RollbackReport};
use crate::secret_revoker::SecretRevoker;
use clodo_core::deployment::{Deployment, RollbackActionKind};
use clodo_core::traits::UpstreamApi;
use clodo_store::event::EventKind;
use clodo_store::StateStore;
use serde::Deserialize;
use std::sync::Arc;

pub struct RollbackManager {
    upstream: Arc<dyn UpstreamApi>,
    secret_revoker: Arc<dyn SecretRevoker>,
}

#[derive(Deserialize)]
struct PersistedAction {
    kind: RollbackActionKind,
    detail: serde_json::Value,
}

impl RollbackManager {
    pub fn new(upstream: Arc<dyn UpstreamApi>, secret_revoker: Arc<dyn SecretRevoker>) -> Self {
        Self { upstream, secret_revoker }
    }

    /// Replays every rollback action registered against `deployment`,
    /// in strictly descending phase index order. Continues past a
    /// failed inverse so the report reflects exactly which actions
    /// need manual attention rather than aborting at the first one.
    pub async fn rollback_deployment(&self, deployment: &Deployment) -> RollbackReport {
        let mut report = RollbackReport::default();
        for (_, action) in deployment.rollback_actions_in_reverse_order() {
            let outcome = self.apply(action.kind, &action.detail).await;
            report.record(outcome);
        }
        report
    }

    /// Reconstructs rollback actions from the durable event log for
    /// deployments that are no longer held in memory (e.g. resuming a
    /// rollback after a restart, `orchestrate rollback --to-version`).
    /// The store returns actions in ascending recorded order; the
    /// manager reverses them before replay.
    pub async fn rollback_from_store(
        &self,
        store: &StateStore,
        deployment_id: &str,
    ) -> Result<RollbackReport, RollbackError> {
        let records = store.rollback_actions_for(deployment_id).await?;
        if records.is_empty() {
            return Err(RollbackError::UnknownDeployment(deployment_id.to_string()));
        }

        let mut report = RollbackReport::default();
        for record in records.into_iter().rev() {
            debug_assert_eq!(record.kind, EventKind::RollbackRegistered);
            let persisted: PersistedAction = serde_json::from_value(record.detail)?;
            let outcome = self.apply(persisted.kind, &persisted.detail).await;
            report.record(outcome);
        }
        Ok(report)
    }

    async fn apply(&self, kind: RollbackActionKind, detail: &serde_json::Value) -> ActionOutcome {
        match execute_inverse(kind, detail, &self.upstream, &self.secret_revoker).await {
            Ok(()) => ActionOutcome { kind, succeeded: true, error: None },
            Err(err) => ActionOutcome { kind, succeeded: false, error: Some(err.to_string()) },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secret_revoker::NoopSecretRevoker;
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use clodo_core::deployment::{DeploymentId, Outcome, Phase, RollbackAction};
    use clodo_core::domain::Environment;
    use clodo_core::traits::{DnsConflictStatus, HealthProbeResult, OwnershipStatus, ResourceHandle, TokenVerification};
    use clodo_core::OrchestratorError;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z").unwrap().with_timezone(&Utc)
    }

    struct CountingUpstream {
        delete_db_calls: AtomicUsize,
        revert_calls: AtomicUsize,
        fail_revert: bool,
    }

    #[async_trait]
    impl UpstreamApi for CountingUpstream {
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
            self.delete_db_calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
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
            self.revert_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_revert {
                Err(OrchestratorError::Transient("upstream unavailable".into()))
            } else {
                Ok(())
            }
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
            unimplemented!()
        }
    }

    fn deployment_with_actions() -> Deployment {
        let mut deployment = Deployment::new(
            DeploymentId::parse("deploy-test").unwrap(),
            "api.example.com",
            Environment::Production,
            "rev-1",
            "tester",
            "token",
            now(),
        );
        deployment.begin_phase(Phase::Prepare, now()).unwrap();
        deployment
            .register_rollback_action(RollbackAction::new(
                RollbackActionKind::DeleteDb,
                serde_json::json!({"database_id": "db-1"}),
                now(),
            ))
            .unwrap();
        deployment.finish_current_phase(Outcome::Ok, now(), None).unwrap();

        deployment.begin_phase(Phase::Deploy, now()).unwrap();
        deployment
            .register_rollback_action(RollbackAction::new(
                RollbackActionKind::RevertDeployConfig,
                serde_json::json!({"domain": "api.example.com", "previous_revision": "rev-0"}),
                now(),
            ))
            .unwrap();
        deployment.finish_current_phase(Outcome::Ok, now(), None).unwrap();
        deployment
    }

    #[tokio::test]
    async fn replays_actions_in_descending_index_order() {
        let upstream = Arc::new(CountingUpstream {
            delete_db_calls: AtomicUsize::new(0),
            revert_calls: AtomicUsize::new(0),
            fail_revert: false,
        });
        let manager = RollbackManager::new(upstream.clone(), Arc::new(NoopSecretRevoker));
        let deployment = deployment_with_actions();

        let report = manager.rollback_deployment(&deployment).await;
        assert!(report.all_succeeded());
        assert_eq!(report.actions[0].kind, RollbackActionKind::RevertDeployConfig);
        assert_eq!(report.actions[1].kind, RollbackActionKind::DeleteDb);
        assert_eq!(upstream.delete_db_calls.load(Ordering::SeqCst), 1);
        assert_eq!(upstream.revert_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn partial_failure_is_reported_not_swallowed() {
        let upstream = Arc::new(CountingUpstream {
            delete_db_calls: AtomicUsize::new(0),
            revert_calls: AtomicUsize::new(0),
            fail_revert: true,
        });
        let manager = RollbackManager::new(upstream, Arc::new(NoopSecretRevoker));
        let deployment = deployment_with_actions();

        let report = manager.rollback_deployment(&deployment).await;
        assert!(report.is_partial_recovery());
        assert!(!report.all_succeeded());
    }

    #[tokio::test]
    async fn rollback_from_store_reverses_recorded_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::open(dir.path()).unwrap();
        store
            .record_rollback_registered(
                "deploy-1",
                "api.example.com",
                "production",
                Phase::Prepare,
                serde_json::json!({"kind": "delete-db", "detail": {"database_id": "db-1"}}),
                now(),
            )
            .await
            .unwrap();
        store
            .record_rollback_registered(
                "deploy-1",
                "api.example.com",
                "production",
                Phase::Deploy,
                serde_json::json!({
                    "kind": "revert-deploy-config",
                    "detail": {"domain": "api.example.com", "previous_revision": "rev-0"}
                }),
                now(),
            )
            .await
            .unwrap();

        let upstream = Arc::new(CountingUpstream {
            delete_db_calls: AtomicUsize::new(0),
            revert_calls: AtomicUsize::new(0),
            fail_revert: false,
        });
        let manager = RollbackManager::new(upstream, Arc::new(NoopSecretRevoker));
        let report = manager.rollback_from_store(&store, "deploy-1").await.unwrap();

        assert!(report.all_succeeded());
        assert_eq!(report.actions[0].kind, RollbackActionKind::RevertDeployConfig);
        assert_eq!(report.actions[1].kind, RollbackActionKind::DeleteDb);
    }

    #[tokio::test]
    async fn unknown_deployment_id_errors() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::open(dir.path()).unwrap();
        let manager = RollbackManager::new(
            Arc::new(CountingUpstream {
                delete_db_calls: AtomicUsize::new(0),
                revert_calls: AtomicUsize::new(0),
                fail_revert: false,
            }),
            Arc::new(NoopSecretRevoker),
        );
        let err = manager.rollback_from_store(&store, "nonexistent").await.unwrap_err();
        assert!(matches!(err, RollbackError::UnknownDeployment(_)));
    }
}
