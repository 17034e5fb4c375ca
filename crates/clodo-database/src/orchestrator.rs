//! [`DatabaseOrchestrator`]: component J. Coordinates migrations across
//! environments, backups, and cleanup, delegating the actual upstream
//! calls to an injected [`UpstreamApi`] the same way every other
//! component in this workspace does (spec.md §1's "upstream platform's
//! HTTP API, modeled as an injectable client interface").

use crate::audit::{DatabaseAuditLog, DatabaseAuditRecord};
use crate::backup::{self, BackupManifest};
use crate::cleanup::{authorize_cleanup, CleanupMode};
use crate::error::DatabaseError;
use crate::naming::database_name;
use chrono::{DateTime, Utc};
use clodo_core::domain::Environment;
use clodo_core::traits::{Confirmer, ResourceHandle, UpstreamApi};
use std::path::PathBuf;
use std::sync::Arc;

/// Whether migrations run against the upstream's remote database or a
/// local emulator — mirrors the real migration tool's `--local`/
/// `--remote` flag (spec.md §4.J), carried here for audit/log fidelity
/// even though `UpstreamApi::apply_migrations` itself is flag-agnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationTarget {
    Local,
    Remote,
}

impl MigrationTarget {
    pub fn for_environment(environment: Environment) -> Self {
        match environment {
            Environment::Development => MigrationTarget::Local,
            Environment::Staging | Environment::Production => MigrationTarget::Remote,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MigrationTarget::Local => "local",
            MigrationTarget::Remote => "remote",
        }
    }
}

pub struct DatabaseOrchestrator {
    upstream: Arc<dyn UpstreamApi>,
    confirmer: Arc<dyn Confirmer>,
    backups_root: PathBuf,
    audit: DatabaseAuditLog,
}

impl DatabaseOrchestrator {
    pub fn new(
        upstream: Arc<dyn UpstreamApi>,
        confirmer: Arc<dyn Confirmer>,
        state_root: &std::path::Path,
    ) -> Result<Self, DatabaseError> {
        Ok(Self {
            upstream,
            confirmer,
            backups_root: state_root.join("backups"),
            audit: DatabaseAuditLog::open(&state_root.join("audit-logs"))?,
        })
    }

    pub async fn ensure_database(&self, domain: &str, environment: Environment) -> Result<ResourceHandle, DatabaseError> {
        let name = database_name(domain, environment);
        let handle = self.upstream.create_database(&name).await?;
        self.audit
            .record(DatabaseAuditRecord {
                operation: "ensure-database".to_string(),
                domain: domain.to_string(),
                environment: environment.as_str().to_string(),
                detail: serde_json::json!({ "database_id": handle.id, "database_name": name }),
                timestamp: Utc::now(),
            })
            .await?;
        Ok(handle)
    }

    /// Applies `migrations` to `database_id`. On `production`, a
    /// backup must already have been taken for this database in this
    /// call chain; callers pass it through so this method never
    /// silently skips the requirement (spec.md §4.J: "production
    /// requires a prior backup").
    pub async fn apply_migrations(
        &self,
        domain: &str,
        environment: Environment,
        database_id: &str,
        migrations: &[String],
        prior_backup: Option<&BackupManifest>,
    ) -> Result<(), DatabaseError> {
        if environment == Environment::Production && prior_backup.is_none() {
            return Err(DatabaseError::BackupRequired {
                domain_key: format!("{domain}::{}", environment.as_str()),
            });
        }

        let target = MigrationTarget::for_environment(environment);
        self.upstream.apply_migrations(database_id, migrations).await?;

        self.audit
            .record(DatabaseAuditRecord {
                operation: "apply-migrations".to_string(),
                domain: domain.to_string(),
                environment: environment.as_str().to_string(),
                detail: serde_json::json!({
                    "database_id": database_id,
                    "migration_count": migrations.len(),
                    "target": target.as_str(),
                }),
                timestamp: Utc::now(),
            })
            .await?;
        Ok(())
    }

    pub async fn backup(
        &self,
        domain: &str,
        environment: Environment,
        database_id: &str,
        database_name: &str,
        now: DateTime<Utc>,
    ) -> Result<BackupManifest, DatabaseError> {
        let manifest = backup::create_backup(&self.backups_root, domain, environment, database_id, database_name, now).await?;
        self.audit
            .record(DatabaseAuditRecord {
                operation: "backup".to_string(),
                domain: domain.to_string(),
                environment: environment.as_str().to_string(),
                detail: serde_json::json!({ "backup_id": manifest.id }),
                timestamp: now,
            })
            .await?;
        Ok(manifest)
    }

    pub async fn restore_backup(
        &self,
        domain: &str,
        environment: Environment,
        database_id: &str,
        backup_id: &str,
    ) -> Result<(), DatabaseError> {
        let manifest = backup::load_manifest(&self.backups_root, environment, backup_id).await?;
        self.upstream.restore_database_snapshot(database_id, &manifest.id).await?;
        self.audit
            .record(DatabaseAuditRecord {
                operation: "restore-backup".to_string(),
                domain: domain.to_string(),
                environment: environment.as_str().to_string(),
                detail: serde_json::json!({ "backup_id": backup_id }),
                timestamp: Utc::now(),
            })
            .await?;
        Ok(())
    }

    /// Runs one of the three cleanup modes (spec.md §4.J). `full` on
    /// `production` is gated by [`authorize_cleanup`] before any SQL
    /// reaches `UpstreamApi`.
    pub async fn cleanup(
        &self,
        domain: &str,
        environment: Environment,
        database_id: &str,
        mode: CleanupMode,
        interactive: bool,
    ) -> Result<(), DatabaseError> {
        authorize_cleanup(mode, environment, self.confirmer.as_ref(), interactive, domain)?;

        self.upstream
            .apply_migrations(database_id, &[mode.script().to_string()])
            .await?;

        self.audit
            .record(DatabaseAuditRecord {
                operation: "cleanup".to_string(),
                domain: domain.to_string(),
                environment: environment.as_str().to_string(),
                detail: serde_json::json!({ "mode": mode.as_str() }),
                timestamp: Utc::now(),
            })
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use clodo_core::traits::{DnsConflictStatus, HealthProbeResult, NonInteractiveConfirmer, OwnershipStatus, TokenVerification};
    use clodo_core::OrchestratorError;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct FakeUpstream {
        migrations_applied: AtomicUsize,
    }

    #[async_trait]
    impl UpstreamApi for FakeUpstream {
        async fn verify_token(&self, _token: &str) -> Result<TokenVerification, OrchestratorError> {
            unimplemented!()
        }
        async fn check_domain_ownership(&self, _domain: &str) -> Result<OwnershipStatus, OrchestratorError> {
            unimplemented!()
        }
        async fn check_dns_conflict(&self, _domain: &str) -> Result<DnsConflictStatus, OrchestratorError> {
            unimplemented!()
        }
        async fn create_database(&self, name: &str) -> Result<ResourceHandle, OrchestratorError> {
            Ok(ResourceHandle { id: format!("db-{name}"), endpoint: None })
        }
        async fn delete_database(&self, _id: &str) -> Result<(), OrchestratorError> {
            Ok(())
        }
        async fn apply_migrations(&self, _database_id: &str, _migrations: &[String]) -> Result<(), OrchestratorError> {
            self.migrations_applied.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
        async fn restore_database_snapshot(&self, _database_id: &str, _snapshot_id: &str) -> Result<(), OrchestratorError> {
            Ok(())
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
            unimplemented!()
        }
    }

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z").unwrap().with_timezone(&Utc)
    }

    #[tokio::test]
    async fn migration_without_backup_is_refused_on_production() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator = DatabaseOrchestrator::new(Arc::new(FakeUpstream::default()), Arc::new(NonInteractiveConfirmer), dir.path()).unwrap();
        let err = orchestrator
            .apply_migrations("api.example.com", Environment::Production, "db-1", &["create table t(id int);".into()], None)
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::BackupRequired { .. }));
    }

    #[tokio::test]
    async fn migration_with_prior_backup_succeeds_on_production() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator = DatabaseOrchestrator::new(Arc::new(FakeUpstream::default()), Arc::new(NonInteractiveConfirmer), dir.path()).unwrap();
        let backup = orchestrator.backup("api.example.com", Environment::Production, "db-1", "api-production", now()).await.unwrap();
        orchestrator
            .apply_migrations("api.example.com", Environment::Production, "db-1", &["create table t(id int);".into()], Some(&backup))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn development_migration_never_requires_a_backup() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator = DatabaseOrchestrator::new(Arc::new(FakeUpstream::default()), Arc::new(NonInteractiveConfirmer), dir.path()).unwrap();
        orchestrator
            .apply_migrations("api.example.com", Environment::Development, "db-1", &["create table t(id int);".into()], None)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn full_cleanup_refused_non_interactively_on_production() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator = DatabaseOrchestrator::new(Arc::new(FakeUpstream::default()), Arc::new(NonInteractiveConfirmer), dir.path()).unwrap();
        let err = orchestrator
            .cleanup("api.example.com", Environment::Production, "db-1", CleanupMode::Full, false)
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::NonInteractiveFullCleanup));
    }
}
