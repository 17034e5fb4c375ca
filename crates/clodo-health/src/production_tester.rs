//! Aggregates the registered sub-testers into one run and persists the
//! result as a JSON artifact plus a metrics file keyed by timestamp
//! (spec.md §4.G).

use crate::error::HealthError;
use crate::subtester::{ProductionSubTester, SubTestReport, TestContext};
use crate::testers::{ApiTester, AuthTester, DbTester, LoadTester, PerformanceTester};
use chrono::{DateTime, Utc};
use clodo_core::traits::UpstreamApi;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateReport {
    pub timestamp: DateTime<Utc>,
    pub domain: String,
    pub total_passed: u32,
    pub total_failed: u32,
    pub reports: HashMap<String, SubTestReport>,
}

impl AggregateReport {
    pub fn all_passed(&self) -> bool {
        self.total_failed == 0
    }
}

pub struct ProductionTester {
    registry: HashMap<&'static str, Box<dyn ProductionSubTester>>,
    artifacts_root: PathBuf,
}

impl ProductionTester {
    /// Builds the fixed registry up front: `api`, `auth`, `performance`,
    /// `db`, `load`. No dynamic loading — each sub-tester is a capability
    /// interface resolved at construction (DESIGN NOTES §9).
    pub fn new(upstream: Arc<dyn UpstreamApi>, artifacts_root: impl Into<PathBuf>) -> Self {
        let mut registry: HashMap<&'static str, Box<dyn ProductionSubTester>> = HashMap::new();
        registry.insert("api", Box::new(ApiTester::new(upstream.clone())));
        registry.insert("auth", Box::new(AuthTester::new(upstream.clone())));
        registry.insert("performance", Box::new(PerformanceTester::new(upstream.clone())));
        registry.insert("db", Box::new(DbTester::new(upstream.clone())));
        registry.insert("load", Box::new(LoadTester::new(upstream)));
        Self { registry, artifacts_root: artifacts_root.into() }
    }

    pub fn sub_tester(&self, kind: &str) -> Result<&dyn ProductionSubTester, HealthError> {
        self.registry
            .get(kind)
            .map(|t| t.as_ref())
            .ok_or_else(|| HealthError::UnknownSubTester(kind.to_string()))
    }

    /// Runs every registered sub-tester against `ctx` and aggregates
    /// the results. Sub-testers run independently; one failing does not
    /// stop the others from running.
    pub async fn run_all(&self, ctx: &TestContext) -> AggregateReport {
        let mut reports = HashMap::with_capacity(self.registry.len());
        let mut total_passed = 0;
        let mut total_failed = 0;
        for (name, tester) in &self.registry {
            let report = tester.run(ctx).await;
            total_passed += report.passed;
            total_failed += report.failed;
            reports.insert((*name).to_string(), report);
        }
        AggregateReport { timestamp: Utc::now(), domain: ctx.domain.clone(), total_passed, total_failed, reports }
    }

    /// Writes `<artifacts_root>/<domain>/<timestamp>.json` and a
    /// companion `<timestamp>.metrics.json` summary file.
    pub async fn persist(&self, report: &AggregateReport) -> Result<PathBuf, HealthError> {
        let dir: PathBuf = self.artifacts_root.join(&report.domain);
        tokio::fs::create_dir_all(&dir).await?;
        let stamp = report.timestamp.format("%Y%m%dT%H%M%S%.3fZ").to_string();

        let artifact_path = dir.join(format!("{stamp}.json"));
        let body = serde_json::to_vec_pretty(report)?;
        tokio::fs::write(&artifact_path, body).await?;

        let metrics = serde_json::json!({
            "domain": report.domain,
            "timestamp": report.timestamp,
            "passed": report.total_passed,
            "failed": report.total_failed,
        });
        let metrics_path: PathBuf = dir.join(format!("{stamp}.metrics.json"));
        tokio::fs::write(&metrics_path, serde_json::to_vec_pretty(&metrics)?).await?;

        Ok(artifact_path)
    }
}

pub fn artifacts_root(state_root: impl AsRef<Path>) -> PathBuf {
    state_root.as_ref().join("production-tests")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subtester::TestBudgets;
    use async_trait::async_trait;
    use clodo_core::traits::{
        DnsConflictStatus, HealthProbeResult, OwnershipStatus, ResourceHandle, TokenVerification,
    };
    use clodo_core::OrchestratorError;

    struct AlwaysHealthy;

    #[async_trait]
    impl UpstreamApi for AlwaysHealthy {
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
            _env_vars: std::collections::HashMap<String, String>,
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
            Ok(HealthProbeResult::Healthy { status_code: 200, elapsed_ms: 1 })
        }
    }

    #[tokio::test]
    async fn run_all_aggregates_every_registered_tester() {
        let tmp = tempfile::tempdir().unwrap();
        let tester = ProductionTester::new(Arc::new(AlwaysHealthy), tmp.path().to_path_buf());
        let ctx = TestContext {
            domain: "example.com".to_string(),
            endpoints: vec!["https://example.com/health".to_string()],
            budgets: TestBudgets::default(),
        };
        let report = tester.run_all(&ctx).await;
        assert_eq!(report.reports.len(), 5);
        assert!(report.all_passed());
    }

    #[tokio::test]
    async fn persist_writes_artifact_and_metrics_files() {
        let tmp = tempfile::tempdir().unwrap();
        let tester = ProductionTester::new(Arc::new(AlwaysHealthy), tmp.path().to_path_buf());
        let ctx = TestContext {
            domain: "example.com".to_string(),
            endpoints: vec!["https://example.com/health".to_string()],
            budgets: TestBudgets::default(),
        };
        let report = tester.run_all(&ctx).await;
        let artifact_path = tester.persist(&report).await.unwrap();
        assert!(artifact_path.exists());
        let stem = artifact_path.file_stem().unwrap().to_str().unwrap().to_string();
        let metrics_path = artifact_path.with_file_name(format!("{stem}.metrics.json"));
        assert!(metrics_path.exists());
    }

    #[tokio::test]
    async fn unknown_sub_tester_kind_errors() {
        let tmp = tempfile::tempdir().unwrap();
        let tester = ProductionTester::new(Arc::new(AlwaysHealthy), tmp.path().to_path_buf());
        assert!(tester.sub_tester("nonexistent").is_err());
    }
}
