//! Load sub-tester: fires a small burst of concurrent probes at each
//! endpoint and checks the aggregate pass rate, a cheap proxy for
//! surviving a handful of simultaneous requests.

use crate::subtester::{CheckResult, ProductionSubTester, SubTestReport, TestContext};
use async_trait::async_trait;
use clodo_core::traits::UpstreamApi;
use std::sync::Arc;
use std::time::Instant;

const BURST_SIZE: usize = 5;

pub struct LoadTester {
    upstream: Arc<dyn UpstreamApi>,
}

impl LoadTester {
    pub fn new(upstream: Arc<dyn UpstreamApi>) -> Self {
        Self { upstream }
    }
}

#[async_trait]
impl ProductionSubTester for LoadTester {
    fn name(&self) -> &'static str {
        "load"
    }

    async fn run(&self, ctx: &TestContext) -> SubTestReport {
        let mut report = SubTestReport::default();
        for endpoint in &ctx.endpoints {
            let started = Instant::now();
            let mut handles = Vec::with_capacity(BURST_SIZE);
            for _ in 0..BURST_SIZE {
                let upstream = self.upstream.clone();
                let endpoint = endpoint.clone();
                handles.push(tokio::spawn(async move { upstream.health_probe(&endpoint).await }));
            }
            let mut healthy = 0usize;
            for handle in handles {
                if let Ok(Ok(probe)) = handle.await {
                    if probe.is_healthy() {
                        healthy += 1;
                    }
                }
            }
            let elapsed_ms = started.elapsed().as_millis() as u64;
            let passed = healthy == BURST_SIZE;
            report.record(CheckResult {
                name: format!("burst:{endpoint}"),
                passed,
                elapsed_ms,
                detail: (!passed).then(|| format!("{healthy}/{BURST_SIZE} concurrent probes healthy")),
            });
        }
        report
    }
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
    use std::collections::HashMap;

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
            Ok(HealthProbeResult::Healthy { status_code: 200, elapsed_ms: 1 })
        }
    }

    #[tokio::test]
    async fn burst_of_healthy_probes_passes() {
        let tester = LoadTester::new(Arc::new(AlwaysHealthy));
        let ctx = TestContext {
            domain: "example.com".to_string(),
            endpoints: vec!["https://example.com/health".to_string()],
            budgets: TestBudgets::default(),
        };
        let report = tester.run(&ctx).await;
        assert!(report.all_passed());
        assert_eq!(report.passed, 1);
    }
}
