//! Database sub-tester: confirms the deployed service's data layer is
//! reachable by probing a `/health/db` style endpoint.

use crate::subtester::{CheckResult, ProductionSubTester, SubTestReport, TestContext};
use async_trait::async_trait;
use clodo_core::traits::UpstreamApi;
use std::sync::Arc;
use std::time::Instant;

pub struct DbTester {
    upstream: Arc<dyn UpstreamApi>,
}

impl DbTester {
    pub fn new(upstream: Arc<dyn UpstreamApi>) -> Self {
        Self { upstream }
    }
}

#[async_trait]
impl ProductionSubTester for DbTester {
    fn name(&self) -> &'static str {
        "db"
    }

    async fn run(&self, ctx: &TestContext) -> SubTestReport {
        let mut report = SubTestReport::default();
        let url = format!("https://{}/health/db", ctx.domain);
        let started = Instant::now();
        let outcome = self.upstream.health_probe(&url).await;
        let elapsed = started.elapsed();

        let passed = outcome.map(|p| p.is_healthy()).unwrap_or(false) && elapsed <= ctx.budgets.health_check_threshold;
        report.record(CheckResult {
            name: "db-reachability".to_string(),
            passed,
            elapsed_ms: elapsed.as_millis() as u64,
            detail: (!passed).then(|| "database health endpoint unreachable or unhealthy".to_string()),
        });
        report
    }
}
