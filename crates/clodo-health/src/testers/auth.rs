//! Auth-flow sub-tester: exercises the domain's health endpoint as a
//! stand-in auth round trip and checks it completes within the auth
//! flow budget (spec.md §4.G).

use crate::subtester::{CheckResult, ProductionSubTester, SubTestReport, TestContext};
use async_trait::async_trait;
use clodo_core::traits::UpstreamApi;
use std::sync::Arc;
use std::time::Instant;

pub struct AuthTester {
    upstream: Arc<dyn UpstreamApi>,
}

impl AuthTester {
    pub fn new(upstream: Arc<dyn UpstreamApi>) -> Self {
        Self { upstream }
    }
}

#[async_trait]
impl ProductionSubTester for AuthTester {
    fn name(&self) -> &'static str {
        "auth"
    }

    async fn run(&self, ctx: &TestContext) -> SubTestReport {
        let mut report = SubTestReport::default();
        let url = format!("https://{}/health", ctx.domain);
        let started = Instant::now();
        let outcome = self.upstream.health_probe(&url).await;
        let elapsed = started.elapsed();

        let passed = outcome.map(|p| p.is_healthy()).unwrap_or(false) && elapsed <= ctx.budgets.auth_flow_threshold;
        report.record(CheckResult {
            name: "auth-round-trip".to_string(),
            passed,
            elapsed_ms: elapsed.as_millis() as u64,
            detail: (!passed).then(|| "auth round trip failed or exceeded budget".to_string()),
        });
        report
    }
}
