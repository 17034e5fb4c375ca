//! Performance sub-tester: response-time budget compliance per
//! endpoint (spec.md §4.G: `responseTimeThreshold`).

use crate::subtester::{CheckResult, ProductionSubTester, SubTestReport, TestContext};
use async_trait::async_trait;
use clodo_core::traits::UpstreamApi;
use std::sync::Arc;
use std::time::Instant;

pub struct PerformanceTester {
    upstream: Arc<dyn UpstreamApi>,
}

impl PerformanceTester {
    pub fn new(upstream: Arc<dyn UpstreamApi>) -> Self {
        Self { upstream }
    }
}

#[async_trait]
impl ProductionSubTester for PerformanceTester {
    fn name(&self) -> &'static str {
        "performance"
    }

    async fn run(&self, ctx: &TestContext) -> SubTestReport {
        let mut report = SubTestReport::default();
        for endpoint in &ctx.endpoints {
            let started = Instant::now();
            let outcome = self.upstream.health_probe(endpoint).await;
            let elapsed = started.elapsed();
            let passed = outcome.map(|p| p.is_healthy()).unwrap_or(false) && elapsed <= ctx.budgets.response_time_threshold;
            report.record(CheckResult {
                name: format!("response-time:{endpoint}"),
                passed,
                elapsed_ms: elapsed.as_millis() as u64,
                detail: (!passed).then(|| format!("exceeded {:?} budget", ctx.budgets.response_time_threshold)),
            });
        }
        report
    }
}
