//! API sub-tester: probes every declared endpoint and records a check
//! per endpoint.

use crate::subtester::{CheckResult, ProductionSubTester, SubTestReport, TestContext};
use async_trait::async_trait;
use clodo_core::traits::UpstreamApi;
use std::sync::Arc;
use std::time::Instant;

pub struct ApiTester {
    upstream: Arc<dyn UpstreamApi>,
}

impl ApiTester {
    pub fn new(upstream: Arc<dyn UpstreamApi>) -> Self {
        Self { upstream }
    }
}

#[async_trait]
impl ProductionSubTester for ApiTester {
    fn name(&self) -> &'static str {
        "api"
    }

    async fn run(&self, ctx: &TestContext) -> SubTestReport {
        let mut report = SubTestReport::default();
        for endpoint in &ctx.endpoints {
            let started = Instant::now();
            let outcome = self.upstream.health_probe(endpoint).await;
            let elapsed_ms = started.elapsed().as_millis() as u64;
            match outcome {
                Ok(probe) => report.record(CheckResult {
                    name: format!("endpoint:{endpoint}"),
                    passed: probe.is_healthy(),
                    elapsed_ms,
                    detail: None,
                }),
                Err(err) => report.record(CheckResult {
                    name: format!("endpoint:{endpoint}"),
                    passed: false,
                    elapsed_ms,
                    detail: Some(err.to_string()),
                }),
            }
        }
        report
    }
}
