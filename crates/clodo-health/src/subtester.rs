//! The `ProductionTester`'s sub-tester seam (spec.md §4.G, DESIGN
//! NOTES §9): each sub-tester is a capability interface resolved from
//! a registry at construction — no dynamic loading, just trait
//! objects picked up front.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResult {
    pub name: String,
    pub passed: bool,
    pub elapsed_ms: u64,
    pub detail: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubTestReport {
    pub passed: u32,
    pub failed: u32,
    pub checks: Vec<CheckResult>,
}

impl SubTestReport {
    pub fn record(&mut self, check: CheckResult) {
        if check.passed {
            self.passed += 1;
        } else {
            self.failed += 1;
        }
        self.checks.push(check);
    }

    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }
}

/// Budgets a sub-tester's checks are measured against (spec.md §4.G).
#[derive(Debug, Clone, Copy)]
pub struct TestBudgets {
    pub response_time_threshold: Duration,
    pub health_check_threshold: Duration,
    pub auth_flow_threshold: Duration,
}

impl Default for TestBudgets {
    fn default() -> Self {
        Self {
            response_time_threshold: Duration::from_millis(500),
            health_check_threshold: Duration::from_secs(10),
            auth_flow_threshold: Duration::from_secs(2),
        }
    }
}

/// Context a sub-tester needs: the domain under test, its endpoint set
/// and the shared budgets.
#[derive(Debug, Clone)]
pub struct TestContext {
    pub domain: String,
    pub endpoints: Vec<String>,
    pub budgets: TestBudgets,
}

#[async_trait]
pub trait ProductionSubTester: Send + Sync {
    fn name(&self) -> &'static str;
    async fn run(&self, ctx: &TestContext) -> SubTestReport;
}
