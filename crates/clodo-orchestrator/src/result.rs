use clodo_core::deployment::Phase;
use clodo_health::AggregateReport;
use clodo_rollback::RollbackReport;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DomainOutcome {
    Success { verify_report: AggregateReport },
    Failed { phase: Phase, error: String },
    RolledBack { phase: Phase, error: String, rollback: RollbackReport },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainResult {
    pub domain: String,
    pub environment: String,
    pub deployment_id: String,
    pub outcome: DomainOutcome,
}

impl DomainResult {
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, DomainOutcome::Success { .. })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PortfolioResult {
    pub results: Vec<DomainResult>,
    /// Set when the portfolio aborted before every planned batch ran
    /// (rollbackOnError tripped mid-run).
    pub aborted_after_batch: Option<usize>,
}

impl PortfolioResult {
    pub fn all_succeeded(&self) -> bool {
        !self.results.is_empty() && self.results.iter().all(DomainResult::is_success)
    }

    pub fn failed_domains(&self) -> Vec<&DomainResult> {
        self.results.iter().filter(|r| !r.is_success()).collect()
    }
}
