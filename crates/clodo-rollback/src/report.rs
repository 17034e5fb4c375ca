use clodo_core::deployment::RollbackActionKind;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionOutcome {
    pub kind: RollbackActionKind,
    pub succeeded: bool,
    pub error: Option<String>,
}

/// The result of replaying one deployment's registered rollback
/// actions. `partial` is true when at least one inverse failed after
/// at least one other succeeded — a state the operator must
/// investigate manually rather than assume fully recovered.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RollbackReport {
    pub actions: Vec<ActionOutcome>,
}

impl RollbackReport {
    pub fn record(&mut self, outcome: ActionOutcome) {
        self.actions.push(outcome);
    }

    pub fn all_succeeded(&self) -> bool {
        !self.actions.is_empty() && self.actions.iter().all(|a| a.succeeded)
    }

    pub fn any_failed(&self) -> bool {
        self.actions.iter().any(|a| !a.succeeded)
    }

    pub fn is_partial_recovery(&self) -> bool {
        let succeeded = self.actions.iter().filter(|a| a.succeeded).count();
        succeeded > 0 && self.any_failed()
    }
}
