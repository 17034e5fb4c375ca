//! Deployment, phase record and rollback action types (spec.md §3, §4.D).

use crate::domain::Environment;
use crate::error::OrchestratorError;
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// `deploy-<ISO timestamp>-<random>`, globally unique within a state store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeploymentId(String);

impl DeploymentId {
    pub fn new_at(now: DateTime<Utc>) -> Self {
        let suffix: String = {
            let mut rng = rand::thread_rng();
            (0..8)
                .map(|_| {
                    let choices = b"abcdefghijklmnopqrstuvwxyz0123456789";
                    choices[rng.gen_range(0..choices.len())] as char
                })
                .collect()
        };
        Self(format!("deploy-{}-{}", now.to_rfc3339(), suffix))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Reconstructs an id previously produced by [`DeploymentId::new_at`]
    /// or read back from the state store; does not validate the format
    /// beyond non-emptiness since ids are opaque handles everywhere else.
    pub fn parse(raw: impl Into<String>) -> Result<Self, OrchestratorError> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(OrchestratorError::Validation("deployment id must not be empty".into()));
        }
        Ok(Self(raw))
    }
}

impl fmt::Display for DeploymentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The per-domain pipeline phase. Order here is the FSM order; a
/// `Deployment` can only advance to the next phase if the previous
/// phase's outcome was `Ok` (invariant 2, spec.md §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Validate,
    Prepare,
    Deploy,
    Verify,
    Rollback,
}

impl Phase {
    pub fn index(&self) -> u32 {
        match self {
            Phase::Validate => 0,
            Phase::Prepare => 1,
            Phase::Deploy => 2,
            Phase::Verify => 3,
            Phase::Rollback => 4,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Validate => "validate",
            Phase::Prepare => "prepare",
            Phase::Deploy => "deploy",
            Phase::Verify => "verify",
            Phase::Rollback => "rollback",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Ok,
    Failed,
    Skipped,
}

/// The fixed set of reverse operations a rollback action may name.
/// Each is idempotent: re-running it after it already reversed its
/// paired mutation is a no-op (spec.md §4.D).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RollbackActionKind {
    DeleteDb,
    RestoreDbSnapshot,
    RevertDeployConfig,
    DeleteSecret,
    RevokeToken,
    RedeployPreviousArtifact,
    DeleteDns,
}

impl RollbackActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RollbackActionKind::DeleteDb => "delete-db",
            RollbackActionKind::RestoreDbSnapshot => "restore-db-snapshot",
            RollbackActionKind::RevertDeployConfig => "revert-deploy-config",
            RollbackActionKind::DeleteSecret => "delete-secret",
            RollbackActionKind::RevokeToken => "revoke-token",
            RollbackActionKind::RedeployPreviousArtifact => "redeploy-previous-artifact",
            RollbackActionKind::DeleteDns => "delete-dns",
        }
    }
}

/// An opaque handle naming the inverse of a mutation, recorded before
/// the mutation executes. `detail` carries whatever the inverse needs
/// to run later (resource ids, a preimage blob) but never plaintext
/// secrets (invariant 3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollbackAction {
    pub kind: RollbackActionKind,
    pub detail: serde_json::Value,
    pub registered_at: DateTime<Utc>,
}

impl RollbackAction {
    pub fn new(kind: RollbackActionKind, detail: serde_json::Value, now: DateTime<Utc>) -> Self {
        Self {
            kind,
            detail,
            registered_at: now,
        }
    }
}

/// Child record of a [`Deployment`]; ordered by monotonic `index`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseRecord {
    pub index: u32,
    pub phase: Phase,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub outcome: Option<Outcome>,
    pub rollback_action: Option<RollbackAction>,
    pub error: Option<String>,
}

impl PhaseRecord {
    pub fn start(index: u32, phase: Phase, now: DateTime<Utc>) -> Self {
        Self {
            index,
            phase,
            start_time: now,
            end_time: None,
            outcome: None,
            rollback_action: None,
            error: None,
        }
    }

    pub fn finish(&mut self, outcome: Outcome, now: DateTime<Utc>, error: Option<String>) {
        self.end_time = Some(now);
        self.outcome = Some(outcome);
        self.error = error;
    }

    pub fn register_rollback(&mut self, action: RollbackAction) {
        self.rollback_action = Some(action);
    }
}

/// One deployment of one domain/environment/artifact revision.
/// Append-only: once a phase record's outcome is terminal it is never
/// mutated again.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deployment {
    pub id: DeploymentId,
    pub domain: String,
    pub environment: Environment,
    pub artifact_revision: String,
    pub user: String,
    pub audit_token: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub phases: Vec<PhaseRecord>,
}

impl Deployment {
    pub fn new(
        id: DeploymentId,
        domain: impl Into<String>,
        environment: Environment,
        artifact_revision: impl Into<String>,
        user: impl Into<String>,
        audit_token: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            domain: domain.into(),
            environment,
            artifact_revision: artifact_revision.into(),
            user: user.into(),
            audit_token: audit_token.into(),
            start_time: now,
            end_time: None,
            phases: Vec::new(),
        }
    }

    pub fn current_phase(&self) -> Option<&PhaseRecord> {
        self.phases.last()
    }

    /// Enforces invariant 2: a deployment cannot enter a new phase
    /// unless the previous phase's outcome is `ok`.
    pub fn begin_phase(&mut self, phase: Phase, now: DateTime<Utc>) -> Result<(), OrchestratorError> {
        if let Some(last) = self.phases.last() {
            match last.outcome {
                Some(Outcome::Ok) => {}
                Some(_) | None => {
                    return Err(OrchestratorError::Invariant(format!(
                        "cannot begin phase '{phase}' while previous phase '{}' has not completed with outcome ok",
                        last.phase
                    )));
                }
            }
        }
        let index = self.phases.len() as u32;
        self.phases.push(PhaseRecord::start(index, phase, now));
        Ok(())
    }

    pub fn finish_current_phase(
        &mut self,
        outcome: Outcome,
        now: DateTime<Utc>,
        error: Option<String>,
    ) -> Result<(), OrchestratorError> {
        let record = self
            .phases
            .last_mut()
            .ok_or_else(|| OrchestratorError::Invariant("no phase in progress".into()))?;
        record.finish(outcome, now, error);
        Ok(())
    }

    pub fn register_rollback_action(&mut self, action: RollbackAction) -> Result<(), OrchestratorError> {
        let record = self
            .phases
            .last_mut()
            .ok_or_else(|| OrchestratorError::Invariant("no phase in progress to attach a rollback action to".into()))?;
        record.register_rollback(action);
        Ok(())
    }

    /// Rollback actions in the order they must be replayed: strictly
    /// descending index order (invariant 1 / testable property 5).
    pub fn rollback_actions_in_reverse_order(&self) -> Vec<(&PhaseRecord, &RollbackAction)> {
        self.phases
            .iter()
            .rev()
            .filter_map(|record| record.rollback_action.as_ref().map(|action| (record, action)))
            .collect()
    }

    pub fn is_terminal_success(&self) -> bool {
        self.phases
            .last()
            .map(|r| r.phase == Phase::Verify && r.outcome == Some(Outcome::Ok))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z").unwrap().with_timezone(&Utc)
    }

    #[test]
    fn cannot_advance_phase_without_prior_ok_outcome() {
        let mut deployment = Deployment::new(
            DeploymentId::parse("deploy-test-1").unwrap(),
            "api.example.com",
            Environment::Production,
            "rev-1",
            "tester",
            "token",
            now(),
        );
        deployment.begin_phase(Phase::Validate, now()).unwrap();
        deployment
            .finish_current_phase(Outcome::Failed, now(), Some("bad input".into()))
            .unwrap();

        let err = deployment.begin_phase(Phase::Prepare, now()).unwrap_err();
        assert!(matches!(err, OrchestratorError::Invariant(_)));
    }

    #[test]
    fn rollback_actions_replay_in_descending_index_order() {
        let mut deployment = Deployment::new(
            DeploymentId::parse("deploy-test-2").unwrap(),
            "api.example.com",
            Environment::Production,
            "rev-1",
            "tester",
            "token",
            now(),
        );
        for (phase, kind) in [
            (Phase::Prepare, RollbackActionKind::DeleteDb),
            (Phase::Deploy, RollbackActionKind::RevertDeployConfig),
        ] {
            deployment.begin_phase(phase, now()).unwrap();
            deployment
                .register_rollback_action(RollbackAction::new(kind, serde_json::json!({}), now()))
                .unwrap();
            deployment.finish_current_phase(Outcome::Ok, now(), None).unwrap();
        }

        let reversed = deployment.rollback_actions_in_reverse_order();
        assert_eq!(reversed.len(), 2);
        assert_eq!(reversed[0].1.kind, RollbackActionKind::RevertDeployConfig);
        assert_eq!(reversed[1].1.kind, RollbackActionKind::DeleteDb);
    }

    #[test]
    fn terminal_success_requires_verify_ok() {
        let mut deployment = Deployment::new(
            DeploymentId::parse("deploy-test-3").unwrap(),
            "api.example.com",
            Environment::Production,
            "rev-1",
            "tester",
            "token",
            now(),
        );
        deployment.begin_phase(Phase::Validate, now()).unwrap();
        deployment.finish_current_phase(Outcome::Ok, now(), None).unwrap();
        assert!(!deployment.is_terminal_success());

        deployment.begin_phase(Phase::Prepare, now()).unwrap();
        deployment.finish_current_phase(Outcome::Ok, now(), None).unwrap();
        deployment.begin_phase(Phase::Deploy, now()).unwrap();
        deployment.finish_current_phase(Outcome::Ok, now(), None).unwrap();
        deployment.begin_phase(Phase::Verify, now()).unwrap();
        deployment.finish_current_phase(Outcome::Ok, now(), None).unwrap();
        assert!(deployment.is_terminal_success());
    }
}
