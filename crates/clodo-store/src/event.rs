//! The append-only record shape for the audit log (spec.md §4.H): one
//! record per phase event (`start`, `end`, `rollback-registered`,
//! `error`).

use chrono::{DateTime, Utc};
use clodo_core::deployment::{Outcome, Phase};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventKind {
    Start,
    End,
    RollbackRegistered,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    pub deployment_id: String,
    pub domain: String,
    pub environment: String,
    pub phase: Option<Phase>,
    pub outcome: Option<Outcome>,
    pub kind: EventKind,
    pub timestamp: DateTime<Utc>,
    pub detail: serde_json::Value,
}

impl EventRecord {
    pub fn domain_key(&self) -> String {
        format!("{}::{}", self.domain, self.environment)
    }
}
