//! Append-only audit log and current-deployment pointer store (spec.md
//! §4.H). Writes are serialized per deployment id via an in-process
//! `tokio::sync::Mutex`, and each record is fsynced before the append
//! call returns so a record is durable the instant the caller observes
//! success, even if the process dies immediately after.

use crate::error::StoreError;
use crate::event::{EventKind, EventRecord};
use chrono::{DateTime, Utc};
use clodo_core::deployment::{Outcome, Phase};
use dashmap::DashMap;
use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct CurrentPointers {
    /// `domain_key -> deployment_id`, updated only when a deployment
    /// reaches terminal success.
    by_domain_key: HashMap<String, String>,
}

pub struct StateStore {
    log_path: PathBuf,
    current_path: PathBuf,
    deployment_locks: DashMap<String, Arc<Mutex<()>>>,
    domain_locks: DashMap<String, Arc<Mutex<()>>>,
    current: Mutex<CurrentPointers>,
}

impl StateStore {
    pub fn open(state_root: &Path) -> Result<Self, StoreError> {
        let dir = state_root.join("audit");
        std::fs::create_dir_all(&dir)?;
        let log_path = dir.join("deployments.ndjson");
        let current_path = dir.join("current.json");

        let current = if current_path.exists() {
            let raw = std::fs::read_to_string(&current_path)?;
            if raw.trim().is_empty() {
                CurrentPointers::default()
            } else {
                serde_json::from_str(&raw)?
            }
        } else {
            CurrentPointers::default()
        };

        Ok(Self {
            log_path,
            current_path,
            deployment_locks: DashMap::new(),
            domain_locks: DashMap::new(),
            current: Mutex::new(current),
        })
    }

    fn lock_for(&self, deployment_id: &str) -> Arc<Mutex<()>> {
        self.deployment_locks
            .entry(deployment_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// The exclusive per-`(domain, env)` lock spec.md §3/§5 require:
    /// one active deployment per key at a time, acquired in `prepare`
    /// and held through `verify` or rollback completion. Returns the
    /// shared handle; callers `lock_owned()` it and hold the guard for
    /// the lifetime of their deployment.
    pub fn domain_lock(&self, domain_key: &str) -> Arc<Mutex<()>> {
        self.domain_locks
            .entry(domain_key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Appends one record to the durable log. Serialized per deployment
    /// id so two phase events for the same deployment can never
    /// interleave, but events for different deployments proceed
    /// concurrently.
    pub async fn append(&self, record: EventRecord) -> Result<(), StoreError> {
        let lock = self.lock_for(&record.deployment_id);
        let _guard = lock.lock().await;

        let line = serde_json::to_string(&record)?;
        let log_path = self.log_path.clone();
        tokio::task::spawn_blocking(move || -> Result<(), StoreError> {
            let mut file = OpenOptions::new().create(true).append(true).open(&log_path)?;
            writeln!(file, "{line}")?;
            file.sync_all()?;
            Ok(())
        })
        .await
        .expect("append task panicked")?;

        Ok(())
    }

    pub async fn record_phase_start(
        &self,
        deployment_id: &str,
        domain: &str,
        environment: &str,
        phase: Phase,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.append(EventRecord {
            deployment_id: deployment_id.to_string(),
            domain: domain.to_string(),
            environment: environment.to_string(),
            phase: Some(phase),
            outcome: None,
            kind: EventKind::Start,
            timestamp: now,
            detail: serde_json::Value::Null,
        })
        .await
    }

    pub async fn record_phase_end(
        &self,
        deployment_id: &str,
        domain: &str,
        environment: &str,
        phase: Phase,
        outcome: Outcome,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.append(EventRecord {
            deployment_id: deployment_id.to_string(),
            domain: domain.to_string(),
            environment: environment.to_string(),
            phase: Some(phase),
            outcome: Some(outcome),
            kind: EventKind::End,
            timestamp: now,
            detail: serde_json::Value::Null,
        })
        .await?;

        if outcome == Outcome::Ok && phase == Phase::Verify {
            self.set_current(&format!("{domain}::{environment}"), deployment_id).await?;
        }
        Ok(())
    }

    pub async fn record_rollback_registered(
        &self,
        deployment_id: &str,
        domain: &str,
        environment: &str,
        phase: Phase,
        detail: serde_json::Value,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.append(EventRecord {
            deployment_id: deployment_id.to_string(),
            domain: domain.to_string(),
            environment: environment.to_string(),
            phase: Some(phase),
            outcome: None,
            kind: EventKind::RollbackRegistered,
            timestamp: now,
            detail,
        })
        .await
    }

    pub async fn record_error(
        &self,
        deployment_id: &str,
        domain: &str,
        environment: &str,
        phase: Option<Phase>,
        message: &str,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.append(EventRecord {
            deployment_id: deployment_id.to_string(),
            domain: domain.to_string(),
            environment: environment.to_string(),
            phase,
            outcome: None,
            kind: EventKind::Error,
            timestamp: now,
            detail: serde_json::json!({ "message": message }),
        })
        .await
    }

    async fn set_current(&self, domain_key: &str, deployment_id: &str) -> Result<(), StoreError> {
        let mut current = self.current.lock().await;
        current.by_domain_key.insert(domain_key.to_string(), deployment_id.to_string());
        let serialized = serde_json::to_string_pretty(&*current)?;
        tokio::fs::write(&self.current_path, serialized).await?;
        Ok(())
    }

    /// After replaying `deployment_id`'s rollback actions, repoints its
    /// `(domain, env)` `current` pointer at the last deployment before
    /// it that reached `verify=ok`, or clears the pointer entirely if
    /// none exists (spec.md §8 scenario 6: rolling back the deployment
    /// `current` was pointing at must not leave it pointing there once
    /// the rollback has run).
    pub async fn repoint_current_after_rollback(&self, deployment_id: &str) -> Result<(), StoreError> {
        let records = self.read_all().await?;
        let Some(target) = records.iter().find(|r| r.deployment_id == deployment_id) else {
            return Ok(());
        };
        let domain_key = target.domain_key();

        let mut successful: Vec<&str> = records
            .iter()
            .filter(|r| {
                r.domain_key() == domain_key
                    && r.kind == EventKind::End
                    && r.phase == Some(Phase::Verify)
                    && r.outcome == Some(Outcome::Ok)
                    && r.deployment_id != deployment_id
            })
            .map(|r| r.deployment_id.as_str())
            .collect();
        // Deployment ids embed an RFC3339 timestamp (see `list_deployments`),
        // so the lexicographically greatest one is also the most recent.
        successful.sort_unstable();
        let prior = successful.last().map(|id| id.to_string());

        let mut current = self.current.lock().await;
        match prior {
            Some(id) => {
                current.by_domain_key.insert(domain_key, id);
            }
            None => {
                current.by_domain_key.remove(&domain_key);
            }
        }
        let serialized = serde_json::to_string_pretty(&*current)?;
        tokio::fs::write(&self.current_path, serialized).await?;
        Ok(())
    }

    async fn read_all(&self) -> Result<Vec<EventRecord>, StoreError> {
        if !self.log_path.exists() {
            return Ok(Vec::new());
        }
        let raw = tokio::fs::read_to_string(&self.log_path).await?;
        let mut records = Vec::new();
        for line in raw.lines() {
            if line.trim().is_empty() {
                continue;
            }
            records.push(serde_json::from_str(line)?);
        }
        Ok(records)
    }

    pub async fn history_by_domain(&self, domain: &str) -> Result<Vec<EventRecord>, StoreError> {
        Ok(self.read_all().await?.into_iter().filter(|r| r.domain == domain).collect())
    }

    pub async fn history_by_environment(&self, environment: &str) -> Result<Vec<EventRecord>, StoreError> {
        Ok(self
            .read_all()
            .await?
            .into_iter()
            .filter(|r| r.environment == environment)
            .collect())
    }

    /// The deployment id currently pointed to as the last known-good
    /// deployment for `(domain, env)` — used as the rollback target.
    pub async fn latest_successful_deployment(&self, domain_key: &str) -> Option<String> {
        self.current.lock().await.by_domain_key.get(domain_key).cloned()
    }

    /// Rollback actions registered for `deployment_id`, in the order
    /// they were recorded (ascending append order, i.e. the order
    /// phases executed, not the reverse-execution order a rollback run
    /// walks them in — that ordering lives in `clodo_core::Deployment`).
    pub async fn rollback_actions_for(&self, deployment_id: &str) -> Result<Vec<EventRecord>, StoreError> {
        Ok(self
            .read_all()
            .await?
            .into_iter()
            .filter(|r| r.deployment_id == deployment_id && r.kind == EventKind::RollbackRegistered)
            .collect())
    }

    /// One summary row per deployment id seen in the log, ordered by id
    /// (deployment ids embed an RFC3339 timestamp so lexicographic order
    /// is chronological order). Backs `orchestrate status` and
    /// `orchestrate rollback --list`.
    pub async fn list_deployments(&self) -> Result<Vec<DeploymentSummary>, StoreError> {
        let records = self.read_all().await?;
        let mut summaries: std::collections::BTreeMap<String, DeploymentSummary> = std::collections::BTreeMap::new();

        for record in &records {
            let summary = summaries.entry(record.deployment_id.clone()).or_insert_with(|| DeploymentSummary {
                deployment_id: record.deployment_id.clone(),
                domain: record.domain.clone(),
                environment: record.environment.clone(),
                phases_completed: Vec::new(),
                last_outcome: None,
                is_current: false,
            });
            if record.kind == EventKind::End {
                if let Some(phase) = record.phase {
                    summary.phases_completed.push(phase);
                }
                summary.last_outcome = record.outcome;
            }
        }

        let current = self.current.lock().await;
        for summary in summaries.values_mut() {
            let key = format!("{}::{}", summary.domain, summary.environment);
            if current.by_domain_key.get(&key).map(String::as_str) == Some(summary.deployment_id.as_str()) {
                summary.is_current = true;
            }
        }

        Ok(summaries.into_values().collect())
    }

    /// The raw event log, for `orchestrate export`. Token plaintext
    /// never appears here (invariant 3) since rollback detail blobs
    /// only ever carry resource ids, never secret material.
    pub async fn export_records(&self) -> Result<Vec<EventRecord>, StoreError> {
        self.read_all().await
    }

    /// Replays one previously exported record into this store,
    /// preserving the `current` pointer side effect a live `verify=ok`
    /// end event would have had (`orchestrate import`).
    pub async fn import_record(&self, record: EventRecord) -> Result<(), StoreError> {
        let updates_current = record.kind == EventKind::End && record.outcome == Some(Outcome::Ok) && record.phase == Some(Phase::Verify);
        let domain_key = record.domain_key();
        let deployment_id = record.deployment_id.clone();
        self.append(record).await?;
        if updates_current {
            self.set_current(&domain_key, &deployment_id).await?;
        }
        Ok(())
    }
}

/// One row of [`StateStore::list_deployments`].
#[derive(Debug, Clone, serde::Serialize)]
pub struct DeploymentSummary {
    pub deployment_id: String,
    pub domain: String,
    pub environment: String,
    pub phases_completed: Vec<Phase>,
    pub last_outcome: Option<Outcome>,
    pub is_current: bool,
}
