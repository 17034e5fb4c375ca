//! Append-only audit stream for database operations (spec.md §6:
//! `audit-logs/database-audit.log`), one NDJSON line per operation.

use crate::error::DatabaseError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseAuditRecord {
    pub operation: String,
    pub domain: String,
    pub environment: String,
    pub detail: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

pub struct DatabaseAuditLog {
    path: PathBuf,
    lock: Mutex<()>,
}

impl DatabaseAuditLog {
    pub fn open(audit_root: &Path) -> Result<Self, DatabaseError> {
        std::fs::create_dir_all(audit_root)?;
        Ok(Self {
            path: audit_root.join("database-audit.log"),
            lock: Mutex::new(()),
        })
    }

    pub async fn record(&self, record: DatabaseAuditRecord) -> Result<(), DatabaseError> {
        let _guard = self.lock.lock().await;
        let line = serde_json::to_string(&record)?;
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || -> Result<(), DatabaseError> {
            let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
            writeln!(file, "{line}")?;
            file.sync_all()?;
            Ok(())
        })
        .await
        .expect("audit append task panicked")
    }

    pub async fn read_all(&self) -> Result<Vec<DatabaseAuditRecord>, DatabaseError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let raw = tokio::fs::read_to_string(&self.path).await?;
        raw.lines()
            .filter(|l| !l.trim().is_empty())
            .map(|l| serde_json::from_str(l).map_err(DatabaseError::from))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_append_and_read_back_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let log = DatabaseAuditLog::open(dir.path()).unwrap();
        for op in ["migrate", "backup"] {
            log.record(DatabaseAuditRecord {
                operation: op.to_string(),
                domain: "api.example.com".into(),
                environment: "production".into(),
                detail: serde_json::json!({}),
                timestamp: Utc::now(),
            })
            .await
            .unwrap();
        }

        let records = log.read_all().await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].operation, "migrate");
        assert_eq!(records[1].operation, "backup");
    }
}
