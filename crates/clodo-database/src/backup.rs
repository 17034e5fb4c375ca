//! Database backups (spec.md §4.J, §6): `production` requires one
//! before any migration runs. Backups are content-addressed by
//! timestamp-derived id and saved under
//! `backups/database/<env>/<backup-id>/backup-manifest.json`.

use crate::error::DatabaseError;
use chrono::{DateTime, Utc};
use clodo_core::domain::Environment;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupManifest {
    pub id: String,
    pub domain: String,
    pub environment: String,
    pub database_id: String,
    pub database_name: String,
    pub created: DateTime<Utc>,
}

/// Backup ids are immutable once written — the manifest is the
/// durable record that a backup was taken, not the (unmodeled) data
/// dump itself, which a real implementation would stream into the
/// same directory alongside the manifest.
pub fn backup_id(created: DateTime<Utc>) -> String {
    created.format("%Y%m%dT%H%M%S%.3fZ").to_string()
}

pub fn backup_dir(backups_root: &Path, environment: Environment, id: &str) -> PathBuf {
    backups_root.join("database").join(environment.as_str()).join(id)
}

pub async fn create_backup(
    backups_root: &Path,
    domain: &str,
    environment: Environment,
    database_id: &str,
    database_name: &str,
    now: DateTime<Utc>,
) -> Result<BackupManifest, DatabaseError> {
    let id = backup_id(now);
    let manifest = BackupManifest {
        id: id.clone(),
        domain: domain.to_string(),
        environment: environment.as_str().to_string(),
        database_id: database_id.to_string(),
        database_name: database_name.to_string(),
        created: now,
    };

    let dir = backup_dir(backups_root, environment, &id);
    tokio::fs::create_dir_all(&dir).await?;
    let serialized = serde_json::to_string_pretty(&manifest)?;
    tokio::fs::write(dir.join("backup-manifest.json"), serialized).await?;

    Ok(manifest)
}

pub async fn load_manifest(
    backups_root: &Path,
    environment: Environment,
    id: &str,
) -> Result<BackupManifest, DatabaseError> {
    let path = backup_dir(backups_root, environment, id).join("backup-manifest.json");
    if !path.exists() {
        return Err(DatabaseError::BackupNotFound(id.to_string()));
    }
    let raw = tokio::fs::read_to_string(path).await?;
    Ok(serde_json::from_str(&raw)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z").unwrap().with_timezone(&Utc)
    }

    #[tokio::test]
    async fn create_then_load_round_trips_the_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = create_backup(dir.path(), "api.example.com", Environment::Production, "db-1", "api-production", now())
            .await
            .unwrap();

        let loaded = load_manifest(dir.path(), Environment::Production, &manifest.id).await.unwrap();
        assert_eq!(loaded.database_id, "db-1");
    }

    #[tokio::test]
    async fn loading_an_unknown_backup_id_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_manifest(dir.path(), Environment::Production, "missing").await.unwrap_err();
        assert!(matches!(err, DatabaseError::BackupNotFound(_)));
    }
}
