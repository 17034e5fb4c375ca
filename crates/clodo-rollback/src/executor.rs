//! Maps a `RollbackActionKind` plus its recorded detail blob onto the
//! concrete upstream call (or secret revocation) that reverses it.
//! Every inverse is idempotent: replaying an action whose mutation was
//! already undone is expected to succeed as a no-op rather than error.

use crate::error::RollbackError;
use crate::secret_revoker::SecretRevoker;
use clodo_core::deployment::RollbackActionKind;
use clodo_core::traits::UpstreamApi;
use serde_json::Value;
use std::sync::Arc;

fn field<'a>(detail: &'a Value, key: &str) -> Result<&'a str, RollbackError> {
    detail
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| RollbackError::MalformedAction(format!("missing '{key}'")))
}

pub async fn execute_inverse(
    kind: RollbackActionKind,
    detail: &Value,
    upstream: &Arc<dyn UpstreamApi>,
    secret_revoker: &Arc<dyn SecretRevoker>,
) -> Result<(), RollbackError> {
    match kind {
        RollbackActionKind::DeleteDb => {
            let database_id = field(detail, "database_id")?;
            upstream.delete_database(database_id).await?;
        }
        RollbackActionKind::RestoreDbSnapshot => {
            let database_id = field(detail, "database_id")?;
            let snapshot_id = field(detail, "snapshot_id")?;
            upstream.restore_database_snapshot(database_id, snapshot_id).await?;
        }
        RollbackActionKind::RevertDeployConfig => {
            let domain = field(detail, "domain")?;
            let previous_revision = field(detail, "previous_revision")?;
            upstream.revert_deploy_config(domain, previous_revision).await?;
        }
        RollbackActionKind::DeleteSecret => {
            secret_revoker.revoke_secret(detail).await.map_err(RollbackError::SecretRevocation)?;
        }
        RollbackActionKind::RevokeToken => {
            secret_revoker.revoke_token(detail).await.map_err(RollbackError::SecretRevocation)?;
        }
        RollbackActionKind::RedeployPreviousArtifact => {
            let domain = field(detail, "domain")?;
            let previous_revision = field(detail, "previous_revision")?;
            upstream.redeploy_previous_artifact(domain, previous_revision).await?;
        }
        RollbackActionKind::DeleteDns => {
            let record_id = field(detail, "record_id")?;
            upstream.delete_dns_record(record_id).await?;
        }
    }
    Ok(())
}
