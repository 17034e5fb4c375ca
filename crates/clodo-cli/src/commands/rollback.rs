//! `clodo rollback`: lists or replays the rollback actions registered
//! for a prior deployment (spec.md §6, §4.D).

use crate::context::AppContext;
use crate::output::{print_value, OutputFormat};
use anyhow::{bail, Result};

pub struct RollbackArgs {
    pub list: bool,
    pub to_version: Option<String>,
    pub dry_run: bool,
}

pub async fn run(ctx: &AppContext, args: RollbackArgs, output_format: OutputFormat) -> Result<i32> {
    if args.list {
        let summaries = ctx.store.list_deployments().await?;
        print_value(&serde_json::to_value(&summaries)?, output_format)?;
        return Ok(0);
    }

    let Some(deployment_id) = args.to_version else {
        bail!("--to-version <deployment-id> is required unless --list is given");
    };

    if args.dry_run {
        let actions = ctx.store.rollback_actions_for(&deployment_id).await?;
        if actions.is_empty() {
            bail!("no rollback actions registered for deployment '{deployment_id}'");
        }
        let preview: Vec<_> = actions.into_iter().rev().map(|record| record.detail).collect();
        print_value(&serde_json::json!({ "deployment_id": deployment_id, "would_execute": preview }), output_format)?;
        return Ok(0);
    }

    let report = ctx.rollback.rollback_from_store(&ctx.store, &deployment_id).await?;
    print_value(&serde_json::to_value(&report)?, output_format)?;

    if report.all_succeeded() {
        // The deployment's resources are back to their preimage, so
        // `current` must stop pointing at it (spec.md §8 scenario 6).
        ctx.store.repoint_current_after_rollback(&deployment_id).await?;
        Ok(0)
    } else if report.is_partial_recovery() {
        Ok(5)
    } else {
        Ok(1)
    }
}
