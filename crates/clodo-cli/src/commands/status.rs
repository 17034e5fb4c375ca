//! `clodo status`: reports the current deployment status of the
//! portfolio (spec.md §6).

use crate::context::AppContext;
use crate::output::{print_value, OutputFormat};
use anyhow::Result;

pub struct StatusArgs {
    pub detailed: bool,
    pub json: bool,
}

pub async fn run(ctx: &AppContext, args: StatusArgs, output_format: OutputFormat) -> Result<i32> {
    let summaries = ctx.store.list_deployments().await?;

    let value = if args.detailed {
        serde_json::json!({
            "deployments": summaries,
            "metrics": ctx.metrics.snapshot(),
        })
    } else {
        serde_json::to_value(&summaries)?
    };

    let format = if args.json { OutputFormat::Json } else { output_format };
    print_value(&value, format)?;
    Ok(0)
}
