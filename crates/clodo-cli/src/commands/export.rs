//! `clodo export`: writes the audit/state log to a file (spec.md §6,
//! §4.H). One NDJSON record per line, the same shape the log is stored
//! in, so `import` can replay it without a translation step.

use crate::context::AppContext;
use anyhow::Result;
use std::path::Path;

pub async fn run(ctx: &AppContext, output: &Path) -> Result<i32> {
    let records = ctx.store.export_records().await?;

    let mut lines = String::new();
    for record in &records {
        lines.push_str(&serde_json::to_string(record)?);
        lines.push('\n');
    }
    std::fs::write(output, lines)?;

    eprintln!("exported {} record(s) to {}", records.len(), output.display());
    Ok(0)
}
