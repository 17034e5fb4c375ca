//! `clodo import`: replays a previously exported audit/state log
//! (spec.md §6, §4.H).

use crate::context::AppContext;
use anyhow::{Context, Result};
use clodo_store::EventRecord;
use std::path::Path;

pub async fn run(ctx: &AppContext, input: &Path) -> Result<i32> {
    let raw = std::fs::read_to_string(input).with_context(|| format!("failed to read {}", input.display()))?;

    let mut imported = 0;
    for (line_number, line) in raw.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let record: EventRecord = serde_json::from_str(line).with_context(|| format!("malformed record on line {}", line_number + 1))?;
        ctx.store.import_record(record).await?;
        imported += 1;
    }

    eprintln!("imported {imported} record(s) from {}", input.display());
    Ok(0)
}
