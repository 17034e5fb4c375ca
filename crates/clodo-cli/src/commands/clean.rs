//! `clodo clean`: housekeeping sweep. Expires stale tokens and deletes
//! report/artifact files older than a cutoff (spec.md §6, §4.F/§4.G).

use crate::context::AppContext;
use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use std::path::Path;

pub struct CleanArgs {
    pub older_than: Option<String>,
}

fn parse_older_than(raw: &str) -> Result<Duration> {
    let raw = raw.trim();
    let (number, unit) = raw.split_at(raw.len().saturating_sub(1));
    let amount: i64 = number.parse().with_context(|| format!("invalid --older-than value '{raw}'"))?;
    match unit {
        "d" => Ok(Duration::days(amount)),
        "h" => Ok(Duration::hours(amount)),
        "m" => Ok(Duration::minutes(amount)),
        _ => raw.parse::<i64>().map(Duration::days).with_context(|| format!("invalid --older-than value '{raw}'")),
    }
}

fn sweep_stale_files(dir: &Path, cutoff: std::time::SystemTime) -> Result<usize> {
    if !dir.exists() {
        return Ok(0);
    }
    let mut removed = 0;
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            continue;
        }
        let modified = entry.metadata()?.modified()?;
        if modified < cutoff {
            std::fs::remove_file(&path)?;
            removed += 1;
        }
    }
    Ok(removed)
}

pub async fn run(ctx: &AppContext, args: CleanArgs) -> Result<i32> {
    let window = match &args.older_than {
        Some(raw) => parse_older_than(raw)?,
        None => Duration::days(30),
    };

    let now = Utc::now();
    let removed_tokens = ctx.tokens.rotate_expired_tokens(now).await?;

    let cutoff = window
        .to_std()
        .map(|std_duration| std::time::SystemTime::now() - std_duration)
        .unwrap_or_else(|_| std::time::SystemTime::now());

    let state_root = ctx.config.state_root(&ctx.repo_root);
    let removed_reports = sweep_stale_files(&state_root.join("reports"), cutoff)?;
    let removed_production_tests = sweep_stale_files(&clodo_health::artifacts_root(&state_root), cutoff)?;

    println!("expired tokens removed: {removed_tokens}");
    println!("stale reports removed: {removed_reports}");
    println!("stale production-test artifacts removed: {removed_production_tests}");
    Ok(0)
}
