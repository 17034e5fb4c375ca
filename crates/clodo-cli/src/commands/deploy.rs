//! `clodo deploy`: plans and executes a deployment across one or more
//! domains (spec.md §6, §4.B).

use crate::context::AppContext;
use crate::output::{print_value, OutputFormat};
use anyhow::{bail, Result};
use clodo_assessment::UserInputs;
use clodo_core::domain::{Domain, Environment};
use clodo_orchestrator::{DeployOptions, DomainOutcome};
use clodo_router::Selection;
use std::path::PathBuf;
use std::str::FromStr;

pub struct DeployArgs {
    pub service_path: PathBuf,
    pub environment: Option<String>,
    pub dry_run: bool,
    pub no_rollback: bool,
    pub parallelism: Option<usize>,
    pub ignore_blocked: bool,
    pub domain: Option<String>,
    pub all: bool,
    pub report: bool,
}

pub async fn run(ctx: &AppContext, args: DeployArgs, output_format: OutputFormat) -> Result<i32> {
    let environment = match &args.environment {
        Some(env) => Environment::from_str(env).map_err(anyhow::Error::msg)?,
        None => Environment::Development,
    };

    let (available, warnings) = ctx.router.discover_and_validate().await?;
    for warning in &warnings {
        eprintln!("warning: {warning}");
    }

    let selection = match (&args.domain, args.all) {
        (Some(name), _) => Selection::Specific(vec![name.clone()]),
        (None, true) => Selection::All,
        (None, false) => Selection::First,
    };
    let selected = ctx.router.select(&available, &selection).await?;

    let portfolio = ctx.repo_root.file_name().and_then(|n| n.to_str()).unwrap_or("portfolio").to_string();
    let domains: Vec<Domain> = selected.iter().map(|name| Domain::new(name.clone(), environment, portfolio.clone())).collect();

    let parallelism = args.parallelism.unwrap_or(ctx.config.orchestrator.parallelism);
    let options = DeployOptions {
        artifact_revision: format!("cli-{}", chrono::Utc::now().to_rfc3339()),
        user: "cli".to_string(),
        audit_token: format!("cli-session-{}", chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default()),
        service_path: args.service_path.clone(),
        user_inputs: UserInputs {
            environment: Some(environment),
            ..Default::default()
        },
        ignore_blocked: args.ignore_blocked,
        rollback_on_error: !args.no_rollback,
        parallelism,
        migrations: Vec::new(),
    };

    let plan = ctx.orchestrator.plan_deployment(domains, &options);

    if args.dry_run {
        let preview: Vec<Vec<String>> = plan.batches.iter().map(|batch| batch.iter().map(|d| d.name.clone()).collect()).collect();
        print_value(&serde_json::json!({ "domain_count": plan.domain_count(), "batches": preview }), output_format)?;
        return Ok(0);
    }

    let portfolio_result = ctx.orchestrator.deploy(&plan, &options).await?;
    print_value(&serde_json::to_value(&portfolio_result)?, output_format)?;

    if args.report {
        for result in &portfolio_result.results {
            let assessment = ctx
                .assessment
                .assess(&args.service_path, UserInputs { environment: Some(environment), ..Default::default() }, false)
                .await?;
            let extra = serde_json::json!({
                "deployment_id": result.deployment_id,
                "environment": result.environment,
                "outcome": result.outcome,
            });
            let html = crate::report::render(&result.domain, &serde_json::to_value(&assessment)?, &extra);
            let reports_root = ctx.config.state_root(&ctx.repo_root).join("reports");
            let path = crate::report::write(&reports_root, &result.domain, &html)?;
            eprintln!("wrote report to {}", path.display());
        }
    }

    if portfolio_result.results.is_empty() {
        bail!("no domains were selected for deployment");
    }
    if portfolio_result.all_succeeded() {
        return Ok(0);
    }
    let any_partial_rollback = portfolio_result.results.iter().any(|r| match &r.outcome {
        DomainOutcome::RolledBack { rollback, .. } => rollback.is_partial_recovery(),
        _ => false,
    });
    if any_partial_rollback {
        return Ok(5);
    }
    Ok(1)
}
