//! `clodo assess`: runs the capability assessment engine against a
//! service directory and reports the gap analysis (spec.md §6).

use crate::context::AppContext;
use crate::output::{print_value, OutputFormat};
use anyhow::Result;
use clodo_assessment::UserInputs;
use clodo_core::domain::Environment;
use std::path::PathBuf;
use std::str::FromStr;

pub struct AssessArgs {
    pub service_path: PathBuf,
    pub json: bool,
    pub verbose: bool,
    pub report: bool,
    pub force_refresh: bool,
    pub domain: Option<String>,
    pub environment: Option<String>,
    pub ignore_blocked: bool,
    pub api_token: Option<String>,
}

pub async fn run(ctx: &AppContext, args: AssessArgs, output_format: OutputFormat) -> Result<i32> {
    let environment = match &args.environment {
        Some(env) => Environment::from_str(env).map_err(anyhow::Error::msg)?,
        None => Environment::Development,
    };

    let user_inputs = UserInputs {
        domain: args.domain.clone(),
        environment: Some(environment),
        api_token: args.api_token.clone(),
        ..Default::default()
    };

    let assessment = ctx.assessment.assess(&args.service_path, user_inputs, args.force_refresh).await?;
    let value = serde_json::to_value(&assessment)?;

    let format = if args.json { OutputFormat::Json } else { output_format };
    print_value(&value, format)?;

    if args.verbose {
        for recommendation in &assessment.recommendations {
            eprintln!("[{:?}] {}: {}", recommendation.priority, recommendation.capability, recommendation.message);
        }
    }

    if args.report {
        let domain = args.domain.as_deref().unwrap_or("service");
        let extra = serde_json::json!({
            "service_path": args.service_path.display().to_string(),
            "environment": environment.as_str(),
        });
        let html = crate::report::render(domain, &value, &extra);
        let reports_root = ctx.config.state_root(&ctx.repo_root).join("reports");
        let path = crate::report::write(&reports_root, domain, &html)?;
        eprintln!("wrote report to {}", path.display());
    }

    if !assessment.is_deployable() && !args.ignore_blocked {
        return Ok(2);
    }
    Ok(0)
}
