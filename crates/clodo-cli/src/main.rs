//! `clodo`: the command-line frontend for the multi-domain deployment
//! orchestrator (spec.md §6). Dispatches to one handler per
//! subcommand; every handler returns a process exit code per spec.md
//! §6/§7's taxonomy rather than panicking or calling `std::process::exit`
//! itself, so `main` stays the single place that surface exits.

mod commands;
mod config;
mod confirmer;
mod context;
mod logging;
mod output;
mod report;
mod upstream;

use anyhow::Result;
use clap::{Parser, Subcommand};
use clodo_core::traits::{Confirmer, NonInteractiveConfirmer};
use config::CliConfig;
use context::AppContext;
use output::OutputFormat;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "clodo", version, about = "Multi-domain deployment orchestrator for edge-worker services")]
struct Cli {
    /// Repository root: where `clodo-config.json`, `config/domains.json`
    /// and persisted state live.
    #[arg(long, global = true, default_value = ".")]
    repo_root: PathBuf,

    /// Service directory to assess/deploy (defaults to `repo_root`).
    #[arg(long, global = true)]
    service_path: Option<PathBuf>,

    #[arg(long, global = true)]
    api_token: Option<String>,

    #[arg(long, global = true)]
    account_id: Option<String>,

    /// Skip interactive confirmation prompts, auto-declining anything
    /// destructive (spec.md §4.J's `full` cleanup on `production`, for
    /// instance, is refused outright rather than silently approved).
    #[arg(long, global = true)]
    yes: bool,

    #[arg(short, long, global = true)]
    verbose: bool,

    #[arg(short, long, global = true)]
    output: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the capability assessment engine against the service.
    Assess {
        #[arg(long)]
        json: bool,
        #[arg(long)]
        verbose: bool,
        #[arg(long)]
        report: bool,
        #[arg(long)]
        force_refresh: bool,
        #[arg(long)]
        domain: Option<String>,
        #[arg(long)]
        environment: Option<String>,
        #[arg(long)]
        ignore_blocked: bool,
    },
    /// Plan and execute a deployment across one or more domains.
    Deploy {
        #[arg(long)]
        environment: Option<String>,
        #[arg(long)]
        dry_run: bool,
        #[arg(long)]
        no_rollback: bool,
        #[arg(long)]
        parallelism: Option<usize>,
        #[arg(long)]
        ignore_blocked: bool,
        #[arg(long)]
        domain: Option<String>,
        #[arg(long)]
        all: bool,
        #[arg(long)]
        report: bool,
    },
    /// List or replay rollback actions for a prior deployment.
    Rollback {
        #[arg(long)]
        list: bool,
        #[arg(long)]
        to_version: Option<String>,
        #[arg(long)]
        dry_run: bool,
    },
    /// Show the current deployment status of the portfolio.
    Status {
        #[arg(long)]
        detailed: bool,
        #[arg(long)]
        json: bool,
    },
    /// Housekeeping sweep: expired tokens and stale artifacts.
    Clean {
        #[arg(long)]
        older_than: Option<String>,
    },
    /// Export the audit/state log to a file.
    Export {
        #[arg(long)]
        output: PathBuf,
    },
    /// Import a previously exported audit/state log.
    Import {
        #[arg(long)]
        input: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let exit_code = match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            1
        }
    };
    std::process::exit(exit_code);
}

async fn run(cli: Cli) -> Result<i32> {
    let repo_root = cli.repo_root.canonicalize().unwrap_or(cli.repo_root.clone());
    let config = CliConfig::load(&repo_root)?;
    let output_format = OutputFormat::from_str(cli.output.as_deref().unwrap_or(&config.output_format))?;

    let platform_prefix = config.platform_name.to_uppercase();
    let api_token = cli.api_token.or_else(|| std::env::var(format!("{platform_prefix}_API_TOKEN")).ok());
    let account_id = cli.account_id.or_else(|| std::env::var(format!("{platform_prefix}_ACCOUNT_ID")).ok());

    let confirmer: Arc<dyn Confirmer> = if cli.yes || !is_interactive() {
        Arc::new(NonInteractiveConfirmer)
    } else {
        Arc::new(crate::confirmer::InteractiveConfirmer)
    };

    let ctx = AppContext::build(repo_root.clone(), config, api_token.clone(), account_id, confirmer)?;
    let service_path = cli.service_path.unwrap_or_else(|| ctx.repo_root.clone());

    match cli.command {
        Commands::Assess {
            json,
            verbose,
            report,
            force_refresh,
            domain,
            environment,
            ignore_blocked,
        } => {
            commands::assess::run(
                &ctx,
                commands::assess::AssessArgs {
                    service_path,
                    json,
                    verbose,
                    report,
                    force_refresh,
                    domain,
                    environment,
                    ignore_blocked,
                    api_token: api_token.clone(),
                },
                output_format,
            )
            .await
        }
        Commands::Deploy {
            environment,
            dry_run,
            no_rollback,
            parallelism,
            ignore_blocked,
            domain,
            all,
            report,
        } => {
            commands::deploy::run(
                &ctx,
                commands::deploy::DeployArgs {
                    service_path,
                    environment,
                    dry_run,
                    no_rollback,
                    parallelism,
                    ignore_blocked,
                    domain,
                    all,
                    report,
                },
                output_format,
            )
            .await
        }
        Commands::Rollback { list, to_version, dry_run } => {
            commands::rollback::run(&ctx, commands::rollback::RollbackArgs { list, to_version, dry_run }, output_format).await
        }
        Commands::Status { detailed, json } => {
            commands::status::run(&ctx, commands::status::StatusArgs { detailed, json }, output_format).await
        }
        Commands::Clean { older_than } => commands::clean::run(&ctx, commands::clean::CleanArgs { older_than }).await,
        Commands::Export { output } => commands::export::run(&ctx, &output).await,
        Commands::Import { input } => commands::import::run(&ctx, &input).await,
    }
}

fn is_interactive() -> bool {
    use std::io::IsTerminal;
    std::io::stdin().is_terminal()
}
