// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Set up logging (tracing), louder with --verbose
// 3. Dispatch to the appropriate subcommand handler
// 4. Exit with code 0, or 2 when an audit process couldn't be supervised
//
// Audit results themselves never change the exit code; they're reported
// through the log (and --json).
// =============================================================================

mod audit;
mod cli;
mod config;
mod crawl;
mod error;
mod pipeline;
#[cfg(test)]
mod test_log;

use anyhow::Result;
use audit::{AccessibilityAudit, AccessibilityCommand};
use clap::Parser;
use cli::{Cli, Commands};
use config::ReportConfig;
use pipeline::ReportSummary;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.command.verbose());

    let exit_code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

// RUST_LOG wins if set; otherwise our own crate logs at info, or debug
// when verbose, and dependencies stay at warn
fn init_tracing(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,site_report={}", level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();
}

async fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Commands::Report(args) => handle_report(args.to_config(), args.json).await,
        Commands::Accessibility(args) => handle_accessibility(args.to_config()).await,
    }
}

async fn handle_report(config: ReportConfig, json: bool) -> Result<i32> {
    let accessibility = AccessibilityCommand::from_config(&config);
    let result = pipeline::run_report(&config, &accessibility).await;

    if json {
        let summary = ReportSummary::from_result(&result);
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }

    match result {
        Ok(report) => {
            info!(
                "Audited {} page(s) discovered on {}",
                report.frontier.len(),
                report.seed
            );
            Ok(0)
        }
        Err(err) if err.is_fatal() => {
            error!(phase = %err.stage(), "{}", err);
            Ok(2)
        }
        Err(err) => {
            warn!("{}", err);
            Ok(0)
        }
    }
}

async fn handle_accessibility(config: ReportConfig) -> Result<i32> {
    if config.url.is_none() {
        warn!("No site specified. Stopping. Use --help for more information.");
        return Ok(0);
    }

    AccessibilityCommand::from_config(&config).run(&config).await?;
    Ok(0)
}
