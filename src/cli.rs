// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// We use the "derive" API which lets us define the CLI structure using
// Rust structs and attributes (the #[...] things). Every tunable flag can
// also come from a SITE_REPORT_* environment variable (clap's "env"
// feature), which is handy in CI.
//
// The CLI's only job is to turn arguments into a ReportConfig. All the
// real work happens in pipeline.rs.
// =============================================================================

use crate::config::{
    ReportConfig, ToolCommand, DEFAULT_ACCESSIBILITY_TOOL, DEFAULT_AUDIT_TIMEOUT_SECS,
    DEFAULT_AUDIT_TOOL, DEFAULT_FETCH_TIMEOUT_SECS, DEFAULT_REPORT_PATH,
};
use clap::builder::{PossibleValuesParser, TypedValueParser};
use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "site-report",
    version,
    about = "Discover a site's pages and run a batch page audit across them",
    long_about = "site-report collects the internal links on a seed page, runs a batch \
                  page audit over every page it found, and follows up with an \
                  accessibility audit when the report succeeds."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a full site report against the target URL
    ///
    /// Example: site-report report https://www.example.com
    Report(ReportArgs),

    /// Run only the accessibility audit against the target URL
    ///
    /// Example: site-report accessibility https://www.example.com
    Accessibility(AccessibilityArgs),
}

impl Commands {
    pub fn verbose(&self) -> bool {
        match self {
            Commands::Report(args) => args.common.verbose,
            Commands::Accessibility(args) => args.common.verbose,
        }
    }
}

// Flags both subcommands share
#[derive(Args, Debug)]
pub struct CommonArgs {
    /// Turn on verbose logging
    #[arg(short, long, env = "SITE_REPORT_VERBOSE")]
    pub verbose: bool,

    /// Accessibility checker executable
    #[arg(long, default_value = DEFAULT_ACCESSIBILITY_TOOL, env = "SITE_REPORT_ACCESSIBILITY_TOOL")]
    pub accessibility_tool: String,

    /// Seconds an audit tool may run before it's killed (0 = no limit)
    #[arg(long, default_value_t = DEFAULT_AUDIT_TIMEOUT_SECS, env = "SITE_REPORT_AUDIT_TIMEOUT")]
    pub audit_timeout: u64,
}

#[derive(Args, Debug)]
pub struct ReportArgs {
    /// url of site to run report against, example: https://www.example.com
    pub url: Option<String>,

    /// Run an accessibility audit after the site report
    ///
    /// Pass `-a false` (or `--accessibility=false`) to skip it. Only
    /// `true` and `false` are accepted as values, so a bare `-a` should
    /// come after the url.
    #[arg(
        short,
        long,
        default_value_t = true,
        num_args = 0..=1,
        default_missing_value = "true",
        value_parser = PossibleValuesParser::new(["true", "false"]).map(|v| v == "true"),
        action = ArgAction::Set,
        env = "SITE_REPORT_ACCESSIBILITY"
    )]
    pub accessibility: bool,

    #[command(flatten)]
    pub common: CommonArgs,

    /// Print a JSON summary of the run to stdout
    #[arg(long)]
    pub json: bool,

    /// Directory the audit tool writes its report into
    #[arg(long, default_value = DEFAULT_REPORT_PATH, env = "SITE_REPORT_OUT")]
    pub out: PathBuf,

    /// Batch page audit executable
    #[arg(long, default_value = DEFAULT_AUDIT_TOOL, env = "SITE_REPORT_AUDIT_TOOL")]
    pub audit_tool: String,

    /// Seconds to wait for the seed page
    #[arg(long, default_value_t = DEFAULT_FETCH_TIMEOUT_SECS, env = "SITE_REPORT_FETCH_TIMEOUT")]
    pub fetch_timeout: u64,
}

impl ReportArgs {
    pub fn to_config(&self) -> ReportConfig {
        ReportConfig {
            url: self.url.clone(),
            accessibility: self.accessibility,
            verbose: self.common.verbose,
            out_path: self.out.clone(),
            audit_tool: ToolCommand::new(&self.audit_tool),
            accessibility_tool: ToolCommand::new(&self.common.accessibility_tool),
            fetch_timeout_secs: self.fetch_timeout,
            audit_timeout_secs: self.common.audit_timeout,
        }
    }
}

#[derive(Args, Debug)]
pub struct AccessibilityArgs {
    /// url of site to audit, example: https://www.example.com
    pub url: Option<String>,

    #[command(flatten)]
    pub common: CommonArgs,
}

impl AccessibilityArgs {
    pub fn to_config(&self) -> ReportConfig {
        ReportConfig {
            url: self.url.clone(),
            verbose: self.common.verbose,
            accessibility_tool: ToolCommand::new(&self.common.accessibility_tool),
            audit_timeout_secs: self.common.audit_timeout,
            ..ReportConfig::default()
        }
    }
}
