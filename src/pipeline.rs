// src/pipeline.rs
// =============================================================================
// Ties one report run together.
//
//   Idle -> Fetching -> Classifying -> Auditing -> Success
//                 \                            \-> KnownFailure
//                  \-> FetchFailed              \-> UnknownFailure
//
// Each run owns its own Frontier. Nothing is shared between runs, so two
// reports in the same process can't see each other's URLs.
// =============================================================================

use crate::audit::{run_audit, AccessibilityAudit, AuditReport};
use crate::config::ReportConfig;
use crate::crawl::{self, Frontier, Origin};
use crate::error::PipelineError;
use scraper::Html;
use serde::Serialize;
use std::fmt;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Idle,
    Fetching,
    Classifying,
    Auditing,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Idle => "idle",
            Stage::Fetching => "fetching",
            Stage::Classifying => "classifying",
            Stage::Auditing => "auditing",
        };
        f.write_str(name)
    }
}

/// Everything a completed run found and observed.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub seed: String,
    pub origin: Origin,
    pub frontier: Frontier,
    /// Anchors that produced a kept URL, duplicates included
    pub pages_found: usize,
    pub audit: AuditReport,
}

// Runs the whole pipeline for one seed URL.
//
// Returns Err only when the run stopped early (no URL, fetch failed) or an
// audit process couldn't be supervised. Audit tool failures come back as
// Ok with the outcome recorded in `audit`.
pub async fn run_report<A>(
    config: &ReportConfig,
    accessibility: &A,
) -> Result<RunReport, PipelineError>
where
    A: AccessibilityAudit + ?Sized,
{
    let seed = config.url.as_deref().ok_or(PipelineError::NoSeedUrl)?;
    debug!("Beginning reports for {}", seed);

    enter(Stage::Fetching);
    let client = crawl::build_client(config.fetch_timeout())?;
    let page = crawl::fetch_page(&client, seed).await?;
    let origin = page.origin()?;

    enter(Stage::Classifying);
    info!("Beginning search of {}", origin);
    // Html isn't Send, so keep it out of scope before the next await
    let collection = {
        let document = Html::parse_document(&page.html);
        crawl::collect_links(&document, &origin)
    };
    info!("Found {} pages", collection.kept);
    debug!("Frontier: {:?}", collection.frontier.as_slice());

    enter(Stage::Auditing);
    let audit = run_audit(&collection.frontier, config, accessibility).await?;

    Ok(RunReport {
        seed: seed.to_string(),
        origin,
        frontier: collection.frontier,
        pages_found: collection.kept,
        audit,
    })
}

fn enter(stage: Stage) {
    debug!(%stage, "entering stage");
}

/// Machine-readable result of a run, printed with --json.
#[derive(Debug, Clone, Serialize)]
pub struct ReportSummary {
    pub status: &'static str,
    pub phase: Stage,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    pub urls: Vec<String>,
}

impl ReportSummary {
    pub fn from_result(result: &Result<RunReport, PipelineError>) -> Self {
        match result {
            Ok(report) => Self {
                status: report.audit.outcome.as_str(),
                phase: Stage::Auditing,
                message: report.audit.outcome.message(),
                exit_code: report.audit.exit_code,
                urls: report.frontier.as_slice().to_vec(),
            },
            Err(err) => Self {
                status: err.kind(),
                phase: err.stage(),
                message: err.to_string(),
                exit_code: None,
                urls: Vec::new(),
            },
        }
    }
}
