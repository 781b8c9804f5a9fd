// src/error.rs
// =============================================================================
// Error types for each phase of a report run.
//
// - FetchError: the seed page could not be fetched
// - AuditError: an external audit process could not be supervised
// - PipelineError: what the pipeline hands back to the CLI, tagged with the
//   stage it came from
//
// A nonzero exit code from the audit tool is NOT an error. It is an
// AuditOutcome (see audit/supervisor.rs) and the run still ends normally.
// =============================================================================

use crate::pipeline::Stage;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Could not build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Request to {url} timed out")]
    Timeout { url: String },

    #[error("Request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP {status} from {url}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("{url} has no host to search")]
    NoHost { url: String },
}

#[derive(Error, Debug)]
pub enum AuditError {
    #[error("Could not start '{tool}': {source}")]
    Launch {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Lost track of '{tool}' while waiting for it: {source}")]
    Wait {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{tool}' did not finish within {}s and was killed", .after.as_secs())]
    Timeout { tool: String, after: Duration },

    #[error("Accessibility audit failed: {0:#}")]
    Accessibility(anyhow::Error),
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("No site specified. Stopping. Use --help for more information.")]
    NoSeedUrl,

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Audit(#[from] AuditError),
}

impl PipelineError {
    /// The stage the run was in when it stopped.
    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::NoSeedUrl => Stage::Idle,
            PipelineError::Fetch(_) => Stage::Fetching,
            PipelineError::Audit(_) => Stage::Auditing,
        }
    }

    /// Short machine-readable kind, used in the --json summary.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::NoSeedUrl => "no_site",
            PipelineError::Fetch(_) => "fetch_failed",
            PipelineError::Audit(AuditError::Launch { .. }) => "launch_failed",
            PipelineError::Audit(AuditError::Wait { .. }) => "wait_failed",
            PipelineError::Audit(AuditError::Timeout { .. }) => "timed_out",
            PipelineError::Audit(AuditError::Accessibility(_)) => "accessibility_failed",
        }
    }

    // Configuration and fetch errors end the run quietly; anything that
    // broke while supervising a process is fatal.
    pub fn is_fatal(&self) -> bool {
        matches!(self, PipelineError::Audit(_))
    }
}
