// src/config.rs
// =============================================================================
// The validated configuration that flows through one report run.
//
// The CLI layer builds a ReportConfig from command-line flags (and their
// SITE_REPORT_* environment fallbacks). The pipeline, the audit supervisor
// and the accessibility audit all read from the same value, and the
// accessibility audit receives it unchanged.
// =============================================================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Default executable for the batch page audit.
pub const DEFAULT_AUDIT_TOOL: &str = "lighthouse-batch";

/// Default executable for the follow-up accessibility audit.
pub const DEFAULT_ACCESSIBILITY_TOOL: &str = "pa11y";

/// Default directory the audit tool writes its reports into.
pub const DEFAULT_REPORT_PATH: &str = "./report/lighthouse";

pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_AUDIT_TIMEOUT_SECS: u64 = 1800;

// An external program plus any leading arguments we always pass to it.
//
// Extra arguments are appended per invocation, e.g. the audit supervisor
// appends `-s <urls> --html --out=<path> -v`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCommand {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl ToolCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Builds a tokio Command for this tool with the leading arguments applied.
    pub fn command(&self) -> tokio::process::Command {
        let mut command = tokio::process::Command::new(&self.program);
        command.args(&self.args);
        command
    }
}

impl fmt::Display for ToolCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

// Everything a report run needs to know.
//
// Derives PartialEq so tests can check the accessibility audit was handed
// the exact same configuration the report started with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Seed page to discover links from
    pub url: Option<String>,
    /// Chain the accessibility audit after a successful report
    pub accessibility: bool,
    /// Log classification decisions and the tools' error output
    pub verbose: bool,
    /// Where the audit tool writes its report
    pub out_path: PathBuf,
    pub audit_tool: ToolCommand,
    pub accessibility_tool: ToolCommand,
    pub fetch_timeout_secs: u64,
    /// 0 disables the deadline
    pub audit_timeout_secs: u64,
}

impl ReportConfig {
    pub fn for_url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::default()
        }
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    /// Deadline for an external audit process, or None when disabled.
    pub fn audit_deadline(&self) -> Option<Duration> {
        if self.audit_timeout_secs > 0 {
            Some(Duration::from_secs(self.audit_timeout_secs))
        } else {
            None
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            url: None,
            accessibility: true,
            verbose: false,
            out_path: PathBuf::from(DEFAULT_REPORT_PATH),
            audit_tool: ToolCommand::new(DEFAULT_AUDIT_TOOL),
            accessibility_tool: ToolCommand::new(DEFAULT_ACCESSIBILITY_TOOL),
            fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
            audit_timeout_secs: DEFAULT_AUDIT_TIMEOUT_SECS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_chain_accessibility() {
        let config = ReportConfig::default();
        assert!(config.accessibility);
        assert!(!config.verbose);
        assert_eq!(config.audit_tool.program, "lighthouse-batch");
        assert_eq!(config.audit_deadline(), Some(Duration::from_secs(1800)));
    }

    #[test]
    fn test_zero_timeout_disables_deadline() {
        let config = ReportConfig {
            audit_timeout_secs: 0,
            ..ReportConfig::default()
        };
        assert_eq!(config.audit_deadline(), None);
    }

    #[test]
    fn test_tool_command_display() {
        let tool = ToolCommand::new("sh").with_args(["-c", "exit 0"]);
        assert_eq!(tool.to_string(), "sh -c exit 0");
    }
}
