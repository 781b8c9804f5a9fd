// src/audit/accessibility.rs
// =============================================================================
// The accessibility audit that runs after a successful site report.
//
// It's a trait so the report pipeline doesn't care how the audit is done.
// The real implementation, AccessibilityCommand, shells out to an external
// checker (pa11y by default) against the seed URL, supervised the same way
// as the batch audit tool.
//
// Rust concepts:
// - async-trait: Traits can't have async methods usable through `dyn`
//   on their own, the #[async_trait] macro boxes the futures for us
// - Send + Sync: The audit may be called from any tokio worker thread
// =============================================================================

use super::supervisor::supervise_child;
use crate::config::{ReportConfig, ToolCommand};
use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{info, warn};

#[async_trait]
pub trait AccessibilityAudit: Send + Sync {
    /// Runs the audit to completion with the report's configuration.
    async fn run(&self, config: &ReportConfig) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct AccessibilityCommand {
    tool: ToolCommand,
}

impl AccessibilityCommand {
    pub fn new(tool: ToolCommand) -> Self {
        Self { tool }
    }

    pub fn from_config(config: &ReportConfig) -> Self {
        Self::new(config.accessibility_tool.clone())
    }
}

#[async_trait]
impl AccessibilityAudit for AccessibilityCommand {
    async fn run(&self, config: &ReportConfig) -> Result<()> {
        let url = config
            .url
            .as_deref()
            .context("No site specified for the accessibility audit")?;

        info!("Beginning accessibility audit of {}", url);

        let mut command = self.tool.command();
        command.arg(url);

        let exit = supervise_child(
            command,
            &self.tool.program,
            config.verbose,
            config.audit_deadline(),
        )
        .await
        .with_context(|| format!("accessibility audit with '{}'", self.tool))?;

        match exit.code {
            Some(0) => info!("Accessibility audit complete, no issues reported"),
            Some(code) => warn!("Accessibility audit finished with exit code {}", code),
            None => warn!("Accessibility audit was terminated by a signal"),
        }

        Ok(())
    }
}

// Test double that records each call instead of running anything.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct RecordingAudit {
    calls: std::sync::atomic::AtomicUsize,
    last_config: std::sync::Mutex<Option<ReportConfig>>,
    fail: bool,
}

#[cfg(test)]
impl RecordingAudit {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }

    pub fn last_config(&self) -> Option<ReportConfig> {
        self.last_config.lock().unwrap().clone()
    }
}

#[cfg(test)]
#[async_trait]
impl AccessibilityAudit for RecordingAudit {
    async fn run(&self, config: &ReportConfig) -> Result<()> {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        info!("recording accessibility audit for {:?}", config.url);
        *self.last_config.lock().unwrap() = Some(config.clone());
        if self.fail {
            anyhow::bail!("recording audit told to fail");
        }
        Ok(())
    }
}
