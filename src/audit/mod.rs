// src/audit/mod.rs
// =============================================================================
// This module drives the external audit tools.
//
// Submodules:
// - supervisor: runs the batch page audit over the frontier and branches
//   on its exit code
// - accessibility: the follow-up accessibility audit chained on success
// =============================================================================

mod accessibility;
mod supervisor;

pub use accessibility::{AccessibilityAudit, AccessibilityCommand};
pub use supervisor::{run_audit, AuditReport};

#[cfg(test)]
pub(crate) use accessibility::RecordingAudit;
