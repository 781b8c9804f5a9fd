// src/audit/supervisor.rs
// =============================================================================
// Runs the external batch audit tool over the frontier and branches on how
// it exits.
//
// How it works:
// 1. Serialize the frontier as one comma-joined string
// 2. Spawn `<tool> -s <urls> --html --out=<path> -v`
// 3. Forward stdout to the log line by line while it runs; stderr too,
//    but only in verbose mode
// 4. Once the process has exited and both pipes are drained, look at the
//    exit code:
//      0     -> success, then chain the accessibility audit if enabled
//      1     -> known failure, tell the operator to retry with --verbose
//      other -> unknown failure, ask for it to be reported
// 5. Always finish with a line carrying the raw exit code
//
// Nonzero exit codes are outcomes, not errors. Only failing to start,
// failing to wait, or blowing the deadline produce an AuditError.
// =============================================================================

use super::accessibility::AccessibilityAudit;
use crate::config::{ReportConfig, ToolCommand};
use crate::crawl::Frontier;
use crate::error::AuditError;
use std::fmt;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::task::AbortHandle;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditState {
    Pending,
    Running,
    /// `code` is None when the process was killed by a signal
    Exited { code: Option<i32> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditOutcome {
    Success,
    KnownFailure,
    UnknownFailure { code: Option<i32> },
}

impl AuditOutcome {
    pub fn from_exit_code(code: Option<i32>) -> Self {
        match code {
            Some(0) => AuditOutcome::Success,
            Some(1) => AuditOutcome::KnownFailure,
            other => AuditOutcome::UnknownFailure { code: other },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, AuditOutcome::Success)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AuditOutcome::Success => "success",
            AuditOutcome::KnownFailure => "known_failure",
            AuditOutcome::UnknownFailure { .. } => "unknown_failure",
        }
    }

    /// The line logged for this outcome.
    pub fn message(&self) -> String {
        match self {
            AuditOutcome::Success => "Report creation successful!! Code: 0".to_string(),
            AuditOutcome::KnownFailure => {
                "Something didn't work! Run again with --verbose and check the error output! Code: 1"
                    .to_string()
            }
            AuditOutcome::UnknownFailure { code } => format!(
                "Oops. The audit tool exited with an unknown exit code: {}. Please report this upstream!",
                ExitCode(*code)
            ),
        }
    }
}

// Displays an exit code, or says there wasn't one
struct ExitCode(Option<i32>);

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(code) => write!(f, "{}", code),
            None => f.write_str("none (terminated by signal)"),
        }
    }
}

/// What a finished audit run observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditReport {
    pub outcome: AuditOutcome,
    pub exit_code: Option<i32>,
    pub accessibility_ran: bool,
    pub stdout_lines: usize,
}

// One invocation of the audit tool.
//
// The frontier is serialized when the run is created, so later changes to
// the Frontier value can't leak into a run that's already set up.
#[derive(Debug)]
pub struct AuditRun {
    tool: ToolCommand,
    targets: String,
    out_path: PathBuf,
    verbose: bool,
    deadline: Option<Duration>,
    state: AuditState,
}

impl AuditRun {
    pub fn new(frontier: &Frontier, config: &ReportConfig) -> Self {
        Self {
            tool: config.audit_tool.clone(),
            targets: frontier.to_csv(),
            out_path: config.out_path.clone(),
            verbose: config.verbose,
            deadline: config.audit_deadline(),
            state: AuditState::Pending,
        }
    }

    pub fn state(&self) -> AuditState {
        self.state
    }

    pub fn targets(&self) -> &str {
        &self.targets
    }

    /// Arguments appended after the tool's own leading arguments.
    pub fn args(&self) -> Vec<String> {
        vec![
            "-s".to_string(),
            self.targets.clone(),
            "--html".to_string(),
            format!("--out={}", self.out_path.display()),
            "-v".to_string(),
        ]
    }

    /// Runs the tool to completion and handles whichever branch its exit
    /// code selects, including the accessibility chain on success.
    pub async fn execute<A>(
        &mut self,
        config: &ReportConfig,
        accessibility: &A,
    ) -> Result<AuditReport, AuditError>
    where
        A: AccessibilityAudit + ?Sized,
    {
        info!("Beginning report process. This can take some time!!");

        let mut command = self.tool.command();
        command.args(self.args());

        self.state = AuditState::Running;
        let exit = supervise_child(command, &self.tool.program, self.verbose, self.deadline).await?;
        self.state = AuditState::Exited { code: exit.code };
        debug!(state = ?self.state(), "audit process closed");

        let outcome = AuditOutcome::from_exit_code(exit.code);
        match outcome {
            AuditOutcome::Success => info!("{}", outcome.message()),
            AuditOutcome::KnownFailure => warn!("{}", outcome.message()),
            AuditOutcome::UnknownFailure { .. } => error!("{}", outcome.message()),
        }

        let mut accessibility_ran = false;
        let chained = if outcome.is_success() && config.accessibility {
            accessibility_ran = true;
            accessibility.run(config).await
        } else {
            Ok(())
        };

        info!("child process exited with code {}", ExitCode(exit.code));
        chained.map_err(AuditError::Accessibility)?;

        Ok(AuditReport {
            outcome,
            exit_code: exit.code,
            accessibility_ran,
            stdout_lines: exit.stdout_lines,
        })
    }
}

/// Runs one audit over a frozen frontier.
pub async fn run_audit<A>(
    frontier: &Frontier,
    config: &ReportConfig,
    accessibility: &A,
) -> Result<AuditReport, AuditError>
where
    A: AccessibilityAudit + ?Sized,
{
    let mut run = AuditRun::new(frontier, config);
    debug!("Auditing {} page(s): {}", frontier.len(), run.targets());
    run.execute(config, accessibility).await
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct ChildExit {
    pub code: Option<i32>,
    pub stdout_lines: usize,
}

#[derive(Debug, Clone, Copy)]
enum Pipe {
    Stdout,
    Stderr { verbose: bool },
}

// Spawns `command`, forwards its output, and waits for it to exit.
//
// Shared with the accessibility audit. The deadline bounds both the exit
// and the pipes closing; on expiry the child is killed.
pub(crate) async fn supervise_child(
    mut command: Command,
    tool: &str,
    verbose: bool,
    deadline: Option<Duration>,
) -> Result<ChildExit, AuditError> {
    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = command.spawn().map_err(|source| AuditError::Launch {
        tool: tool.to_string(),
        source,
    })?;
    debug!("Started {} (pid {:?})", tool, child.id());

    let stdout_pump = child
        .stdout
        .take()
        .map(|out| tokio::spawn(forward_lines(out, Pipe::Stdout)));
    let stderr_pump = child
        .stderr
        .take()
        .map(|err| tokio::spawn(forward_lines(err, Pipe::Stderr { verbose })));

    let pumps: Vec<AbortHandle> = stdout_pump
        .iter()
        .chain(stderr_pump.iter())
        .map(|pump| pump.abort_handle())
        .collect();

    // Exit plus both pipes closing; a grandchild holding stdout keeps the
    // run open, so the deadline has to cover the drain too
    let running = &mut child;
    let finished = async move {
        let status = running.wait().await?;
        let mut stdout_lines = 0;
        if let Some(pump) = stdout_pump {
            stdout_lines = pump.await.unwrap_or(0);
        }
        if let Some(pump) = stderr_pump {
            let _ = pump.await;
        }
        Ok::<_, std::io::Error>((status, stdout_lines))
    };

    let finished = match deadline {
        Some(after) => {
            let bounded = tokio::time::timeout(after, finished).await;
            match bounded {
                Ok(finished) => finished,
                Err(_) => {
                    // the child may already be gone, nothing more to do then
                    let _ = child.kill().await;
                    for pump in &pumps {
                        pump.abort();
                    }
                    return Err(AuditError::Timeout {
                        tool: tool.to_string(),
                        after,
                    });
                }
            }
        }
        None => finished.await,
    };
    let (status, stdout_lines) = finished.map_err(|source| AuditError::Wait {
        tool: tool.to_string(),
        source,
    })?;

    Ok(ChildExit {
        code: status.code(),
        stdout_lines,
    })
}

// Reads a pipe to EOF, logging each line. Returns how many lines it saw.
// Lines are decoded lossily so stray non-UTF-8 bytes never stop the drain;
// quiet stderr is still read so the child never blocks or hits SIGPIPE.
async fn forward_lines<R>(reader: R, pipe: Pipe) -> usize
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    let mut count = 0;

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                count += 1;
                let text = String::from_utf8_lossy(&buf);
                let line = text.trim_end_matches(['\n', '\r']);
                match pipe {
                    Pipe::Stdout => info!("- {}", line),
                    Pipe::Stderr { verbose: true } => debug!("-err {}", line),
                    Pipe::Stderr { verbose: false } => {}
                }
            }
            Err(e) => {
                debug!("Stopped reading child output: {}", e);
                break;
            }
        }
    }

    count
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why tokio::process instead of std::process?
//    - std's Child::wait() blocks the thread until the process exits
//    - tokio's version is a future, so the runtime keeps reading the
//      output pipes while we wait
//
// 2. Why read stdout and stderr in separate tasks?
//    - A child that fills one pipe while we only read the other would
//      block forever; spawning one reader per pipe avoids that
//
// 3. What is Option<i32> for the exit code?
//    - On Unix a process killed by a signal has no exit code at all,
//      so status.code() returns None
//
// 4. What does kill_on_drop(true) do?
//    - If the Child value is dropped (say the run is abandoned), tokio
//      kills the process instead of leaving it running in the background
// -----------------------------------------------------------------------------

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::audit::accessibility::RecordingAudit;
    use crate::test_log::capture_logs;
    use std::time::Instant;

    // `sh -c <script> audit-tool` so the supervisor's own arguments land in $1..$5
    fn config_with_script(script: &str) -> ReportConfig {
        ReportConfig {
            audit_tool: ToolCommand::new("sh").with_args(["-c", script, "audit-tool"]),
            out_path: PathBuf::from("/tmp/site-report-test"),
            ..ReportConfig::for_url("https://example.com")
        }
    }

    fn frontier(urls: &[&str]) -> Frontier {
        let mut frontier = Frontier::new();
        for url in urls {
            frontier.insert(url.to_string());
        }
        frontier
    }

    #[test]
    fn test_exit_code_branches() {
        assert_eq!(AuditOutcome::from_exit_code(Some(0)), AuditOutcome::Success);
        assert_eq!(AuditOutcome::from_exit_code(Some(1)), AuditOutcome::KnownFailure);
        assert_eq!(
            AuditOutcome::from_exit_code(Some(42)),
            AuditOutcome::UnknownFailure { code: Some(42) }
        );
        assert_eq!(
            AuditOutcome::from_exit_code(None),
            AuditOutcome::UnknownFailure { code: None }
        );
    }

    #[test]
    fn test_run_starts_pending_with_tool_arguments() {
        let config = config_with_script("exit 0");
        let run = AuditRun::new(&frontier(&["https://example.com/a", "https://example.com/b"]), &config);
        assert_eq!(run.state(), AuditState::Pending);
        assert_eq!(run.targets(), "https://example.com/a,https://example.com/b");
        assert_eq!(
            run.args(),
            [
                "-s",
                "https://example.com/a,https://example.com/b",
                "--html",
                "--out=/tmp/site-report-test",
                "-v"
            ]
        );
    }

    #[tokio::test]
    async fn test_success_chains_accessibility_once() {
        let config = config_with_script("exit 0");
        let accessibility = RecordingAudit::default();

        let mut run = AuditRun::new(&frontier(&["https://example.com/a"]), &config);
        let report = run.execute(&config, &accessibility).await.unwrap();

        assert_eq!(report.outcome, AuditOutcome::Success);
        assert!(report.accessibility_ran);
        assert_eq!(run.state(), AuditState::Exited { code: Some(0) });
        assert_eq!(accessibility.calls(), 1);
        assert_eq!(accessibility.last_config(), Some(config));
    }

    #[tokio::test]
    async fn test_success_without_accessibility_flag() {
        let config = ReportConfig {
            accessibility: false,
            ..config_with_script("exit 0")
        };
        let accessibility = RecordingAudit::default();

        let report = run_audit(&frontier(&["https://example.com/"]), &config, &accessibility)
            .await
            .unwrap();
        assert!(report.outcome.is_success());
        assert!(!report.accessibility_ran);
        assert_eq!(accessibility.calls(), 0);
    }

    #[tokio::test]
    async fn test_success_logs_exit_line_after_accessibility() {
        let (logs, _guard) = capture_logs();
        let config = config_with_script("exit 0");

        run_audit(&frontier(&["https://example.com/"]), &config, &RecordingAudit::default())
            .await
            .unwrap();

        let lines = logs.lines();
        let success = lines.iter().position(|l| l.contains("Report creation successful"));
        let chained = lines.iter().position(|l| l.contains("recording accessibility audit"));
        assert!(success.is_some() && chained.is_some());
        assert!(success < chained);
        assert!(lines.last().unwrap().contains("child process exited with code 0"));
    }

    #[tokio::test]
    async fn test_known_failure_skips_chain() {
        let (logs, _guard) = capture_logs();
        let config = config_with_script("exit 1");
        let accessibility = RecordingAudit::default();

        let report = run_audit(&frontier(&["https://example.com/"]), &config, &accessibility)
            .await
            .unwrap();
        assert_eq!(report.outcome, AuditOutcome::KnownFailure);
        assert_eq!(accessibility.calls(), 0);

        assert_eq!(logs.matching("Run again with --verbose").len(), 1);
        assert!(logs.matching("recording accessibility audit").is_empty());
        let lines = logs.lines();
        assert!(lines.last().unwrap().contains("child process exited with code 1"));
    }

    #[tokio::test]
    async fn test_unknown_exit_code_is_reported() {
        let (logs, _guard) = capture_logs();
        let config = config_with_script("exit 42");
        let accessibility = RecordingAudit::default();

        let report = run_audit(&frontier(&["https://example.com/"]), &config, &accessibility)
            .await
            .unwrap();
        assert_eq!(report.outcome, AuditOutcome::UnknownFailure { code: Some(42) });
        assert_eq!(report.exit_code, Some(42));
        assert_eq!(accessibility.calls(), 0);

        assert_eq!(logs.matching("unknown exit code: 42").len(), 1);
        let lines = logs.lines();
        assert!(lines.last().unwrap().contains("child process exited with code 42"));
    }

    #[tokio::test]
    async fn test_non_utf8_output_keeps_draining() {
        let script = r#"printf '\377\n'; printf '\376\n' >&2; sleep 0.2
            i=0; while [ $i -lt 500 ]; do echo after; echo after >&2; i=$((i+1)); done; exit 0"#;
        let config = config_with_script(script);
        let accessibility = RecordingAudit::default();

        let report = run_audit(&Frontier::new(), &config, &accessibility)
            .await
            .unwrap();
        assert_eq!(report.outcome, AuditOutcome::Success);
        assert_eq!(report.stdout_lines, 501);
        assert_eq!(accessibility.calls(), 1);
    }

    #[tokio::test]
    async fn test_tool_receives_expected_arguments() {
        let script = r#"[ "$1" = "-s" ] && [ "$2" = "https://example.com/a,https://example.com/b" ] \
            && [ "$3" = "--html" ] && [ "$4" = "--out=/tmp/site-report-test" ] && [ "$5" = "-v" ] || exit 3"#;
        let config = config_with_script(script);

        let report = run_audit(
            &frontier(&["https://example.com/a", "https://example.com/b"]),
            &config,
            &RecordingAudit::default(),
        )
        .await
        .unwrap();
        assert_eq!(report.exit_code, Some(0));
    }

    #[tokio::test]
    async fn test_empty_frontier_still_invokes_tool() {
        let config = ReportConfig {
            accessibility: false,
            ..config_with_script(r#"[ -z "$2" ] || exit 3"#)
        };

        let report = run_audit(&Frontier::new(), &config, &RecordingAudit::default())
            .await
            .unwrap();
        assert_eq!(report.outcome, AuditOutcome::Success);
    }

    #[tokio::test]
    async fn test_stdout_is_forwarded_line_by_line() {
        let config = ReportConfig {
            accessibility: false,
            ..config_with_script("echo one; echo two; echo oops >&2")
        };

        let report = run_audit(&Frontier::new(), &config, &RecordingAudit::default())
            .await
            .unwrap();
        assert_eq!(report.stdout_lines, 2);
    }

    #[tokio::test]
    async fn test_missing_tool_is_launch_error() {
        let config = ReportConfig {
            audit_tool: ToolCommand::new("/nonexistent/lighthouse-batch"),
            ..ReportConfig::for_url("https://example.com")
        };
        let accessibility = RecordingAudit::default();

        let err = run_audit(&Frontier::new(), &config, &accessibility)
            .await
            .unwrap_err();
        assert!(matches!(err, AuditError::Launch { .. }));
        assert_eq!(accessibility.calls(), 0);
    }

    #[tokio::test]
    async fn test_hung_tool_is_killed_at_deadline() {
        let config = ReportConfig {
            audit_timeout_secs: 1,
            ..config_with_script("sleep 30")
        };

        let err = run_audit(&Frontier::new(), &config, &RecordingAudit::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AuditError::Timeout { .. }));
    }

    #[tokio::test]
    async fn test_deadline_covers_grandchild_holding_stdout() {
        let config = ReportConfig {
            audit_timeout_secs: 1,
            ..config_with_script("sleep 6 & exit 0")
        };

        let started = Instant::now();
        let err = run_audit(&Frontier::new(), &config, &RecordingAudit::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AuditError::Timeout { .. }));
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[tokio::test]
    async fn test_failing_accessibility_is_an_error() {
        let config = config_with_script("exit 0");
        let accessibility = RecordingAudit::failing();

        let err = run_audit(&Frontier::new(), &config, &accessibility)
            .await
            .unwrap_err();
        assert!(matches!(err, AuditError::Accessibility(_)));
        assert_eq!(accessibility.calls(), 1);
    }
}
