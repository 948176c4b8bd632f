//! Background scan worker
//!
//! Runs the scan engine against one target and streams the outcome into the
//! job's log file:
//!
//! ```text
//! START ──► RUNNING ──► COMPLETE
//!                 └───► FAILED
//! ```
//!
//! Every transition writes one line; findings are written one per line
//! between the start and completion markers.

use super::job::{parse_report, unique_token, Finding};
use crate::config::ScannerConfig;
use crate::logsink::LogSink;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Terminal state of a worker run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    Complete,
    Failed,
}

/// Summary of a worker run (the log file is the authoritative record)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOutcome {
    pub state: ScanState,
    pub findings: usize,
}

/// How the engine process ended
enum EngineExit {
    Exited { code: Option<i32>, stderr: String },
    TimedOut(Duration),
}

/// Runs one scan engine invocation per job
#[derive(Debug, Clone)]
pub struct ScanWorker {
    engine: String,
    engine_args: Vec<String>,
    report_dir: PathBuf,
    timeout: Option<Duration>,
    redact_secrets: bool,
}

impl ScanWorker {
    /// Create a worker for `engine`, reports under the temp dir
    pub fn new(engine: impl Into<String>) -> Self {
        Self {
            engine: engine.into(),
            engine_args: Vec::new(),
            report_dir: std::env::temp_dir(),
            timeout: None,
            redact_secrets: true,
        }
    }

    /// Build from configuration
    pub fn from_config(config: &ScannerConfig) -> Self {
        Self {
            engine: config.engine.clone(),
            engine_args: config.engine_args.clone(),
            report_dir: config.report_dir.clone(),
            timeout: (config.timeout_secs > 0).then(|| Duration::from_secs(config.timeout_secs)),
            redact_secrets: config.redact_secrets,
        }
    }

    /// Arguments placed before `detect ...`
    pub fn with_engine_args(mut self, args: Vec<String>) -> Self {
        self.engine_args = args;
        self
    }

    /// Directory for temporary reports
    pub fn with_report_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.report_dir = dir.into();
        self
    }

    /// Engine deadline
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Whether FINDING lines mask the secret
    pub fn with_redaction(mut self, redact: bool) -> Self {
        self.redact_secrets = redact;
        self
    }

    /// Scan `target`, writing progress and findings to `log_file`.
    pub async fn run(&self, target: &Path, log_file: &Path) -> ScanOutcome {
        let log = LogSink::new(log_file);

        log.append(&format!("SCAN START: {}", target.display())).await;
        tracing::info!(scan_target = %target.display(), log_file = %log_file.display(), "Scan started");

        let report_path = self
            .report_dir
            .join(format!("gitleaks-report-{}.json", unique_token()));
        let mut state = ScanState::Complete;
        let mut findings = 0;

        match self.run_engine(target, &report_path).await {
            Err(e) => {
                log.append(&format!("ERROR: failed to launch scan engine {}: {}", self.engine, e)).await;
                state = ScanState::Failed;
            }
            Ok(exit) => {
                match self.read_report(&report_path).await {
                    Ok(report) if report.is_empty() => log.append("No secrets found.").await,
                    Ok(report) => {
                        findings = report.len();
                        for finding in &report {
                            log.append(&finding.log_line(self.redact_secrets)).await;
                        }
                    }
                    Err(e) => {
                        log.append(&format!("ERROR: Failed to parse scan report: {}", e)).await;
                        state = ScanState::Failed;
                    }
                }

                match exit {
                    EngineExit::TimedOut(deadline) => {
                        log.append(&format!(
                            "ERROR: scan engine timed out after {}s",
                            deadline.as_secs()
                        )).await;
                        state = ScanState::Failed;
                    }
                    EngineExit::Exited { code: Some(0), .. } => {}
                    EngineExit::Exited { code, stderr } => {
                        let code = code.map_or_else(|| "signal".to_string(), |c| c.to_string());
                        log.append(&format!(
                            "ERROR: scan engine exited with code {}. {}",
                            code,
                            stderr.trim()
                        )).await;
                        state = ScanState::Failed;
                    }
                }
            }
        }

        log.append(&format!("SCAN COMPLETE: {}", target.display())).await;
        tracing::info!(
            scan_target = %target.display(),
            findings = findings,
            state = ?state,
            "Scan finished"
        );

        if let Err(e) = tokio::fs::remove_file(&report_path).await {
            tracing::debug!(report = %report_path.display(), "Report cleanup skipped: {}", e);
        }

        ScanOutcome { state, findings }
    }

    async fn run_engine(&self, target: &Path, report_path: &Path) -> std::io::Result<EngineExit> {
        let child = Command::new(&self.engine)
            .args(&self.engine_args)
            .arg("detect")
            .arg("--source")
            .arg(target)
            .arg("--report-format")
            .arg("json")
            .arg("--report-path")
            .arg(report_path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let output = match self.timeout {
            Some(deadline) => match tokio::time::timeout(deadline, child.wait_with_output()).await {
                Ok(output) => output?,
                Err(_) => return Ok(EngineExit::TimedOut(deadline)),
            },
            None => child.wait_with_output().await?,
        };

        Ok(EngineExit::Exited {
            code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    async fn read_report(&self, report_path: &Path) -> crate::Result<Vec<Finding>> {
        let content = tokio::fs::read_to_string(report_path)
            .await
            .map_err(|e| crate::Error::io_at(report_path, e))?;
        Ok(parse_report(&content)?)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    /// Fake engine: `$7` is the report path in `detect --source <p> --report-format json --report-path <r>`
    fn fake_engine(dir: &Path, body: &str) -> ScanWorker {
        let script = dir.join("engine.sh");
        std::fs::write(&script, body).unwrap();
        ScanWorker::new("sh")
            .with_engine_args(vec![script.to_string_lossy().into_owned()])
            .with_report_dir(dir)
    }

    fn log_lines(path: &Path) -> Vec<String> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|l| l[l.find("] ").unwrap() + 2..].to_string())
            .collect()
    }

    #[tokio::test]
    async fn test_single_finding_is_logged() {
        let dir = tempfile::TempDir::new().unwrap();
        let worker = fake_engine(
            dir.path(),
            r#"[ "$1" = detect ] || exit 9
cat > "$7" <<EOF
[{"File":"$3/config.js","StartLine":4,"RuleID":"generic-api-key","Description":"Generic API Key","Secret":"sk_live_0123456789"}]
EOF"#,
        )
        .with_redaction(false);
        let log = dir.path().join("job.log");

        let outcome = worker.run(Path::new("/repo"), &log).await;
        assert_eq!(outcome, ScanOutcome { state: ScanState::Complete, findings: 1 });

        let lines = log_lines(&log);
        assert_eq!(
            lines,
            vec![
                "SCAN START: /repo".to_string(),
                "FINDING: /repo/config.js:4 [generic-api-key] Generic API Key (Secret: sk_live_0123456789)"
                    .to_string(),
                "SCAN COMPLETE: /repo".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_no_findings() {
        let dir = tempfile::TempDir::new().unwrap();
        let worker = fake_engine(dir.path(), r#"echo '[]' > "$7""#);
        let log = dir.path().join("job.log");

        let outcome = worker.run(Path::new("/clean"), &log).await;
        assert_eq!(outcome.state, ScanState::Complete);
        assert_eq!(
            log_lines(&log),
            vec!["SCAN START: /clean", "No secrets found.", "SCAN COMPLETE: /clean"]
        );
    }

    #[tokio::test]
    async fn test_nonzero_exit_logs_findings_then_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let worker = fake_engine(
            dir.path(),
            r#"echo '[{"File":"a.txt","StartLine":1,"RuleID":"r","Description":"d","Secret":"abcdefgh"}]' > "$7"
echo "leaks found" >&2
exit 1"#,
        );
        let log = dir.path().join("job.log");

        let outcome = worker.run(Path::new("/repo"), &log).await;
        assert_eq!(outcome.state, ScanState::Failed);
        assert_eq!(outcome.findings, 1);

        let lines = log_lines(&log);
        assert_eq!(lines[1], "FINDING: a.txt:1 [r] d (Secret: abcd****)");
        assert_eq!(lines[2], "ERROR: scan engine exited with code 1. leaks found");
        assert_eq!(lines.last().unwrap(), "SCAN COMPLETE: /repo");
    }

    #[tokio::test]
    async fn test_unparsable_report_is_logged() {
        let dir = tempfile::TempDir::new().unwrap();
        let worker = fake_engine(dir.path(), r#"echo 'garbage' > "$7""#);
        let log = dir.path().join("job.log");

        let outcome = worker.run(Path::new("/repo"), &log).await;
        assert_eq!(outcome.state, ScanState::Failed);
        let lines = log_lines(&log);
        assert!(lines[1].starts_with("ERROR: Failed to parse scan report"));
        assert_eq!(lines[2], "SCAN COMPLETE: /repo");
    }

    #[tokio::test]
    async fn test_missing_engine_is_logged() {
        let dir = tempfile::TempDir::new().unwrap();
        let worker = ScanWorker::new("/nonexistent/gitleaks").with_report_dir(dir.path());
        let log = dir.path().join("job.log");

        let outcome = worker.run(Path::new("/repo"), &log).await;
        assert_eq!(outcome.state, ScanState::Failed);
        let lines = log_lines(&log);
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("ERROR: failed to launch scan engine"));
    }

    #[tokio::test]
    async fn test_timeout_is_logged() {
        let dir = tempfile::TempDir::new().unwrap();
        let worker = fake_engine(dir.path(), "sleep 5")
            .with_timeout(Some(Duration::from_secs(1)));
        let log = dir.path().join("job.log");

        let outcome = worker.run(Path::new("/repo"), &log).await;
        assert_eq!(outcome.state, ScanState::Failed);
        let lines = log_lines(&log);
        assert!(lines.iter().any(|l| l == "ERROR: scan engine timed out after 1s"));
        assert_eq!(lines.last().unwrap(), "SCAN COMPLETE: /repo");
    }

    #[tokio::test]
    async fn test_report_is_removed() {
        let dir = tempfile::TempDir::new().unwrap();
        let worker = fake_engine(dir.path(), r#"echo '[]' > "$7""#);
        let log = dir.path().join("job.log");

        worker.run(Path::new("/repo"), &log).await;

        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().starts_with("gitleaks-report-"))
            .collect();
        assert!(leftovers.is_empty());
    }
}
