//! Process-per-call detector bridge
//!
//! Launches the configured detector, writes one `{"text": ...}` line to its
//! stdin, closes stdin, collects stdout lines until exit, and maps the last
//! well-formed response line onto a [`SanitizationResult`]. Every failure
//! degrades to passthrough with an error marker.

use super::types::{parse_last_response, DetectorRequest, SanitizationResult};
use super::Detector;
use crate::config::DetectorConfig;
use crate::error::{Error, Result};
use async_trait::async_trait;
use futures::StreamExt;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;
use tokio_util::codec::{FramedRead, LinesCodec};

/// Upper bound on a single detector output line
const MAX_LINE_LENGTH: usize = 16 * 1024 * 1024;

/// Detector backed by an external process, one process per inspection
#[derive(Debug, Clone)]
pub struct ProcessDetector {
    command: String,
    args: Vec<String>,
    timeout: Option<Duration>,
}

/// Raw output of one detector run
struct Exchange {
    lines: Vec<String>,
    stderr: String,
    status: ExitStatus,
}

impl ProcessDetector {
    /// Create a detector that runs `command args...` with no deadline
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
            timeout: None,
        }
    }

    /// Build from configuration (`timeout_secs = 0` disables the deadline)
    pub fn from_config(config: &DetectorConfig) -> Self {
        let timeout = (config.timeout_secs > 0).then(|| Duration::from_secs(config.timeout_secs));
        Self::new(config.command.clone(), config.args.clone()).with_timeout(timeout)
    }

    /// Set the per-inspection deadline
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    async fn exchange(&self, text: &str) -> Result<Exchange> {
        let mut child = Command::new(&self.command)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::Detector(format!("Failed to launch {}: {}", self.command, e)))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| Error::Internal("detector stdin not captured".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::Internal("detector stdout not captured".to_string()))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| Error::Internal("detector stderr not captured".to_string()))?;

        let mut request = serde_json::to_string(&DetectorRequest { text })?;
        request.push('\n');

        // Write and drain concurrently so a large request cannot deadlock
        // against a detector that fills its stdout pipe first.
        let write = async move {
            stdin.write_all(request.as_bytes()).await?;
            stdin.shutdown().await
        };
        let read_stdout = async {
            let mut lines = Vec::new();
            let mut framed =
                FramedRead::new(stdout, LinesCodec::new_with_max_length(MAX_LINE_LENGTH));
            while let Some(line) = framed.next().await {
                match line {
                    Ok(line) => lines.push(line),
                    Err(e) => {
                        tracing::debug!("Detector stdout unreadable: {}", e);
                        break;
                    }
                }
            }
            lines
        };
        let read_stderr = async {
            let mut buf = String::new();
            let _ = stderr.read_to_string(&mut buf).await;
            buf
        };

        let (written, lines, stderr) = tokio::join!(write, read_stdout, read_stderr);
        if let Err(e) = written {
            // The detector may exit before reading; its output still decides.
            tracing::debug!(command = %self.command, "Detector stdin write failed: {}", e);
        }

        let status = child.wait().await?;
        Ok(Exchange {
            lines,
            stderr,
            status,
        })
    }
}

impl Exchange {
    fn into_result(self, text: &str) -> SanitizationResult {
        if !self.status.success() {
            tracing::debug!(status = %self.status, "Detector exited unsuccessfully");
        }
        match parse_last_response(&self.lines) {
            Some(response) => response.into_result(text),
            None => {
                let stderr = self.stderr.trim();
                let error = if stderr.is_empty() {
                    format!("Error parsing output (detector {})", self.status)
                } else {
                    stderr.to_string()
                };
                SanitizationResult::degraded(text, error)
            }
        }
    }
}

#[async_trait]
impl Detector for ProcessDetector {
    async fn inspect(&self, text: &str) -> SanitizationResult {
        let outcome = match self.timeout {
            Some(deadline) => match tokio::time::timeout(deadline, self.exchange(text)).await {
                Ok(outcome) => outcome,
                Err(_) => Err(Error::Detector(format!(
                    "Detector timed out after {}s",
                    deadline.as_secs_f64()
                ))),
            },
            None => self.exchange(text).await,
        };

        match outcome {
            Ok(exchange) => exchange.into_result(text),
            Err(e) => {
                tracing::warn!(command = %self.command, "Detector unavailable: {}", e);
                SanitizationResult::degraded(text, e.to_string())
            }
        }
    }

    fn name(&self) -> &str {
        "process"
    }
}
