//! Append-only, timestamp-prefixed line logging
//!
//! Used for per-job scan logs and the shared gateway diagnostic log. Each
//! entry is a single `[<ISO-8601>] <message>\n` line written with one
//! `write_all` on a file opened in append mode, so concurrent writers to the
//! same path interleave at line granularity. Writes never fail the caller.

use chrono::{SecondsFormat, Utc};
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

/// Append one timestamped line to `path`.
///
/// Failures are reported through `tracing` and otherwise swallowed.
pub async fn append(path: &Path, message: &str) {
    let line = format_line(message);
    if let Err(e) = write_line(path, line.as_bytes()).await {
        tracing::debug!(path = %path.display(), "Log sink write failed: {}", e);
    }
}

async fn write_line(path: &Path, line: &[u8]) -> std::io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path).await?;
    file.write_all(line).await?;
    file.flush().await
}

/// Create `path` if missing without writing anything.
pub async fn touch(path: &Path) -> std::io::Result<()> {
    OpenOptions::new().create(true).append(true).open(path).await?;
    Ok(())
}

fn format_line(message: &str) -> String {
    let ts = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
    let single = message.replace(['\r', '\n'], " ");
    format!("[{}] {}\n", ts, single)
}

/// A log sink bound to a fixed file
#[derive(Debug, Clone)]
pub struct LogSink {
    path: PathBuf,
}

impl LogSink {
    /// Create a sink writing to `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Target file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one line
    pub async fn append(&self, message: &str) {
        append(&self.path, message).await;
    }
}
