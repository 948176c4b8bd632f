//! Scan job handle and findings

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

/// Process-local sequence so tokens minted in the same millisecond differ
static SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Unique, timestamp-derived token: `<millis>-<pid>-<seq>`
pub(crate) fn unique_token() -> String {
    format!(
        "{}-{}-{}",
        Utc::now().timestamp_millis(),
        std::process::id(),
        SEQUENCE.fetch_add(1, Ordering::Relaxed)
    )
}

/// One dispatched scan. Identity is the log file path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanJob {
    pub target_path: PathBuf,
    pub log_file_path: PathBuf,
    pub started_at: DateTime<Utc>,
}

impl ScanJob {
    /// Allocate a job with a fresh log path under `log_dir`
    pub fn allocate(log_dir: &Path, target: impl Into<PathBuf>) -> Self {
        Self {
            target_path: target.into(),
            log_file_path: log_dir.join(format!("scanproject-{}.log", unique_token())),
            started_at: Utc::now(),
        }
    }
}

/// One secret found by the scan engine (engine JSON field names)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    #[serde(rename = "File")]
    pub file: String,
    #[serde(rename = "StartLine", default)]
    pub start_line: u64,
    #[serde(rename = "RuleID")]
    pub rule_id: String,
    #[serde(rename = "Description", default)]
    pub description: String,
    #[serde(rename = "Secret", default)]
    pub secret: String,
}

impl Finding {
    /// `FINDING: <file>:<line> [<rule>] <description> (Secret: <excerpt>)`
    pub fn log_line(&self, redact: bool) -> String {
        let excerpt = if redact {
            mask_secret(&self.secret)
        } else {
            self.secret.clone()
        };
        format!(
            "FINDING: {}:{} [{}] {} (Secret: {})",
            self.file, self.start_line, self.rule_id, self.description, excerpt
        )
    }
}

/// Keep the first four characters of a secret
fn mask_secret(secret: &str) -> String {
    if secret.chars().count() <= 4 {
        return "****".to_string();
    }
    let prefix: String = secret.chars().take(4).collect();
    format!("{}****", prefix)
}

/// Parse an engine report. Anything other than a JSON array means no
/// findings; an array whose items are not findings is an error.
pub(crate) fn parse_report(content: &str) -> serde_json::Result<Vec<Finding>> {
    match serde_json::from_str::<serde_json::Value>(content)? {
        value @ serde_json::Value::Array(_) => serde_json::from_value(value),
        _ => Ok(Vec::new()),
    }
}
