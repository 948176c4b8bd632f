//! ToolGuard configuration management

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main ToolGuard configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolGuardConfig {
    /// Server identity reported on `initialize`
    #[serde(default)]
    pub server: ServerConfig,

    /// Sensitive-data detector configuration
    #[serde(default)]
    pub detector: DetectorConfig,

    /// Background secret scanner configuration
    #[serde(default)]
    pub scanner: ScannerConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ToolGuardConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| crate::Error::io_at(path, e))?;
        toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("{}: {}", path.display(), e)))
    }

    /// Default config file location (~/.config/toolguard/config.toml)
    pub fn default_path() -> Option<PathBuf> {
        dirs_next::config_dir().map(|p| p.join("toolguard").join("config.toml"))
    }
}

/// Server identity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server name
    #[serde(default = "default_server_name")]
    pub name: String,

    /// Server version
    #[serde(default = "default_server_version")]
    pub version: String,
}

fn default_server_name() -> String {
    "Sanitizer".to_string()
}

fn default_server_version() -> String {
    "1.0.0".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: default_server_name(),
            version: default_server_version(),
        }
    }
}

/// Which detector implementation to use
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectorKind {
    /// External process, one per inspection
    #[default]
    Process,
    /// In-process literal rules
    Static,
}

/// Literal detection rule for the static detector
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaticRule {
    /// Entity type reported on match (e.g. "SSN")
    pub entity_type: String,

    /// Literal text to look for
    pub pattern: String,
}

/// Detector configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Detector implementation
    #[serde(default)]
    pub kind: DetectorKind,

    /// Program to launch for each inspection
    #[serde(default = "default_detector_command")]
    pub command: String,

    /// Arguments passed to the program
    #[serde(default)]
    pub args: Vec<String>,

    /// Per-inspection deadline in seconds (0 = no deadline)
    #[serde(default = "default_detector_timeout")]
    pub timeout_secs: u64,

    /// Rules for the static detector
    #[serde(default)]
    pub rules: Vec<StaticRule>,
}

fn default_detector_command() -> String {
    "python3".to_string()
}

fn default_detector_timeout() -> u64 {
    30
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            kind: DetectorKind::Process,
            command: default_detector_command(),
            args: vec!["sanitize.py".to_string()],
            timeout_secs: default_detector_timeout(),
            rules: Vec::new(),
        }
    }
}

/// How scan jobs are dispatched
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchMode {
    /// Detached child process re-executing this binary
    #[default]
    Process,
    /// Detached tokio task inside the server process
    Task,
}

/// Secret scanner configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerConfig {
    /// Scan engine program
    #[serde(default = "default_engine")]
    pub engine: String,

    /// Arguments placed before the `detect ...` invocation
    #[serde(default)]
    pub engine_args: Vec<String>,

    /// Directory for per-job log files
    #[serde(default = "std::env::temp_dir")]
    pub log_dir: PathBuf,

    /// Directory for temporary engine reports
    #[serde(default = "std::env::temp_dir")]
    pub report_dir: PathBuf,

    /// Dispatch mode
    #[serde(default)]
    pub dispatch: DispatchMode,

    /// Engine deadline in seconds (0 = no deadline)
    #[serde(default)]
    pub timeout_secs: u64,

    /// Mask secret excerpts in FINDING lines
    #[serde(default = "default_true")]
    pub redact_secrets: bool,
}

fn default_engine() -> String {
    "gitleaks".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            engine: default_engine(),
            engine_args: Vec::new(),
            log_dir: std::env::temp_dir(),
            report_dir: std::env::temp_dir(),
            dispatch: DispatchMode::Process,
            timeout_secs: 0,
            redact_secrets: true,
        }
    }
}

/// Tracing output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Shared diagnostic log for gateway decisions
    #[serde(default = "default_diagnostic_log")]
    pub diagnostic_log: PathBuf,

    /// stderr tracing format
    #[serde(default)]
    pub format: LogFormat,
}

fn default_diagnostic_log() -> PathBuf {
    std::env::temp_dir().join("scanproject.log")
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            diagnostic_log: default_diagnostic_log(),
            format: LogFormat::Pretty,
        }
    }
}
