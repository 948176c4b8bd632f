//! Scan job dispatchers
//!
//! A dispatcher launches a job and returns without waiting for it. The job
//! owns its log file from then on; nothing reports completion back.

use super::job::ScanJob;
use super::worker::ScanWorker;
use crate::error::{Error, Result};
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;

/// Launches detached scan jobs
pub trait JobDispatcher: Send + Sync {
    /// Start `job`. Must not wait for it; fails only if it cannot start.
    fn dispatch(&self, job: &ScanJob) -> Result<()>;

    /// Human-readable name (used in diagnostics)
    fn name(&self) -> &str;
}

/// Runs each job as a detached child process:
/// `<program> [args...] scan-worker <target> <log_file>`
#[derive(Debug, Clone)]
pub struct ProcessDispatcher {
    program: PathBuf,
    args: Vec<String>,
}

impl ProcessDispatcher {
    /// Dispatch via `program` with leading `args`
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Re-execute the running binary, forwarding `--config` when set
    pub fn current_exe(config_path: Option<PathBuf>) -> Result<Self> {
        let program = std::env::current_exe()
            .map_err(|e| Error::Dispatch(format!("Cannot locate own executable: {}", e)))?;
        let args = match config_path {
            Some(path) => vec!["--config".to_string(), path.to_string_lossy().into_owned()],
            None => Vec::new(),
        };
        Ok(Self::new(program, args))
    }
}

impl JobDispatcher for ProcessDispatcher {
    fn dispatch(&self, job: &ScanJob) -> Result<()> {
        let mut command = tokio::process::Command::new(&self.program);
        command
            .args(&self.args)
            .arg("scan-worker")
            .arg(&job.target_path)
            .arg(&job.log_file_path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        #[cfg(unix)]
        command.process_group(0);

        // Dropping the handle leaves the child running; tokio reaps it.
        let child = command.spawn().map_err(|e| {
            Error::Dispatch(format!(
                "Failed to spawn scan worker {}: {}",
                self.program.display(),
                e
            ))
        })?;

        tracing::info!(
            pid = ?child.id(),
            scan_target = %job.target_path.display(),
            log_file = %job.log_file_path.display(),
            "Dispatched detached scan worker"
        );
        Ok(())
    }

    fn name(&self) -> &str {
        "process"
    }
}

/// Runs each job on a detached tokio task in this process
#[derive(Debug, Clone)]
pub struct TaskDispatcher {
    worker: Arc<ScanWorker>,
}

impl TaskDispatcher {
    /// Dispatch onto tasks running `worker`
    pub fn new(worker: ScanWorker) -> Self {
        Self {
            worker: Arc::new(worker),
        }
    }
}

impl JobDispatcher for TaskDispatcher {
    fn dispatch(&self, job: &ScanJob) -> Result<()> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| Error::Dispatch(format!("No async runtime for scan task: {}", e)))?;

        let worker = Arc::clone(&self.worker);
        let target = job.target_path.clone();
        let log_file = job.log_file_path.clone();
        runtime.spawn(async move {
            worker.run(&target, &log_file).await;
        });
        Ok(())
    }

    fn name(&self) -> &str {
        "task"
    }
}
