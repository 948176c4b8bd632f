//! Scan orchestrator: allocate, create log, dispatch, return

use super::dispatch::{JobDispatcher, ProcessDispatcher, TaskDispatcher};
use super::job::ScanJob;
use super::worker::ScanWorker;
use crate::config::{DispatchMode, ScannerConfig};
use crate::error::{Error, Result};
use crate::logsink;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Accepts scan requests and hands them to a dispatcher without waiting.
///
/// No registry of jobs is kept; the log file returned in the [`ScanJob`]
/// is the only record of a job's progress.
pub struct ScanOrchestrator {
    log_dir: PathBuf,
    dispatcher: Arc<dyn JobDispatcher>,
}

impl ScanOrchestrator {
    /// Create an orchestrator writing job logs under `log_dir`
    pub fn new(log_dir: impl Into<PathBuf>, dispatcher: Arc<dyn JobDispatcher>) -> Self {
        Self {
            log_dir: log_dir.into(),
            dispatcher,
        }
    }

    /// Build from configuration. `config_path` is forwarded to detached
    /// workers so they see the same scanner settings.
    pub fn from_config(config: &ScannerConfig, config_path: Option<PathBuf>) -> Result<Self> {
        let dispatcher: Arc<dyn JobDispatcher> = match config.dispatch {
            DispatchMode::Process => Arc::new(ProcessDispatcher::current_exe(config_path)?),
            DispatchMode::Task => Arc::new(TaskDispatcher::new(ScanWorker::from_config(config))),
        };
        Ok(Self::new(config.log_dir.clone(), dispatcher))
    }

    /// Start a scan of `target` and return its handle immediately.
    ///
    /// The log file exists (possibly empty) when this returns. Only a
    /// failure to create the log or launch the job is an error.
    pub async fn start_scan(&self, target: &Path) -> Result<ScanJob> {
        let job = ScanJob::allocate(&self.log_dir, target);

        logsink::touch(&job.log_file_path).await.map_err(|e| {
            Error::Dispatch(format!(
                "Cannot create scan log {}: {}",
                job.log_file_path.display(),
                e
            ))
        })?;

        self.dispatcher.dispatch(&job)?;

        tracing::info!(
            scan_target = %job.target_path.display(),
            log_file = %job.log_file_path.display(),
            dispatcher = self.dispatcher.name(),
            "Scan job started"
        );
        Ok(job)
    }
}
