//! Background secret scanning
//!
//! `scanProject` never waits for a scan. The orchestrator creates the job's
//! log file, hands the job to a dispatcher, and returns the log path; the
//! worker later streams findings into that file.
//!
//! ```text
//! scanProject ─► ScanOrchestrator ─► JobDispatcher ─► ScanWorker ─► engine
//!      │                                                   │
//!      └──── {"status":"scan_started","log_file":...}      └──► log file
//! ```

mod dispatch;
mod job;
mod orchestrator;
mod worker;

pub use dispatch::{JobDispatcher, ProcessDispatcher, TaskDispatcher};
pub use job::{Finding, ScanJob};
pub use orchestrator::ScanOrchestrator;
pub use worker::{ScanOutcome, ScanState, ScanWorker};
