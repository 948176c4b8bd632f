//! Sensitive-data detector bridge
//!
//! Defines the [`Detector`] service interface used by the gateway and the
//! file accessors, and its implementations:
//! - [`ProcessDetector`]: external detector process, one per inspection
//! - [`StaticDetector`]: in-process literal rules
//!
//! ## Detector protocol
//!
//! ```text
//! stdin : {"text": "..."}\n
//! stdout: <diagnostics...>
//!         {"sanitized": "...", "detectedEntities": [{"type": "..."}], "error": "..."?}
//! ```
//!
//! Only the last line carrying `sanitized` or an entities field counts.
//! Inspection never fails: detector problems yield a degraded passthrough
//! result.

mod process;
mod static_rules;
mod types;

pub use process::ProcessDetector;
pub use static_rules::StaticDetector;
pub use types::{Entity, SanitizationResult};

use crate::config::{DetectorConfig, DetectorKind};
use async_trait::async_trait;
use std::sync::Arc;

/// Synchronous text-inspection service, callable concurrently.
#[async_trait]
pub trait Detector: Send + Sync {
    /// Inspect `text`. Always returns a result; `sanitized` falls back to
    /// the input when inspection fails.
    async fn inspect(&self, text: &str) -> SanitizationResult;

    /// Human-readable name (used in diagnostics)
    fn name(&self) -> &str;
}

/// Build the configured detector
pub fn from_config(config: &DetectorConfig) -> Arc<dyn Detector> {
    match config.kind {
        DetectorKind::Process => Arc::new(ProcessDetector::from_config(config)),
        DetectorKind::Static => Arc::new(StaticDetector::new(config.rules.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StaticRule;

    #[tokio::test]
    async fn test_from_config_static() {
        let config = DetectorConfig {
            kind: DetectorKind::Static,
            rules: vec![StaticRule {
                entity_type: "SSN".into(),
                pattern: "123-45-6789".into(),
            }],
            ..DetectorConfig::default()
        };
        let detector = from_config(&config);
        assert_eq!(detector.name(), "static");
        assert!(detector.inspect("ssn 123-45-6789").await.is_sensitive());
    }

    #[test]
    fn test_from_config_process() {
        let detector = from_config(&DetectorConfig::default());
        assert_eq!(detector.name(), "process");
    }
}
