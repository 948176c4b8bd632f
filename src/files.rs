//! File accessors routed through the detector
//!
//! These inspect content on their own; the gateway wrapped around the
//! corresponding tools inspects the returned text again and remains the
//! authoritative check.

use crate::detector::{Detector, SanitizationResult};
use crate::error::{Error, Result};
use std::path::Path;

/// Read a UTF-8 file and inspect its content.
pub async fn read_file_sanitized(detector: &dyn Detector, path: &Path) -> Result<SanitizationResult> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| Error::io_at(path, e))?;
    Ok(detector.inspect(&content).await)
}

/// Inspect `data` and persist only its sanitized form.
pub async fn write_file_sanitized(
    detector: &dyn Detector,
    path: &Path,
    data: &str,
) -> Result<SanitizationResult> {
    let result = detector.inspect(data).await;
    tokio::fs::write(path, result.sanitized.as_bytes())
        .await
        .map_err(|e| Error::io_at(path, e))?;
    tracing::debug!(
        path = %path.display(),
        bytes = result.sanitized.len(),
        entities = result.detected_entities.len(),
        "Wrote sanitized file"
    );
    Ok(result)
}
