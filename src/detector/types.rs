//! Detector data model and wire format

use serde::{Deserialize, Serialize};

/// A single sensitive finding within a text blob
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Classification (e.g. "SSN", "EMAIL_ADDRESS")
    #[serde(rename = "type")]
    pub entity_type: String,
    /// Start offset in the inspected text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<usize>,
    /// End offset in the inspected text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<usize>,
    /// Detector confidence
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    /// Matched value or an excerpt of it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
}

impl Entity {
    /// Entity with only a type
    pub fn new(entity_type: impl Into<String>) -> Self {
        Self {
            entity_type: entity_type.into(),
            start: None,
            end: None,
            score: None,
            excerpt: None,
        }
    }

    /// Attach a span
    pub fn with_span(mut self, start: usize, end: usize) -> Self {
        self.start = Some(start);
        self.end = Some(end);
        self
    }

    /// Attach the matched excerpt
    pub fn with_excerpt(mut self, excerpt: impl Into<String>) -> Self {
        self.excerpt = Some(excerpt.into());
        self
    }
}

/// Outcome of one inspection.
///
/// `sanitized` is always populated; when inspection fails it equals
/// `original` and `error` carries the reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SanitizationResult {
    pub original: String,
    pub sanitized: String,
    pub detected_entities: Vec<Entity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SanitizationResult {
    /// Clean passthrough: nothing detected, text unchanged
    pub fn clean(text: &str) -> Self {
        Self {
            original: text.to_string(),
            sanitized: text.to_string(),
            detected_entities: Vec::new(),
            error: None,
        }
    }

    /// Degraded passthrough after a detector failure
    pub fn degraded(text: &str, error: impl Into<String>) -> Self {
        Self {
            original: text.to_string(),
            sanitized: text.to_string(),
            detected_entities: Vec::new(),
            error: Some(error.into()),
        }
    }

    /// Whether any entity was detected
    pub fn is_sensitive(&self) -> bool {
        !self.detected_entities.is_empty()
    }

    /// Whether the detector failed and the text passed through uninspected
    pub fn is_degraded(&self) -> bool {
        self.error.is_some() && self.detected_entities.is_empty()
    }

    /// Distinct entity types in order of first detection
    pub fn entity_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = Vec::new();
        for entity in &self.detected_entities {
            if !types.contains(&entity.entity_type.as_str()) {
                types.push(&entity.entity_type);
            }
        }
        types
    }
}

/// Request line written to the detector's stdin
#[derive(Debug, Serialize)]
pub(crate) struct DetectorRequest<'a> {
    pub text: &'a str,
}

/// Response line read from the detector's stdout.
///
/// A line counts as a response only if it carries `sanitized` or an
/// entities field, so diagnostic JSON the detector prints before its
/// answer is not mistaken for the answer.
#[derive(Debug, Deserialize)]
pub(crate) struct DetectorResponse {
    #[serde(default)]
    pub sanitized: Option<String>,
    #[serde(default, rename = "detectedEntities", alias = "detected_entities")]
    pub detected_entities: Option<Vec<Entity>>,
    #[serde(default)]
    pub error: Option<String>,
}

impl DetectorResponse {
    fn is_response(&self) -> bool {
        self.sanitized.is_some() || self.detected_entities.is_some()
    }

    /// Map onto a result for `original`; a missing `sanitized` falls back to it
    pub fn into_result(self, original: &str) -> SanitizationResult {
        SanitizationResult {
            original: original.to_string(),
            sanitized: self.sanitized.unwrap_or_else(|| original.to_string()),
            detected_entities: self.detected_entities.unwrap_or_default(),
            error: self.error,
        }
    }
}

/// Find the last line of detector output that is a well-formed response.
pub(crate) fn parse_last_response<S: AsRef<str>>(lines: &[S]) -> Option<DetectorResponse> {
    lines
        .iter()
        .rev()
        .map(|l| l.as_ref().trim())
        .filter(|l| !l.is_empty())
        .filter_map(|l| serde_json::from_str::<DetectorResponse>(l).ok())
        .find(DetectorResponse::is_response)
}
