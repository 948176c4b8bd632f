//! In-process literal-rule detector
//!
//! Replaces every occurrence of a configured literal with `<TYPE>`, the way
//! an anonymizer would. Useful as a stand-in when no external detector is
//! installed and as a deterministic detector in tests.

use super::types::{Entity, SanitizationResult};
use super::Detector;
use crate::config::StaticRule;
use async_trait::async_trait;
use std::cmp::Reverse;

/// Detector driven by literal (entity type, needle) rules
#[derive(Debug, Clone, Default)]
pub struct StaticDetector {
    rules: Vec<StaticRule>,
}

impl StaticDetector {
    /// Create from rules; rules with an empty pattern are ignored
    pub fn new(rules: Vec<StaticRule>) -> Self {
        Self {
            rules: rules.into_iter().filter(|r| !r.pattern.is_empty()).collect(),
        }
    }

    /// Add a rule
    pub fn with_rule(mut self, entity_type: &str, pattern: &str) -> Self {
        if !pattern.is_empty() {
            self.rules.push(StaticRule {
                entity_type: entity_type.to_string(),
                pattern: pattern.to_string(),
            });
        }
        self
    }
}

#[async_trait]
impl Detector for StaticDetector {
    async fn inspect(&self, text: &str) -> SanitizationResult {
        let mut entities: Vec<Entity> = self
            .rules
            .iter()
            .flat_map(|rule| {
                text.match_indices(rule.pattern.as_str()).map(move |(start, m)| {
                    Entity::new(rule.entity_type.clone())
                        .with_span(start, start + m.len())
                        .with_excerpt(m)
                })
            })
            .collect();

        if entities.is_empty() {
            return SanitizationResult::clean(text);
        }

        // Longest match first among those sharing a start
        entities.sort_by_key(|e| (e.start, Reverse(e.end)));

        let mut sanitized = String::with_capacity(text.len());
        let mut cursor = 0;
        for entity in &entities {
            let (start, end) = (entity.start.unwrap_or(0), entity.end.unwrap_or(0));
            if start < cursor {
                // Overlapped: no byte of this match may survive
                cursor = cursor.max(end);
                continue;
            }
            sanitized.push_str(&text[cursor..start]);
            sanitized.push('<');
            sanitized.push_str(&entity.entity_type);
            sanitized.push('>');
            cursor = end;
        }
        sanitized.push_str(&text[cursor..]);

        SanitizationResult {
            original: text.to_string(),
            sanitized,
            detected_entities: entities,
            error: None,
        }
    }

    fn name(&self) -> &str {
        "static"
    }
}
