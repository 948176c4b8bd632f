//! Pre/post inspection around tool handlers
//!
//! Every string argument is inspected before the handler runs and every text
//! item of its result is inspected afterwards. A detection anywhere blocks
//! the whole call: the handler is skipped (input) or its result discarded
//! (output), and the caller receives a block notice naming only the entity
//! types.

use super::types::{ContentItem, ToolArgs, ToolHandler, ToolResult};
use crate::detector::{Detector, SanitizationResult};
use crate::error::Result;
use crate::logsink::LogSink;
use serde_json::Value;
use std::sync::Arc;

/// Which side of the handler an inspection covers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Input,
    Output,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Input => write!(f, "input"),
            Direction::Output => write!(f, "output"),
        }
    }
}

/// Block notice returned when a string argument carries sensitive data
pub fn blocked_input(types: &[&str]) -> ToolResult {
    ToolResult::text(format!(
        "[Sensitive Data Detected] Your request contains sensitive information ({}) and has been cancelled.",
        types.join(", ")
    ))
}

/// Block notice returned when a tool result carries sensitive data
pub fn blocked_output(types: &[&str]) -> ToolResult {
    ToolResult::text(format!(
        "[Sensitive Data Detected in Output] The tool's response contains sensitive information ({}) and has been blocked.",
        types.join(", ")
    ))
}

/// Middleware enforcing inspection around tool handlers
#[derive(Clone)]
pub struct SanitizationGateway {
    detector: Arc<dyn Detector>,
    diagnostics: Option<LogSink>,
}

impl SanitizationGateway {
    /// Create a gateway using `detector`
    pub fn new(detector: Arc<dyn Detector>) -> Self {
        Self {
            detector,
            diagnostics: None,
        }
    }

    /// Record block and degradation events to a diagnostic log
    pub fn with_diagnostics(mut self, sink: LogSink) -> Self {
        self.diagnostics = Some(sink);
        self
    }

    /// The detector used for inspection
    pub fn detector(&self) -> &Arc<dyn Detector> {
        &self.detector
    }

    /// Wrap `handler` so each call is inspected on the way in and out
    pub fn wrap(&self, tool: &str, handler: ToolHandler) -> ToolHandler {
        let gateway = self.clone();
        let tool = tool.to_string();
        Arc::new(move |args| {
            let gateway = gateway.clone();
            let handler = Arc::clone(&handler);
            let tool = tool.clone();
            Box::pin(async move { gateway.call(&tool, &handler, args).await })
        })
    }

    /// Run one inspected call
    pub async fn call(&self, tool: &str, handler: &ToolHandler, args: ToolArgs) -> Result<ToolResult> {
        let args = match self.check_input(tool, args).await {
            Ok(args) => args,
            Err(blocked) => return Ok(blocked),
        };

        let result = handler(args).await?;
        Ok(self.check_output(tool, result).await)
    }

    /// Inspect string arguments; `Err` carries the block notice
    async fn check_input(&self, tool: &str, mut args: ToolArgs) -> std::result::Result<ToolArgs, ToolResult> {
        for (key, value) in args.iter_mut() {
            let Value::String(text) = value else {
                continue;
            };
            if text.is_empty() {
                continue;
            }

            let inspection = self.inspect(tool, Direction::Input, key, text).await;
            if inspection.is_sensitive() {
                let types = inspection.entity_types();
                self.record_block(tool, Direction::Input, key, &types).await;
                return Err(blocked_input(&types));
            }
            *text = inspection.sanitized;
        }
        Ok(args)
    }

    /// Inspect text items of the handler's result
    async fn check_output(&self, tool: &str, mut result: ToolResult) -> ToolResult {
        for (index, item) in result.content.iter_mut().enumerate() {
            let ContentItem::Text { text } = item else {
                continue;
            };
            if text.is_empty() {
                continue;
            }

            let label = format!("content[{}]", index);
            let inspection = self.inspect(tool, Direction::Output, &label, text).await;
            if inspection.is_sensitive() {
                let types = inspection.entity_types();
                self.record_block(tool, Direction::Output, &label, &types).await;
                return blocked_output(&types);
            }
            *text = inspection.sanitized;
        }
        result
    }

    async fn inspect(&self, tool: &str, direction: Direction, field: &str, text: &str) -> SanitizationResult {
        let inspection = self.detector.inspect(text).await;
        if let Some(error) = inspection.error.as_deref().filter(|_| inspection.is_degraded()) {
            tracing::warn!(
                tool = tool,
                direction = %direction,
                field = field,
                "Inspection degraded, passing through unsanitized: {}",
                error
            );
            self.diagnostic(&format!(
                "DEGRADED {} tool={} field={}: {}",
                direction, tool, field, error
            ))
            .await;
        }
        inspection
    }

    async fn record_block(&self, tool: &str, direction: Direction, field: &str, types: &[&str]) {
        tracing::warn!(
            tool = tool,
            direction = %direction,
            field = field,
            types = %types.join(","),
            "Sensitive data detected, call blocked"
        );
        self.diagnostic(&format!(
            "BLOCKED {} tool={} field={} types={}",
            direction,
            tool,
            field,
            types.join(",")
        ))
        .await;
    }

    async fn diagnostic(&self, message: &str) {
        if let Some(sink) = &self.diagnostics {
            sink.append(message).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::StaticDetector;
    use crate::gateway::types::handler;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn static_gateway() -> SanitizationGateway {
        let detector = StaticDetector::default()
            .with_rule("SSN", "123-45-6789")
            .with_rule("API_KEY", "sk-live-abcdef")
            .with_rule("PERSON", "Alice");
        SanitizationGateway::new(Arc::new(detector))
    }

    fn args(pairs: &[(&str, Value)]) -> ToolArgs {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    /// Handler that counts invocations and echoes its `data` argument
    fn echo_counting(count: Arc<AtomicUsize>) -> ToolHandler {
        handler(move |args: ToolArgs| {
            let count = Arc::clone(&count);
            async move {
                count.fetch_add(1, Ordering::SeqCst);
                let data = args.get("data").and_then(|v| v.as_str()).unwrap_or("").to_string();
                Ok(ToolResult::text(data))
            }
        })
    }

    /// Detector that rewrites clean text to upper case
    struct Upcasing;

    #[async_trait]
    impl Detector for Upcasing {
        async fn inspect(&self, text: &str) -> SanitizationResult {
            SanitizationResult {
                original: text.to_string(),
                sanitized: text.to_uppercase(),
                detected_entities: Vec::new(),
                error: None,
            }
        }

        fn name(&self) -> &str {
            "upcasing"
        }
    }

    /// Detector that always fails
    struct Broken;

    #[async_trait]
    impl Detector for Broken {
        async fn inspect(&self, text: &str) -> SanitizationResult {
            SanitizationResult::degraded(text, "detector missing")
        }

        fn name(&self) -> &str {
            "broken"
        }
    }

    #[tokio::test]
    async fn test_input_block_skips_handler() {
        let count = Arc::new(AtomicUsize::new(0));
        let wrapped = static_gateway().wrap("sendToLLM", echo_counting(count.clone()));

        let result = wrapped(args(&[("data", Value::from("my ssn is 123-45-6789"))]))
            .await
            .unwrap();

        assert_eq!(count.load(Ordering::SeqCst), 0);
        let text = result.first_text().unwrap();
        assert!(text.starts_with("[Sensitive Data Detected]"));
        assert!(text.contains("(SSN)"));
        assert!(text.ends_with("has been cancelled."));
        assert!(!text.contains("123-45-6789"));
    }

    #[tokio::test]
    async fn test_block_lists_distinct_types_in_order() {
        let count = Arc::new(AtomicUsize::new(0));
        let wrapped = static_gateway().wrap("sendToLLM", echo_counting(count));

        let result = wrapped(args(&[(
            "data",
            Value::from("Alice sk-live-abcdef Alice 123-45-6789 sk-live-abcdef"),
        )]))
        .await
        .unwrap();

        let text = result.first_text().unwrap();
        assert!(text.contains("(PERSON, API_KEY, SSN)"), "{}", text);
        assert!(!text.contains("sk-live-abcdef"));
        assert!(!text.contains("Alice "));
    }

    #[tokio::test]
    async fn test_output_block_discards_result() {
        let wrapped = static_gateway().wrap(
            "readFile",
            handler(|_args: ToolArgs| async {
                Ok(ToolResult {
                    content: vec![
                        ContentItem::text("harmless preface"),
                        ContentItem::text("key: sk-live-abcdef"),
                    ],
                    is_error: false,
                })
            }),
        );

        let result = wrapped(ToolArgs::new()).await.unwrap();
        assert_eq!(result.content.len(), 1);
        let text = result.first_text().unwrap();
        assert!(text.starts_with("[Sensitive Data Detected in Output]"));
        assert!(text.contains("(API_KEY)"));
        assert!(!text.contains("harmless preface"));
        assert!(!text.contains("sk-live-abcdef"));
    }

    #[tokio::test]
    async fn test_clean_call_passes_through() {
        let count = Arc::new(AtomicUsize::new(0));
        let wrapped = static_gateway().wrap("sendToLLM", echo_counting(count.clone()));

        let result = wrapped(args(&[("data", Value::from("hello world"))]))
            .await
            .unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(result, ToolResult::text("hello world"));
    }

    #[tokio::test]
    async fn test_sanitized_forms_are_forwarded() {
        let gateway = SanitizationGateway::new(Arc::new(Upcasing));
        let seen = Arc::new(std::sync::Mutex::new(None));
        let seen_in = Arc::clone(&seen);

        let wrapped = gateway.wrap(
            "sendToLLM",
            handler(move |args: ToolArgs| {
                let seen = Arc::clone(&seen_in);
                async move {
                    *seen.lock().unwrap() = Some(args.clone());
                    Ok(ToolResult::text("done"))
                }
            }),
        );

        let result = wrapped(args(&[
            ("data", Value::from("quiet")),
            ("count", Value::from(3)),
            ("flags", serde_json::json!(["keep", "as-is"])),
        ]))
        .await
        .unwrap();

        let forwarded = seen.lock().unwrap().clone().unwrap();
        assert_eq!(forwarded["data"], "QUIET");
        assert_eq!(forwarded["count"], 3);
        assert_eq!(forwarded["flags"], serde_json::json!(["keep", "as-is"]));
        assert_eq!(result.first_text(), Some("DONE"));
    }

    #[tokio::test]
    async fn test_non_text_items_untouched() {
        let gateway = SanitizationGateway::new(Arc::new(Upcasing));
        let wrapped = gateway.wrap(
            "render",
            handler(|_args: ToolArgs| async {
                Ok(ToolResult {
                    content: vec![ContentItem::Image {
                        data: "abc".into(),
                        mime_type: "image/png".into(),
                    }],
                    is_error: false,
                })
            }),
        );

        let result = wrapped(ToolArgs::new()).await.unwrap();
        assert_eq!(
            result.content[0],
            ContentItem::Image {
                data: "abc".into(),
                mime_type: "image/png".into()
            }
        );
    }

    #[tokio::test]
    async fn test_degraded_detector_passes_through_and_logs() {
        let dir = tempfile::TempDir::new().unwrap();
        let sink = LogSink::new(dir.path().join("diag.log"));
        let gateway = SanitizationGateway::new(Arc::new(Broken)).with_diagnostics(sink.clone());
        let count = Arc::new(AtomicUsize::new(0));
        let wrapped = gateway.wrap("sendToLLM", echo_counting(count.clone()));

        let result = wrapped(args(&[("data", Value::from("anything"))]))
            .await
            .unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(result.first_text(), Some("anything"));

        let log = std::fs::read_to_string(sink.path()).unwrap();
        assert!(log.contains("DEGRADED input tool=sendToLLM field=data: detector missing"));
        assert!(log.contains("DEGRADED output tool=sendToLLM field=content[0]"));
    }

    #[tokio::test]
    async fn test_block_is_logged_without_raw_value() {
        let dir = tempfile::TempDir::new().unwrap();
        let sink = LogSink::new(dir.path().join("diag.log"));
        let gateway = static_gateway().with_diagnostics(sink.clone());
        let wrapped = gateway.wrap("writeFile", echo_counting(Arc::new(AtomicUsize::new(0))));

        wrapped(args(&[("data", Value::from("123-45-6789"))]))
            .await
            .unwrap();

        let log = std::fs::read_to_string(sink.path()).unwrap();
        assert!(log.contains("BLOCKED input tool=writeFile field=data types=SSN"));
        assert!(!log.contains("123-45-6789"));
    }

    #[tokio::test]
    async fn test_handler_error_propagates() {
        let wrapped = static_gateway().wrap(
            "readFile",
            handler(|_args: ToolArgs| async {
                Err(crate::Error::Tool("disk on fire".into()))
            }),
        );
        let err = wrapped(ToolArgs::new()).await.unwrap_err();
        assert!(err.to_string().contains("disk on fire"));
    }

    #[tokio::test]
    async fn test_empty_strings_are_not_inspected() {
        struct Panicking;

        #[async_trait]
        impl Detector for Panicking {
            async fn inspect(&self, _text: &str) -> SanitizationResult {
                panic!("empty text must not reach the detector");
            }

            fn name(&self) -> &str {
                "panicking"
            }
        }

        let wrapped = SanitizationGateway::new(Arc::new(Panicking)).wrap(
            "sendToLLM",
            handler(|_args: ToolArgs| async { Ok(ToolResult::text("")) }),
        );
        let result = wrapped(args(&[("data", Value::from(""))])).await.unwrap();
        assert_eq!(result.first_text(), Some(""));
    }
}
