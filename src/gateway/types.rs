//! Tool call and tool result shapes

use crate::error::Result;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;

/// Tool arguments: argument name → JSON value
pub type ToolArgs = serde_json::Map<String, serde_json::Value>;

/// Async handler for a tool call
pub type ToolHandler = Arc<dyn Fn(ToolArgs) -> BoxFuture<'static, Result<ToolResult>> + Send + Sync>;

/// Box an async function as a [`ToolHandler`]
pub fn handler<F, Fut>(f: F) -> ToolHandler
where
    F: Fn(ToolArgs) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<ToolResult>> + Send + 'static,
{
    Arc::new(move |args| Box::pin(f(args)))
}

/// A single invocation of a named tool
#[derive(Debug, Clone, Deserialize)]
pub struct ToolCall {
    pub name: String,
    #[serde(default)]
    pub arguments: ToolArgs,
}

/// One content item of a tool result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentItem {
    /// Plain text (the only kind that is inspected)
    Text { text: String },
    /// Base64 image payload
    Image {
        data: String,
        #[serde(rename = "mimeType")]
        mime_type: String,
    },
    /// Embedded resource
    Resource { resource: serde_json::Value },
}

impl ContentItem {
    /// Text item
    pub fn text(text: impl Into<String>) -> Self {
        ContentItem::Text { text: text.into() }
    }
}

/// Result of a tool call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResult {
    pub content: Vec<ContentItem>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
}

impl ToolResult {
    /// Single text item result
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentItem::text(text)],
            is_error: false,
        }
    }

    /// Failed tool call with a descriptive message
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: vec![ContentItem::text(message)],
            is_error: true,
        }
    }

    /// Text of the first text item
    pub fn first_text(&self) -> Option<&str> {
        self.content.iter().find_map(|item| match item {
            ContentItem::Text { text } => Some(text.as_str()),
            _ => None,
        })
    }
}
