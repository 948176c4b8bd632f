//! Sanitization gateway
//!
//! Wraps tool handlers so that string arguments are inspected before the
//! handler runs and text results are inspected before they reach the caller.

mod sanitizer;
pub mod types;

pub use sanitizer::{blocked_input, blocked_output, SanitizationGateway};
pub use types::{handler, ContentItem, ToolArgs, ToolCall, ToolHandler, ToolResult};
