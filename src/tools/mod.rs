//! Tool surface
//!
//! Named tools with their input schemas, as exposed to protocol clients.
//! Every tool except `scanProject` is wrapped by the sanitization gateway.

mod builtin;

pub use builtin::register_builtin_tools;

use crate::config::ToolGuardConfig;
use crate::detector;
use crate::error::{Error, Result};
use crate::gateway::{SanitizationGateway, ToolCall, ToolHandler, ToolResult};
use crate::logsink::LogSink;
use crate::scan::ScanOrchestrator;
use std::path::PathBuf;
use std::sync::Arc;

/// A registered tool
#[derive(Clone)]
pub struct ToolDef {
    /// Unique tool name
    pub name: String,
    /// One-line description shown to clients
    pub description: String,
    /// JSON schema of the arguments object
    pub input_schema: serde_json::Value,
    pub handler: ToolHandler,
}

impl std::fmt::Debug for ToolDef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolDef")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

/// Ordered set of tools, looked up by name
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<ToolDef>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the full tool set described by `config`.
    ///
    /// `config_path` is forwarded to detached scan workers.
    pub fn from_config(config: &ToolGuardConfig, config_path: Option<PathBuf>) -> Result<Self> {
        let detector = detector::from_config(&config.detector);
        let gateway = SanitizationGateway::new(detector)
            .with_diagnostics(LogSink::new(config.logging.diagnostic_log.clone()));
        let orchestrator = Arc::new(ScanOrchestrator::from_config(&config.scanner, config_path)?);

        let mut registry = Self::new();
        register_builtin_tools(&mut registry, &gateway, orchestrator);
        Ok(registry)
    }

    /// Add a tool, replacing any existing tool of the same name
    pub fn register(&mut self, tool: ToolDef) {
        match self.tools.iter_mut().find(|t| t.name == tool.name) {
            Some(existing) => *existing = tool,
            None => self.tools.push(tool),
        }
    }

    pub fn get(&self, name: &str) -> Option<&ToolDef> {
        self.tools.iter().find(|t| t.name == name)
    }

    /// Tools in registration order
    pub fn list(&self) -> impl Iterator<Item = &ToolDef> {
        self.tools.iter()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Invoke a tool. Unknown names fail with [`Error::Tool`].
    pub async fn call(&self, call: ToolCall) -> Result<ToolResult> {
        let tool = self
            .get(&call.name)
            .ok_or_else(|| Error::Tool(format!("Unknown tool: {}", call.name)))?;
        tracing::debug!(tool = %call.name, "Invoking tool");
        (tool.handler)(call.arguments).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::handler;

    fn echo(name: &str, reply: &'static str) -> ToolDef {
        ToolDef {
            name: name.to_string(),
            description: String::new(),
            input_schema: serde_json::json!({"type": "object"}),
            handler: handler(move |_args| async move { Ok(ToolResult::text(reply)) }),
        }
    }

    #[tokio::test]
    async fn test_unknown_tool_is_error() {
        let registry = ToolRegistry::new();
        let err = registry
            .call(ToolCall {
                name: "nope".into(),
                arguments: Default::default(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Tool(_)));
        assert!(err.to_string().contains("nope"));
    }

    #[tokio::test]
    async fn test_register_replaces_same_name() {
        let mut registry = ToolRegistry::new();
        registry.register(echo("a", "first"));
        registry.register(echo("b", "other"));
        registry.register(echo("a", "second"));
        assert_eq!(registry.len(), 2);

        let result = registry
            .call(ToolCall {
                name: "a".into(),
                arguments: Default::default(),
            })
            .await
            .unwrap();
        assert_eq!(result.first_text(), Some("second"));
        assert_eq!(registry.list().next().unwrap().name, "a");
    }

    #[tokio::test]
    async fn test_from_config_registers_builtins() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut config = ToolGuardConfig::default();
        config.scanner.log_dir = dir.path().to_path_buf();
        config.scanner.dispatch = crate::config::DispatchMode::Task;
        config.logging.diagnostic_log = dir.path().join("diag.log");

        let registry = ToolRegistry::from_config(&config, None).unwrap();
        assert_eq!(registry.len(), 5);
        assert!(registry.get("scanProject").is_some());
    }
}
