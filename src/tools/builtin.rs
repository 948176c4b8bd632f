//! Built-in tools: `sanitize`, `readFile`, `writeFile`, `sendToLLM`, `scanProject`

use super::{ToolDef, ToolRegistry};
use crate::detector::Detector;
use crate::error::{Error, Result};
use crate::files::{read_file_sanitized, write_file_sanitized};
use crate::gateway::{handler, SanitizationGateway, ToolArgs, ToolResult};
use crate::scan::ScanOrchestrator;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;

/// Fetch a required string argument
fn required_str(args: &ToolArgs, key: &str) -> Result<String> {
    match args.get(key) {
        Some(serde_json::Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(Error::InvalidArgument(format!("'{}' must be a string", key))),
        None => Err(Error::InvalidArgument(format!("missing required argument '{}'", key))),
    }
}

/// JSON schema for an object of required string properties
fn string_schema(keys: &[&str]) -> serde_json::Value {
    let properties: serde_json::Map<String, serde_json::Value> = keys
        .iter()
        .map(|k| (k.to_string(), json!({ "type": "string" })))
        .collect();
    json!({
        "type": "object",
        "properties": properties,
        "required": keys,
    })
}

/// Register the built-in tools. All but `scanProject` go through `gateway`.
pub fn register_builtin_tools(
    registry: &mut ToolRegistry,
    gateway: &SanitizationGateway,
    orchestrator: Arc<ScanOrchestrator>,
) {
    let detector = Arc::clone(gateway.detector());

    registry.register(ToolDef {
        name: "sanitize".into(),
        description: "Inspect text for sensitive data and return the sanitization result".into(),
        input_schema: string_schema(&["text"]),
        handler: gateway.wrap("sanitize", sanitize_tool(Arc::clone(&detector))),
    });

    registry.register(ToolDef {
        name: "readFile".into(),
        description: "Read a file and return its sanitized content".into(),
        input_schema: string_schema(&["path"]),
        handler: gateway.wrap("readFile", read_file_tool(Arc::clone(&detector))),
    });

    registry.register(ToolDef {
        name: "writeFile".into(),
        description: "Write sanitized data to a file".into(),
        input_schema: string_schema(&["path", "data"]),
        handler: gateway.wrap("writeFile", write_file_tool(Arc::clone(&detector))),
    });

    registry.register(ToolDef {
        name: "sendToLLM".into(),
        description: "Pass data through the sensitive-data gate".into(),
        input_schema: string_schema(&["data"]),
        handler: gateway.wrap(
            "sendToLLM",
            handler(|args: ToolArgs| async move {
                required_str(&args, "data")?;
                Ok(ToolResult::text(""))
            }),
        ),
    });

    registry.register(ToolDef {
        name: "scanProject".into(),
        description: "Start a background secret scan; findings are written to the returned log file"
            .into(),
        input_schema: string_schema(&["project_path"]),
        handler: scan_project_tool(orchestrator),
    });
}

fn sanitize_tool(detector: Arc<dyn Detector>) -> crate::gateway::ToolHandler {
    handler(move |args: ToolArgs| {
        let detector = Arc::clone(&detector);
        async move {
            let text = required_str(&args, "text")?;
            let result = detector.inspect(&text).await;
            Ok(ToolResult::text(serde_json::to_string_pretty(&result)?))
        }
    })
}

fn read_file_tool(detector: Arc<dyn Detector>) -> crate::gateway::ToolHandler {
    handler(move |args: ToolArgs| {
        let detector = Arc::clone(&detector);
        async move {
            let path = PathBuf::from(required_str(&args, "path")?);
            let result = read_file_sanitized(detector.as_ref(), &path).await?;
            Ok(ToolResult::text(result.sanitized))
        }
    })
}

fn write_file_tool(detector: Arc<dyn Detector>) -> crate::gateway::ToolHandler {
    handler(move |args: ToolArgs| {
        let detector = Arc::clone(&detector);
        async move {
            let path = required_str(&args, "path")?;
            let data = required_str(&args, "data")?;
            write_file_sanitized(detector.as_ref(), PathBuf::from(&path).as_path(), &data).await?;
            Ok(ToolResult::text(format!("File {} written successfully.", path)))
        }
    })
}

fn scan_project_tool(orchestrator: Arc<ScanOrchestrator>) -> crate::gateway::ToolHandler {
    handler(move |args: ToolArgs| {
        let orchestrator = Arc::clone(&orchestrator);
        async move {
            let project_path = required_str(&args, "project_path")?;
            let job = orchestrator.start_scan(PathBuf::from(project_path).as_path()).await?;
            let ack = json!({
                "status": "scan_started",
                "log_file": job.log_file_path.to_string_lossy(),
            });
            Ok(ToolResult::text(ack.to_string()))
        }
    })
}
