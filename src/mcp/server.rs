//! MCP server over newline-delimited stdio

use super::protocol::{
    JsonRpcRequest, JsonRpcResponse, DEFAULT_PROTOCOL_VERSION, INTERNAL_ERROR, INVALID_PARAMS, INVALID_REQUEST,
    JSONRPC_VERSION, METHOD_NOT_FOUND, PARSE_ERROR,
};
use crate::error::Result;
use crate::gateway::{ToolCall, ToolResult};
use crate::tools::ToolRegistry;
use futures::StreamExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tokio_util::codec::{FramedRead, LinesCodec};

/// Longest accepted request line
const MAX_LINE_LENGTH: usize = 16 * 1024 * 1024;

/// Serves a [`ToolRegistry`] to one MCP client
pub struct McpServer {
    name: String,
    version: String,
    tools: ToolRegistry,
}

impl McpServer {
    pub fn new(name: impl Into<String>, version: impl Into<String>, tools: ToolRegistry) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            tools,
        }
    }

    /// Handle one JSON-RPC message. Returns `None` for notifications.
    pub async fn handle_message(&self, message: &str) -> Option<String> {
        let response = match serde_json::from_str::<JsonRpcRequest>(message) {
            Err(e) => Some(JsonRpcResponse::failure(
                Value::Null,
                PARSE_ERROR,
                format!("Parse error: {}", e),
            )),
            Ok(request) => self.handle_request(request).await,
        }?;
        Some(serde_json::to_string(&response).unwrap_or_default())
    }

    async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        if request.is_notification() {
            tracing::debug!(method = %request.method, "Notification received");
            return None;
        }
        let id = request.id.clone().unwrap_or(Value::Null);

        if request.jsonrpc != JSONRPC_VERSION {
            return Some(JsonRpcResponse::failure(
                id,
                INVALID_REQUEST,
                format!("Unsupported jsonrpc version: {:?}", request.jsonrpc),
            ));
        }

        let response = match request.method.as_str() {
            "initialize" => JsonRpcResponse::success(id, self.initialize(&request.params)),
            "ping" => JsonRpcResponse::success(id, json!({})),
            "tools/list" => JsonRpcResponse::success(id, self.list_tools()),
            "tools/call" => self.call_tool(id, request.params).await,
            method => {
                JsonRpcResponse::failure(id, METHOD_NOT_FOUND, format!("Method not found: {}", method))
            }
        };
        Some(response)
    }

    fn initialize(&self, params: &Value) -> Value {
        let protocol_version = params
            .get("protocolVersion")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_PROTOCOL_VERSION);
        tracing::info!(protocol_version, "Client initialized");
        json!({
            "protocolVersion": protocol_version,
            "serverInfo": { "name": self.name, "version": self.version },
            "capabilities": { "tools": { "listChanged": false } },
        })
    }

    fn list_tools(&self) -> Value {
        let tools: Vec<Value> = self
            .tools
            .list()
            .map(|tool| {
                json!({
                    "name": tool.name,
                    "description": tool.description,
                    "inputSchema": tool.input_schema,
                })
            })
            .collect();
        json!({ "tools": tools })
    }

    async fn call_tool(&self, id: Value, params: Value) -> JsonRpcResponse {
        let call: ToolCall = match serde_json::from_value(params) {
            Ok(call) => call,
            Err(e) => {
                return JsonRpcResponse::failure(id, INVALID_PARAMS, format!("Invalid params: {}", e))
            }
        };
        if self.tools.get(&call.name).is_none() {
            return JsonRpcResponse::failure(
                id,
                INVALID_PARAMS,
                format!("Unknown tool: {}", call.name),
            );
        }

        let name = call.name.clone();
        let result = match self.tools.call(call).await {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(tool = %name, "Tool call failed: {}", e);
                ToolResult::error(e.to_string())
            }
        };
        match serde_json::to_value(&result) {
            Ok(value) => JsonRpcResponse::success(id, value),
            Err(e) => JsonRpcResponse::failure(id, INTERNAL_ERROR, e.to_string()),
        }
    }

    /// Serve requests from stdin until EOF. Requests are handled
    /// concurrently; each response is written as one stdout line.
    pub async fn serve_stdio(self) -> Result<()> {
        let server = Arc::new(self);
        let (tx, mut rx) = mpsc::unbounded_channel::<String>();

        let writer = tokio::spawn(async move {
            let mut stdout = tokio::io::stdout();
            while let Some(line) = rx.recv().await {
                let mut frame = line.into_bytes();
                frame.push(b'\n');
                stdout.write_all(&frame).await?;
                stdout.flush().await?;
            }
            Ok::<_, std::io::Error>(())
        });

        let mut lines = FramedRead::new(
            tokio::io::stdin(),
            LinesCodec::new_with_max_length(MAX_LINE_LENGTH),
        );
        tracing::info!(tools = server.tools.len(), "Serving MCP on stdio");

        while let Some(line) = lines.next().await {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    tracing::warn!("Dropping unreadable request: {}", e);
                    continue;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            let server = Arc::clone(&server);
            let tx = tx.clone();
            tokio::spawn(async move {
                if let Some(response) = server.handle_message(&line).await {
                    let _ = tx.send(response);
                }
            });
        }

        tracing::info!("stdin closed, waiting for in-flight requests");
        drop(tx);
        writer
            .await
            .map_err(|e| crate::Error::Internal(format!("stdout writer failed: {}", e)))??;
        Ok(())
    }
}
