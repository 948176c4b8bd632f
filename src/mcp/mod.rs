//! Model Context Protocol transport
//!
//! Exposes the tool registry to an MCP client as JSON-RPC 2.0 over
//! newline-delimited stdin/stdout. Supported methods: `initialize`,
//! `ping`, `tools/list`, `tools/call`. Notifications are accepted and
//! never answered.

pub mod protocol;
mod server;

pub use server::McpServer;
