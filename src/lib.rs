//! ToolGuard - sensitive-data gateway for agent tools
//!
//! ToolGuard exposes a small set of tools to a Model Context Protocol
//! client and makes sure no sensitive data crosses the tool boundary in
//! either direction.
//!
//! ## Architecture
//!
//! ```text
//!   MCP client (stdio JSON-RPC)
//!          │
//! ┌────────▼────────────────────────────────────────────────┐
//! │                      McpServer                          │
//! │  ┌───────────────────────────────────────────────────┐  │
//! │  │                  ToolRegistry                      │  │
//! │  │  sanitize  readFile  writeFile  sendToLLM          │  │
//! │  │      └─────────┴──────────┴─────────┘              │  │
//! │  │                     │              scanProject      │  │
//! │  │        ┌────────────▼───────────┐       │           │  │
//! │  │        │  SanitizationGateway   │       │           │  │
//! │  │        │  pre-check / post-check│       │           │  │
//! │  │        └────────────┬───────────┘       │           │  │
//! │  └─────────────────────┼───────────────────┼───────────┘  │
//! └────────────────────────┼───────────────────┼──────────────┘
//!                          │                   │
//!                ┌─────────▼────────┐  ┌───────▼──────────┐
//!                │     Detector     │  │ ScanOrchestrator │
//!                │ (external proc)  │  │  detached worker │
//!                └──────────────────┘  └──────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`detector`]: Detector bridge and built-in detectors
//! - [`gateway`]: Pre/post sanitization around tool handlers
//! - [`files`]: Sanitizing file read/write
//! - [`scan`]: Background secret scanning
//! - [`tools`]: Tool registry and built-in tools
//! - [`mcp`]: JSON-RPC stdio transport
//! - [`logsink`]: Append-only timestamped log files
//! - [`config`]: Configuration management

pub mod config;
pub mod detector;
pub mod error;
pub mod files;
pub mod gateway;
pub mod logsink;
pub mod mcp;
pub mod scan;
pub mod tools;

pub use config::ToolGuardConfig;
pub use error::{Error, Result};
