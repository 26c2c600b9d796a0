//! MCP-style JSON-RPC 2.0 tool server.
//!
//! Hosts register named, schema-described tools on an [`McpServer`]; a
//! [`Transport`] (HTTP via axum, or stdio) feeds raw request bodies to the
//! engine and writes back whatever it returns.
//!
//! ```no_run
//! use std::sync::Arc;
//! use mcp_tool_gateway::{McpServer, ToolResult, ToolSchema, Transport};
//! use mcp_tool_gateway::infra::transport::{cors::CorsConfig, http::HttpTransport};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let server = Arc::new(McpServer::new("my-host", "1.0.0"));
//! server.register_fn("hello", "Say hello", ToolSchema::new(), |_args, _ctx| {
//!     Ok(ToolResult::success_text("hello"))
//! });
//!
//! let transport = HttpTransport::new(([127, 0, 0, 1], 8767).into(), CorsConfig::default());
//! transport.set_request_handler(server.request_handler());
//! transport.start().await?;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod cli;
pub mod core;
pub mod infra;
pub mod tools;

pub use crate::api::mcp::McpServer;
pub use crate::core::error::McpError;
pub use crate::core::schema::{ToolAnnotations, ToolSchema};
pub use crate::core::tool::{Tool, ToolContext, ToolError, ToolHandler, ToolResult};
pub use crate::infra::transport::{Transport, TransportRequest, TransportResponse};
pub use crate::tools::registry::ToolRegistry;
