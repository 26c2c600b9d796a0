//! Stand-in host tools, registered through the public API only.

use chrono::Utc;
use serde_json::{json, Value};

use crate::api::mcp::McpServer;
use crate::core::schema::{ToolAnnotations, ToolSchema};
use crate::core::tool::{arg_str, Tool, ToolError, ToolResult};

pub fn register_demo_tools(server: &McpServer) {
    server.register_tool(
        Tool::new(
            "echo",
            "Return the given message unchanged",
            ToolSchema::new().add_string("message", "Text to echo back", true),
            |args, _ctx| match args.get("message") {
                Some(Value::String(m)) => Ok(ToolResult::success(m.as_str())),
                _ => Err(ToolError::InvalidArgument { name: "message".into(), reason: "required string".into() }),
            },
        )
        .with_annotations(ToolAnnotations::titled("Echo")),
    );

    server.register_tool(
        Tool::new(
            "add",
            "Add two integers",
            ToolSchema::new()
                .add_integer("a", "First addend", true)
                .add_integer("b", "Second addend", true),
            |args, _ctx| {
                let (a, b) = (required_i64(args, "a")?, required_i64(args, "b")?);
                let sum = a
                    .checked_add(b)
                    .ok_or_else(|| ToolError::InvalidArgument { name: "b".into(), reason: "sum overflows i64".into() })?;
                Ok(ToolResult::success(json!({ "sum": sum })))
            },
        )
        .with_annotations(ToolAnnotations::titled("Add")),
    );

    server.register_tool(
        Tool::new(
            "clock",
            "Current UTC time",
            ToolSchema::new().add_enum("format", "Output format", ["rfc3339", "unix"], false),
            |args, _ctx| {
                let now = Utc::now();
                match arg_str(args, "format", "rfc3339").as_str() {
                    "rfc3339" => Ok(ToolResult::success(json!({ "now": now.to_rfc3339() }))),
                    "unix" => Ok(ToolResult::success(json!({ "now": now.timestamp() }))),
                    other => Err(ToolError::InvalidArgument { name: "format".into(), reason: format!("unsupported '{other}'") }),
                }
            },
        )
        .with_annotations(ToolAnnotations::titled("Clock").idempotent(false)),
    );
}

// Integers or integer strings; anything else is rejected rather than defaulted.
fn required_i64(args: &Value, key: &str) -> Result<i64, ToolError> {
    let parsed = match args.get(key) {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| ToolError::InvalidArgument { name: key.into(), reason: "required integer".into() })
}
