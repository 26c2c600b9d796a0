//! JSON-RPC 2.0 engine with the four built-in MCP methods.
//!
//! `handle_request` is synchronous and transport-free: it takes the raw body
//! text and returns the response text, or an empty string when nothing must
//! be written (notifications). Tool handlers run on the calling thread.

use std::sync::Arc;
use std::time::Instant;

use serde_json::{json, Map, Value as J};

use crate::core::error::McpError;
use crate::core::mcp::{err as rpc_err, ok as rpc_ok, InitializeResult, RpcResp, ServerCapabilities, ServerInfo};
use crate::core::mcp::{DEFAULT_PROTOCOL_VERSION, JSONRPC_VERSION};
use crate::core::schema::ToolSchema;
use crate::core::tool::{Tool, ToolContext, ToolError, ToolResult};
use crate::infra::http::json::{encode, JSON_CONTENT_TYPE};
use crate::infra::transport::{RequestHandler, TransportRequest, TransportResponse};
use crate::tools::registry::ToolRegistry;

/// `(method, raw_json)`; envelope failures report `parse_error` / `invalid_request`.
pub type RequestReceivedHook = Arc<dyn Fn(&str, &str) + Send + Sync>;
/// `(tool_name, success, error_message)`.
pub type ToolExecutedHook = Arc<dyn Fn(&str, bool, &str) + Send + Sync>;
/// Exact response text about to be returned.
pub type ResponseSentHook = Arc<dyn Fn(&str) + Send + Sync>;

#[derive(Clone, Default)]
struct Hooks {
    request_received: Option<RequestReceivedHook>,
    tool_executed: Option<ToolExecutedHook>,
    response_sent: Option<ResponseSentHook>,
}

pub struct McpServer {
    info: ServerInfo,
    protocol_version: String,
    registry: ToolRegistry,
    context: ToolContext,
    hooks: Hooks,
}

impl McpServer {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            info: ServerInfo::new(name, version),
            protocol_version: DEFAULT_PROTOCOL_VERSION.to_string(),
            registry: ToolRegistry::new(),
            context: ToolContext::new(),
            hooks: Hooks::default(),
        }
    }

    /// Context handed to every tool handler.
    pub fn with_context(mut self, context: ToolContext) -> Self {
        self.context = context;
        self
    }

    pub fn with_protocol_version(mut self, version: impl Into<String>) -> Self {
        self.protocol_version = version.into();
        self
    }

    /// Share an existing registry (e.g. one populated by the host beforehand).
    pub fn with_registry(mut self, registry: ToolRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn info(&self) -> &ServerInfo {
        &self.info
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn register_tool(&self, tool: Tool) {
        self.registry.register(tool);
    }

    pub fn register_fn<F>(&self, name: impl Into<String>, description: impl Into<String>, schema: ToolSchema, handler: F)
    where
        F: Fn(&J, &ToolContext) -> Result<ToolResult, ToolError> + Send + Sync + 'static,
    {
        self.registry.register_fn(name, description, schema, handler);
    }

    pub fn on_request_received(&mut self, hook: impl Fn(&str, &str) + Send + Sync + 'static) {
        self.hooks.request_received = Some(Arc::new(hook));
    }

    pub fn on_tool_executed(&mut self, hook: impl Fn(&str, bool, &str) + Send + Sync + 'static) {
        self.hooks.tool_executed = Some(Arc::new(hook));
    }

    pub fn on_response_sent(&mut self, hook: impl Fn(&str) + Send + Sync + 'static) {
        self.hooks.response_sent = Some(Arc::new(hook));
    }

    /// Parses `raw`, dispatches a single request or a batch, and returns the
    /// serialized response. Empty string means "write no body".
    pub fn handle_request(&self, raw: &str) -> String {
        let parsed: J = match serde_json::from_str(raw) {
            Ok(v) => v,
            Err(e) => {
                tracing::debug!(error = %e, "rejecting malformed JSON");
                self.request_received("parse_error", raw);
                return self.emit_one(&error_response(J::Null, McpError::Parse(e.to_string())));
            }
        };

        match parsed {
            J::Array(items) => self.handle_batch(items),
            J::Object(_) => match self.handle_single(&parsed, raw) {
                Some(resp) => self.emit_one(&resp),
                None => String::new(),
            },
            _ => {
                self.request_received("invalid_request", raw);
                self.emit_one(&error_response(J::Null, McpError::invalid_request("Invalid JSON-RPC batch")))
            }
        }
    }

    fn handle_batch(&self, items: Vec<J>) -> String {
        if items.is_empty() {
            return self.emit_one(&error_response(J::Null, McpError::invalid_request("Invalid JSON-RPC batch")));
        }
        let responses: Vec<RpcResp> = items
            .iter()
            .filter_map(|item| self.handle_single(item, &item.to_string()))
            .collect();
        tracing::debug!(requests = items.len(), responses = responses.len(), "batch handled");
        if responses.is_empty() {
            return String::new();
        }
        let text = serde_json::to_string(&responses).unwrap_or_else(|e| {
            tracing::error!(error = %e, "failed to serialize batch response");
            encode(&error_response(J::Null, McpError::Internal("Internal error".into())))
        });
        self.emit(text)
    }

    /// `None` when the request was a notification.
    fn handle_single(&self, req: &J, raw: &str) -> Option<RpcResp> {
        let Some(obj) = req.as_object() else {
            self.request_received("invalid_request", raw);
            return Some(error_response(J::Null, McpError::invalid_request("Invalid JSON-RPC request")));
        };

        let id = obj.get("id").cloned().unwrap_or(J::Null);
        let is_notification = id.is_null();

        match (self.dispatch(obj, raw), is_notification) {
            (Ok(result), false) => Some(rpc_ok(id, result)),
            (Err(e), false) => Some(error_response(id, e)),
            (Ok(_), true) => None,
            (Err(e), true) => {
                tracing::debug!(code = e.code(), error = %e, "notification failed; no response sent");
                None
            }
        }
    }

    fn dispatch(&self, obj: &Map<String, J>, raw: &str) -> Result<J, McpError> {
        if let Some(version) = obj.get("jsonrpc") {
            if version.as_str() != Some(JSONRPC_VERSION) {
                self.request_received("invalid_request", raw);
                return Err(McpError::invalid_request("Invalid 'jsonrpc' version"));
            }
        }
        let Some(method) = obj.get("method").and_then(J::as_str) else {
            self.request_received("invalid_request", raw);
            return Err(McpError::invalid_request("Missing 'method'"));
        };

        self.request_received(method, raw);
        tracing::debug!(method, "dispatching");

        match method {
            "initialize" => self.initialize(),
            "tools/list" => Ok(json!({ "tools": self.registry.descriptors() })),
            "tools/call" => self.call_tool(obj.get("params")),
            "ping" => Ok(json!({ "status": "ok" })),
            other => Err(McpError::MethodNotFound(other.to_string())),
        }
    }

    fn initialize(&self) -> Result<J, McpError> {
        let result = InitializeResult {
            protocol_version: self.protocol_version.clone(),
            capabilities: ServerCapabilities::default(),
            server_info: self.info.clone(),
        };
        serde_json::to_value(result).map_err(|e| McpError::Internal(e.to_string()))
    }

    fn call_tool(&self, params: Option<&J>) -> Result<J, McpError> {
        let params = match params {
            None | Some(J::Null) => return Err(McpError::invalid_params("Missing 'params'")),
            Some(p) => p.as_object().ok_or_else(|| McpError::invalid_params("Invalid 'params'"))?,
        };
        let name = params
            .get("name")
            .and_then(J::as_str)
            .ok_or_else(|| McpError::invalid_params("Missing 'params.name'"))?;

        let empty = J::Object(Map::new());
        let arguments = match params.get("arguments") {
            None | Some(J::Null) => &empty,
            Some(args @ J::Object(_)) => args,
            Some(_) => return Err(McpError::invalid_params("Invalid 'params.arguments'")),
        };

        let Some(tool) = self.registry.get(name) else {
            tracing::warn!(tool = name, "call for unregistered tool");
            metrics::counter!("mcp_tool_calls_total", "tool" => name.to_string(), "outcome" => "not_found").increment(1);
            self.tool_executed(name, false, "Tool not found");
            return Err(McpError::ToolNotFound(name.to_string()));
        };

        // Registry lock is already released; the handler runs unguarded.
        let started = Instant::now();
        let result = tool.invoke(arguments, &self.context);
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

        let outcome = if result.is_error { "error" } else { "ok" };
        metrics::counter!("mcp_tool_calls_total", "tool" => name.to_string(), "outcome" => outcome).increment(1);
        metrics::histogram!("mcp_tool_duration_ms", "tool" => name.to_string()).record(elapsed_ms);
        if result.is_error {
            tracing::warn!(tool = name, elapsed_ms, error = %result.error_message, "tool returned an error");
        } else {
            tracing::info!(tool = name, elapsed_ms, "tool executed");
        }
        self.tool_executed(name, !result.is_error, &result.error_message);

        Ok(result.to_call_result())
    }

    fn emit_one(&self, resp: &RpcResp) -> String {
        self.emit(encode(resp))
    }

    // Single exit point for every non-empty response.
    fn emit(&self, text: String) -> String {
        if let Some(hook) = &self.hooks.response_sent {
            hook(&text);
        }
        text
    }

    fn request_received(&self, method: &str, raw: &str) {
        if let Some(hook) = &self.hooks.request_received {
            hook(method, raw);
        }
    }

    fn tool_executed(&self, name: &str, success: bool, message: &str) {
        if let Some(hook) = &self.hooks.tool_executed {
            hook(name, success, message);
        }
    }

    /// Transport handler: body in, JSON-RPC out. Notifications answer 202.
    pub fn request_handler(self: &Arc<Self>) -> RequestHandler {
        let server = Arc::clone(self);
        Arc::new(move |req: &dyn TransportRequest, resp: &mut dyn TransportResponse| {
            let out = server.handle_request(req.body());
            if out.is_empty() {
                resp.set_no_content();
                return;
            }
            resp.set_status(200, "OK");
            resp.set_content_type(JSON_CONTENT_TYPE);
            resp.set_body(out);
        })
    }
}

fn error_response(id: J, e: McpError) -> RpcResp {
    rpc_err(id, e.code(), e.to_string(), None)
}
