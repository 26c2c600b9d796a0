use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use serde_json::{json, Value as J};
use thiserror::Error;

use crate::core::schema::{ToolAnnotations, ToolSchema};

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("{0}")]
    Message(String),
    #[error("invalid argument '{name}': {reason}")]
    InvalidArgument { name: String, reason: String },
}

impl ToolError {
    pub fn msg(message: impl Into<String>) -> Self {
        ToolError::Message(message.into())
    }
}

/// Outcome of one tool execution, before it is wrapped into MCP `content`.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolResult {
    pub content: J,
    pub is_error: bool,
    pub error_message: String,
}

impl ToolResult {
    pub fn success(content: impl Into<J>) -> Self {
        Self { content: content.into(), is_error: false, error_message: String::new() }
    }

    /// Parses `text` as JSON when it is JSON; otherwise keeps it as a raw string.
    pub fn success_text(text: impl AsRef<str>) -> Self {
        let text = text.as_ref();
        let content = serde_json::from_str(text).unwrap_or_else(|_| J::String(text.to_owned()));
        Self::success(content)
    }

    pub fn error(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            content: json!({ "error": message }),
            is_error: true,
            error_message: message,
        }
    }

    /// `{content:[{type:"text", text}], isError?:true}` as returned by `tools/call`.
    pub fn to_call_result(&self) -> J {
        let text = match &self.content {
            J::String(s) => s.clone(),
            other => other.to_string(),
        };
        let mut out = json!({ "content": [{ "type": "text", "text": text }] });
        if self.is_error {
            out["isError"] = J::Bool(true);
        }
        out
    }
}

/// Per-call capability object handed to every handler.
///
/// Opaque to the gateway; a host stores its own state here and handlers
/// recover it with [`ToolContext::state`].
#[derive(Clone, Default)]
pub struct ToolContext {
    state: Option<Arc<dyn Any + Send + Sync>>,
}

impl ToolContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state<T: Any + Send + Sync>(state: Arc<T>) -> Self {
        Self { state: Some(state) }
    }

    pub fn state<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.state.as_deref()?.downcast_ref::<T>()
    }
}

impl fmt::Debug for ToolContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolContext").field("has_state", &self.state.is_some()).finish()
    }
}

/// The single capability a tool needs: invoke(args, context) -> result.
pub trait ToolHandler: Send + Sync {
    fn call(&self, arguments: &J, context: &ToolContext) -> Result<ToolResult, ToolError>;
}

impl<F> ToolHandler for F
where
    F: Fn(&J, &ToolContext) -> Result<ToolResult, ToolError> + Send + Sync,
{
    fn call(&self, arguments: &J, context: &ToolContext) -> Result<ToolResult, ToolError> {
        self(arguments, context)
    }
}

/// Name + metadata + handler, as owned by the registry.
#[derive(Clone)]
pub struct Tool {
    name: String,
    description: String,
    schema: ToolSchema,
    annotations: ToolAnnotations,
    handler: Arc<dyn ToolHandler>,
}

impl Tool {
    pub fn new<F>(name: impl Into<String>, description: impl Into<String>, schema: ToolSchema, handler: F) -> Self
    where
        F: Fn(&J, &ToolContext) -> Result<ToolResult, ToolError> + Send + Sync + 'static,
    {
        Self::from_handler(name, description, schema, handler)
    }

    pub fn from_handler<H>(name: impl Into<String>, description: impl Into<String>, schema: ToolSchema, handler: H) -> Self
    where
        H: ToolHandler + 'static,
    {
        let name = name.into();
        Self {
            annotations: ToolAnnotations::titled(name.clone()),
            name,
            description: description.into(),
            schema,
            handler: Arc::new(handler),
        }
    }

    pub fn with_annotations(mut self, annotations: ToolAnnotations) -> Self {
        self.annotations = annotations;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn schema(&self) -> &ToolSchema {
        &self.schema
    }

    pub fn annotations(&self) -> &ToolAnnotations {
        &self.annotations
    }

    /// `tools/list` entry for this tool.
    pub fn descriptor(&self) -> J {
        json!({
            "name": self.name,
            "description": self.description,
            "inputSchema": self.schema.to_json(),
            "annotations": self.annotations.to_json(),
        })
    }

    /// Runs the handler. Errors and panics both come back as `ToolResult::error`.
    pub fn invoke(&self, arguments: &J, context: &ToolContext) -> ToolResult {
        match panic::catch_unwind(AssertUnwindSafe(|| self.handler.call(arguments, context))) {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => ToolResult::error(format!("Tool execution failed: {e}")),
            Err(payload) => ToolResult::error(format!("Tool execution failed: {}", panic_message(payload.as_ref()))),
        }
    }
}

impl fmt::Debug for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tool")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("schema", &self.schema)
            .field("annotations", &self.annotations)
            .finish_non_exhaustive()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "handler panicked".to_string()
    }
}

// --- lenient argument readers for handlers ---

/// String argument; non-string values are stringified, null/absent yields `default`.
pub fn arg_str(args: &J, key: &str, default: &str) -> String {
    match args.get(key) {
        None | Some(J::Null) => default.to_string(),
        Some(J::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Integer argument; numeric strings are parsed, anything else yields `default`.
pub fn arg_i64(args: &J, key: &str, default: i64) -> i64 {
    match args.get(key) {
        Some(J::Number(n)) => n.as_i64().unwrap_or(default),
        Some(J::String(s)) => s.trim().parse().unwrap_or(default),
        _ => default,
    }
}

/// Boolean argument; `"true"`, `"1"` and `"yes"` (any case) count as true.
pub fn arg_bool(args: &J, key: &str, default: bool) -> bool {
    match args.get(key) {
        Some(J::Bool(b)) => *b,
        Some(J::String(s)) => matches!(s.to_ascii_lowercase().as_str(), "true" | "1" | "yes"),
        _ => default,
    }
}
