use thiserror::Error;

use crate::core::mcp::RpcErr;

/// Fixed JSON-RPC error code table.
pub mod code {
    pub const PARSE_ERROR: i32 = -32700;
    pub const INVALID_REQUEST: i32 = -32600;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL_ERROR: i32 = -32603;
    pub const TOOL_NOT_FOUND: i32 = -32001;
    pub const TOOL_EXECUTION_ERROR: i32 = -32002;
}

/// Protocol-level failure. The `Display` text is the wire `message`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum McpError {
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("{0}")]
    InvalidRequest(String),
    #[error("Unknown method: {0}")]
    MethodNotFound(String),
    #[error("{0}")]
    InvalidParams(String),
    #[error("{0}")]
    Internal(String),
    #[error("Unknown tool: {0}")]
    ToolNotFound(String),
    #[error("Tool execution failed: {0}")]
    ToolExecution(String),
}

impl McpError {
    pub fn code(&self) -> i32 {
        match self {
            McpError::Parse(_) => code::PARSE_ERROR,
            McpError::InvalidRequest(_) => code::INVALID_REQUEST,
            McpError::MethodNotFound(_) => code::METHOD_NOT_FOUND,
            McpError::InvalidParams(_) => code::INVALID_PARAMS,
            McpError::Internal(_) => code::INTERNAL_ERROR,
            McpError::ToolNotFound(_) => code::TOOL_NOT_FOUND,
            McpError::ToolExecution(_) => code::TOOL_EXECUTION_ERROR,
        }
    }

    pub fn invalid_request(msg: impl Into<String>) -> Self {
        McpError::InvalidRequest(msg.into())
    }

    pub fn invalid_params(msg: impl Into<String>) -> Self {
        McpError::InvalidParams(msg.into())
    }
}

impl From<McpError> for RpcErr {
    fn from(e: McpError) -> Self {
        RpcErr {
            code: e.code(),
            message: e.to_string(),
            data: None,
        }
    }
}
