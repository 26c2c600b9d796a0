//! Shared MCP protocol surface: JSON-RPC envelopes and `initialize` payloads.

use serde::{Deserialize, Serialize};
use serde_json::Value as J;

pub const JSONRPC_VERSION: &str = "2.0";
pub const DEFAULT_PROTOCOL_VERSION: &str = "2024-11-05";

// --- JSON-RPC envelopes ---

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct RpcResp {
    pub jsonrpc: &'static str,
    pub id: J,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<J>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcErr>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct RpcErr {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<J>,
}

pub fn ok(id: J, result: J) -> RpcResp {
    RpcResp { jsonrpc: JSONRPC_VERSION, id, result: Some(result), error: None }
}

pub fn err(id: J, code: i32, msg: impl Into<String>, data: Option<J>) -> RpcResp {
    RpcResp {
        jsonrpc: JSONRPC_VERSION,
        id,
        result: None,
        error: Some(RpcErr { code, message: msg.into(), data }),
    }
}

// --- initialize ---

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResult {
    pub protocol_version: String,
    pub capabilities: ServerCapabilities,
    pub server_info: ServerInfo,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
}

impl ServerInfo {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self { name: name.into(), version: version.into() }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerCapabilities {
    pub tools: ToolsCapability,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ToolsCapability {
    pub list_changed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn it_serializes_initialize_result_in_camel_case() {
        let v = InitializeResult {
            protocol_version: DEFAULT_PROTOCOL_VERSION.into(),
            capabilities: ServerCapabilities::default(),
            server_info: ServerInfo::new("gw", "0.1"),
        };
        let out = serde_json::to_value(&v).unwrap();
        assert_eq!(out["protocolVersion"], "2024-11-05");
        assert_eq!(out["capabilities"]["tools"]["listChanged"], false);
        assert_eq!(out["serverInfo"]["name"], "gw");
    }

    #[test]
    fn ok_envelope_omits_error() {
        let s = serde_json::to_string(&ok(json!(7), json!({"a": 1}))).unwrap();
        assert_eq!(s, r#"{"jsonrpc":"2.0","id":7,"result":{"a":1}}"#);
    }

    #[test]
    fn err_envelope_omits_result_and_empty_data() {
        let s = serde_json::to_string(&err(J::Null, -32700, "bad", None)).unwrap();
        assert_eq!(s, r#"{"jsonrpc":"2.0","id":null,"error":{"code":-32700,"message":"bad"}}"#);
    }
}
