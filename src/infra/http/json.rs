use serde_json::Value as J;

use crate::core::mcp::{err as rpc_err, RpcResp};
use crate::infra::transport::TransportResponse;

pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

// Last resort if an envelope ever fails to serialize.
pub const INTERNAL_ERROR_BODY: &str =
    r#"{"jsonrpc":"2.0","id":null,"error":{"code":-32603,"message":"Internal error"}}"#;

pub fn encode(resp: &RpcResp) -> String {
    serde_json::to_string(resp).unwrap_or_else(|e| {
        tracing::error!(error = %e, "failed to serialize JSON-RPC envelope");
        INTERNAL_ERROR_BODY.to_string()
    })
}

/// JSON-RPC error envelope with `id: null`, as emitted by the transport itself.
pub fn error_body(code: i32, message: impl Into<String>) -> String {
    encode(&rpc_err(J::Null, code, message, None))
}

pub fn write_json(resp: &mut dyn TransportResponse, status: u16, reason: &str, body: String) {
    resp.set_status(status, reason);
    resp.set_content_type(JSON_CONTENT_TYPE);
    resp.set_body(body);
}

pub fn write_error(resp: &mut dyn TransportResponse, status: u16, reason: &str, code: i32, message: &str) {
    write_json(resp, status, reason, error_body(code, message));
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[derive(Default)]
    struct Capture {
        status: u16,
        content_type: String,
        body: String,
    }

    impl TransportResponse for Capture {
        fn set_status(&mut self, code: u16, _reason: &str) {
            self.status = code;
        }
        fn set_header(&mut self, _name: &str, _value: &str) {}
        fn set_content_type(&mut self, content_type: &str) {
            self.content_type = content_type.to_string();
        }
        fn set_body(&mut self, body: String) {
            self.body = body;
        }
        fn set_no_content(&mut self) {}
    }

    #[test]
    fn builds_error_body_with_null_id() {
        let v: Value = serde_json::from_str(&error_body(-32600, "bad \"quote\"\n")).unwrap();
        assert_eq!(v["jsonrpc"], "2.0");
        assert!(v["id"].is_null());
        assert_eq!(v["error"]["code"], -32600);
        assert_eq!(v["error"]["message"], "bad \"quote\"\n");
    }

    #[test]
    fn write_error_sets_status_type_and_body() {
        let mut c = Capture::default();
        write_error(&mut c, 405, "Method Not Allowed", -32600, "Use POST.");
        assert_eq!(c.status, 405);
        assert_eq!(c.content_type, JSON_CONTENT_TYPE);
        let v: Value = serde_json::from_str(&c.body).unwrap();
        assert_eq!(v["error"]["message"], "Use POST.");
    }

    #[test]
    fn fallback_body_is_valid_json() {
        let v: Value = serde_json::from_str(INTERNAL_ERROR_BODY).unwrap();
        assert_eq!(v["error"]["code"], -32603);
    }
}
