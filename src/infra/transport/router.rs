//! MCP path table and legacy path-to-method rewriting.

use serde_json::Value as J;

pub const MCP_PATH: &str = "/mcp";

const LEGACY_ROUTES: [(&str, &str); 3] = [
    ("/mcp/initialize", "initialize"),
    ("/mcp/tools/list", "tools/list"),
    ("/mcp/tools/call", "tools/call"),
];

pub fn is_mcp_path(path: &str) -> bool {
    path == MCP_PATH || legacy_method_for_path(path).is_some()
}

pub fn legacy_method_for_path(path: &str) -> Option<&'static str> {
    LEGACY_ROUTES.iter().find(|(p, _)| *p == path).map(|(_, m)| *m)
}

/// Injects the path-implied `method` into an object body that lacks one.
///
/// Bodies that already name a method, fail to parse or are not objects pass
/// through untouched, as does everything posted to the canonical endpoint.
pub fn apply_legacy_routing(path: &str, body: &str) -> String {
    let Some(method) = legacy_method_for_path(path) else {
        return body.to_string();
    };
    match serde_json::from_str::<J>(body) {
        Ok(J::Object(mut obj)) if !obj.contains_key("method") => {
            obj.insert("method".into(), J::from(method));
            tracing::debug!(path, method, "legacy route injected method");
            J::Object(obj).to_string()
        }
        _ => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn knows_the_mcp_path_set() {
        for p in ["/mcp", "/mcp/initialize", "/mcp/tools/list", "/mcp/tools/call"] {
            assert!(is_mcp_path(p), "{p}");
        }
        for p in ["/", "/mcp/", "/mcp/ping", "/healthz", "/MCP"] {
            assert!(!is_mcp_path(p), "{p}");
        }
    }

    #[test]
    fn injects_method_for_legacy_paths() {
        let out = apply_legacy_routing("/mcp/tools/call", r#"{"id":1,"params":{"name":"x"}}"#);
        let v: J = serde_json::from_str(&out).unwrap();
        assert_eq!(v["method"], "tools/call");
        assert_eq!(v["id"], 1);
        assert_eq!(v["params"], json!({"name": "x"}));

        let out = apply_legacy_routing("/mcp/initialize", r#"{"id":"a"}"#);
        assert_eq!(serde_json::from_str::<J>(&out).unwrap()["method"], "initialize");
    }

    #[test]
    fn explicit_method_wins() {
        let body = r#"{"id":1,"method":"ping"}"#;
        assert_eq!(apply_legacy_routing("/mcp/tools/list", body), body);
    }

    #[test]
    fn unparseable_or_non_object_bodies_pass_through() {
        assert_eq!(apply_legacy_routing("/mcp/tools/list", "{ nope"), "{ nope");
        assert_eq!(apply_legacy_routing("/mcp/tools/list", "[1,2]"), "[1,2]");
        assert_eq!(apply_legacy_routing("/mcp/tools/list", ""), "");
    }

    #[test]
    fn canonical_path_is_never_rewritten() {
        let body = r#"{"id":1}"#;
        assert_eq!(apply_legacy_routing("/mcp", body), body);
    }
}
