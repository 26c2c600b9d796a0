//! Origin / Accept policy, independent of the concrete transport.

use serde::{Deserialize, Serialize};

use super::{TransportRequest, TransportResponse};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    pub allow_localhost: bool,
    pub allowed_origins: Vec<String>,
    pub allow_methods: String,
    pub allow_headers: String,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allow_localhost: true,
            allowed_origins: Vec::new(),
            allow_methods: "POST, OPTIONS".into(),
            allow_headers: "Content-Type, Accept".into(),
        }
    }
}

impl CorsConfig {
    /// Adds an explicit origin unless an equal one (ignoring case) is already listed.
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        let origin = origin.into();
        if !self.allowed_origins.iter().any(|o| o.eq_ignore_ascii_case(&origin)) {
            self.allowed_origins.push(origin);
        }
        self
    }

    pub fn allow_localhost(mut self, allow: bool) -> Self {
        self.allow_localhost = allow;
        self
    }
}

/// Per-request verdict. Never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsResult {
    pub allowed: bool,
    pub has_origin: bool,
    pub is_preflight: bool,
    pub origin: String,
    pub status_code: u16,
    pub error_message: String,
}

impl CorsResult {
    fn allow(is_preflight: bool) -> Self {
        Self {
            allowed: true,
            has_origin: false,
            is_preflight,
            origin: String::new(),
            status_code: 200,
            error_message: String::new(),
        }
    }

    fn deny(mut self, status_code: u16, message: impl Into<String>) -> Self {
        self.allowed = false;
        self.status_code = status_code;
        self.error_message = message.into();
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct CorsValidator {
    config: CorsConfig,
}

impl CorsValidator {
    pub fn new(config: CorsConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CorsConfig {
        &self.config
    }

    pub fn validate(&self, req: &dyn TransportRequest, is_preflight: bool) -> CorsResult {
        let result = CorsResult::allow(is_preflight);

        if !is_preflight {
            let accept = req.header("Accept").map(str::trim).unwrap_or_default();
            if accept.is_empty() {
                return result.deny(406, "Missing Accept header. Must include application/json.");
            }
            let accept = accept.to_ascii_lowercase();
            if !accept.contains("application/json") && !accept.contains("*/*") {
                return result.deny(406, "Accept header must include application/json.");
            }
        }

        let origin = match req.header("Origin") {
            Some(o) if !o.is_empty() => o,
            None if req.has_header("Origin") => {
                let result = CorsResult { has_origin: true, ..result };
                return result.deny(403, "Origin not allowed: header is not valid ASCII");
            }
            _ => return result,
        };
        let result = CorsResult { has_origin: true, origin: origin.to_string(), ..result };
        if !self.is_origin_allowed(origin) {
            return result.deny(403, format!("Origin not allowed: {origin}"));
        }
        result
    }

    /// Echoes the validated origin (never `*`). No-op when there is no readable origin.
    pub fn apply_headers(&self, result: &CorsResult, resp: &mut dyn TransportResponse) {
        if !result.has_origin || result.origin.is_empty() {
            return;
        }
        resp.set_header("Access-Control-Allow-Origin", &result.origin);
        resp.set_header("Access-Control-Allow-Methods", &self.config.allow_methods);
        resp.set_header("Access-Control-Allow-Headers", &self.config.allow_headers);
        resp.set_header("Vary", "Origin");
    }

    fn is_origin_allowed(&self, origin: &str) -> bool {
        if self.config.allowed_origins.iter().any(|o| o.eq_ignore_ascii_case(origin)) {
            return true;
        }
        if self.config.allow_localhost {
            let lower = origin.to_ascii_lowercase();
            return ["localhost", "127.0.0.1", "::1"].iter().any(|h| lower.contains(h));
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[derive(Default)]
    struct FakeReq {
        headers: Vec<(&'static str, &'static str)>,
        opaque: Vec<&'static str>,
    }

    impl TransportRequest for FakeReq {
        fn method(&self) -> &str {
            "POST"
        }
        fn path(&self) -> &str {
            "/mcp"
        }
        fn header(&self, name: &str) -> Option<&str> {
            self.headers.iter().find(|(k, _)| k.eq_ignore_ascii_case(name)).map(|(_, v)| *v)
        }
        fn has_header(&self, name: &str) -> bool {
            self.header(name).is_some() || self.opaque.iter().any(|k| k.eq_ignore_ascii_case(name))
        }
        fn body(&self) -> &str {
            ""
        }
    }

    #[derive(Default)]
    struct FakeResp {
        headers: BTreeMap<String, String>,
    }

    impl TransportResponse for FakeResp {
        fn set_status(&mut self, _code: u16, _reason: &str) {}
        fn set_header(&mut self, name: &str, value: &str) {
            self.headers.insert(name.to_string(), value.to_string());
        }
        fn set_content_type(&mut self, _content_type: &str) {}
        fn set_body(&mut self, _body: String) {}
        fn set_no_content(&mut self) {}
    }

    fn req(headers: &[(&'static str, &'static str)]) -> FakeReq {
        FakeReq { headers: headers.to_vec(), ..FakeReq::default() }
    }

    #[test]
    fn missing_accept_is_406() {
        let v = CorsValidator::default();
        let r = v.validate(&req(&[]), false);
        assert!(!r.allowed);
        assert_eq!(r.status_code, 406);
        assert!(r.error_message.contains("Missing Accept"));
    }

    #[test]
    fn incompatible_accept_is_406() {
        let v = CorsValidator::default();
        let r = v.validate(&req(&[("Accept", "text/html")]), false);
        assert_eq!(r.status_code, 406);
    }

    #[test]
    fn wildcard_or_json_accept_passes() {
        let v = CorsValidator::default();
        assert!(v.validate(&req(&[("accept", "*/*")]), false).allowed);
        assert!(v.validate(&req(&[("Accept", "Application/JSON, text/event-stream")]), false).allowed);
    }

    #[test]
    fn preflight_skips_accept_check() {
        let v = CorsValidator::default();
        let r = v.validate(&req(&[]), true);
        assert!(r.allowed);
        assert!(r.is_preflight);
        assert!(!r.has_origin);
    }

    #[test]
    fn localhost_origin_allowed_when_enabled() {
        let v = CorsValidator::default();
        let r = v.validate(&req(&[("Accept", "application/json"), ("Origin", "http://localhost:3000")]), false);
        assert!(r.allowed);
        assert_eq!(r.status_code, 200);
        assert!(r.has_origin);
        assert_eq!(r.origin, "http://localhost:3000");

        for origin in ["http://127.0.0.1:8080", "http://[::1]:9000"] {
            let r = v.validate(&FakeReq { headers: vec![("Accept", "application/json"), ("Origin", origin)], ..FakeReq::default() }, false);
            assert!(r.allowed, "{origin}");
        }
    }

    #[test]
    fn localhost_origin_rejected_when_disabled() {
        let v = CorsValidator::new(CorsConfig::default().allow_localhost(false));
        let r = v.validate(&req(&[("Accept", "application/json"), ("Origin", "http://localhost:3000")]), false);
        assert!(!r.allowed);
        assert_eq!(r.status_code, 403);
    }

    #[test]
    fn foreign_origin_is_403() {
        let v = CorsValidator::default();
        let r = v.validate(&req(&[("Accept", "application/json"), ("Origin", "http://evil.example")]), false);
        assert!(!r.allowed);
        assert_eq!(r.status_code, 403);
        assert_eq!(r.error_message, "Origin not allowed: http://evil.example");
        assert!(r.has_origin);
    }

    #[test]
    fn allow_list_matches_ignoring_case() {
        let cfg = CorsConfig::default().allow_localhost(false).with_origin("https://App.Example.com");
        let v = CorsValidator::new(cfg);
        let r = v.validate(&req(&[("Accept", "application/json"), ("Origin", "https://app.example.com")]), false);
        assert!(r.allowed);
    }

    #[test]
    fn with_origin_keeps_a_set() {
        let cfg = CorsConfig::default().with_origin("https://a.example").with_origin("HTTPS://A.EXAMPLE");
        assert_eq!(cfg.allowed_origins, ["https://a.example"]);
    }

    #[test]
    fn no_origin_is_always_allowed_and_sets_no_headers() {
        let v = CorsValidator::new(CorsConfig::default().allow_localhost(false));
        let r = v.validate(&req(&[("Accept", "application/json")]), false);
        assert!(r.allowed);
        let mut resp = FakeResp::default();
        v.apply_headers(&r, &mut resp);
        assert!(resp.headers.is_empty());
    }

    #[test]
    fn unreadable_origin_is_403_and_never_echoed() {
        let v = CorsValidator::default();
        let r = v.validate(&FakeReq { headers: vec![("Accept", "application/json")], opaque: vec!["Origin"] }, false);
        assert!(!r.allowed);
        assert_eq!(r.status_code, 403);
        assert!(r.has_origin);
        assert!(r.origin.is_empty());
        let mut resp = FakeResp::default();
        v.apply_headers(&r, &mut resp);
        assert!(!resp.headers.contains_key("Access-Control-Allow-Origin"));
    }

    #[test]
    fn apply_headers_echoes_origin() {
        let v = CorsValidator::default();
        let r = v.validate(&req(&[("Accept", "application/json"), ("Origin", "http://localhost:3000")]), false);
        let mut resp = FakeResp::default();
        v.apply_headers(&r, &mut resp);
        assert_eq!(resp.headers["Access-Control-Allow-Origin"], "http://localhost:3000");
        assert_eq!(resp.headers["Access-Control-Allow-Methods"], "POST, OPTIONS");
        assert_eq!(resp.headers["Access-Control-Allow-Headers"], "Content-Type, Accept");
        assert_eq!(resp.headers["Vary"], "Origin");
    }
}
