use reqwest::RequestBuilder;

/// Generate a simple request id suitable for log correlation across client and server.
pub fn generate_request_id() -> String {
    format!("mcpgw-{}", chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default())
}

/// Headers every CLI call to a gateway carries. The gateway rejects POSTs
/// without a JSON-compatible `Accept`, so that one is not optional.
pub fn add_standard_headers(builder: RequestBuilder, request_id: Option<String>) -> (RequestBuilder, String) {
    let rid = request_id.unwrap_or_else(generate_request_id);
    let b = builder
        .header("x-request-id", rid.as_str())
        .header(reqwest::header::ACCEPT, "application/json")
        .header(
            reqwest::header::USER_AGENT,
            format!("mcp-tool-gateway/{}", env!("CARGO_PKG_VERSION")),
        );
    (b, rid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_ids_are_prefixed() {
        assert!(generate_request_id().starts_with("mcpgw-"));
    }

    #[test]
    fn standard_headers_include_accept_and_request_id() {
        let client = reqwest::Client::new();
        let (builder, rid) = add_standard_headers(client.post("http://localhost/mcp"), Some("rid-1".into()));
        let req = builder.build().unwrap();
        assert_eq!(rid, "rid-1");
        assert_eq!(req.headers()["x-request-id"], "rid-1");
        assert_eq!(req.headers()[reqwest::header::ACCEPT], "application/json");
    }
}
