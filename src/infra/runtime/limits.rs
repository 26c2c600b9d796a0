use std::time::Duration;

/// Largest request body the HTTP binding buffers before answering 413.
pub const MAX_BODY_BYTES: usize = 1 << 20;

/// reqwest client used by the CLI to talk to a running gateway.
pub fn make_http_client() -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(2))
        .timeout(Duration::from_secs(6))
        .build()
}
