use std::error::Error as _;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Request, State},
    response::{IntoResponse, Response},
    Router,
};
use http_body_util::LengthLimitError;

use crate::core::error::code;
use crate::infra::http::json::write_error;
use crate::infra::logging::log_metric;
use crate::infra::runtime::limits::MAX_BODY_BYTES;
use crate::infra::transport::http::{HttpBinding, HttpRequest, HttpResponse};

/// Every path goes to the binding; it owns the 404/405 table.
pub fn build_app(binding: Arc<HttpBinding>) -> Router {
    Router::new().fallback(dispatch).with_state(binding)
}

async fn dispatch(State(binding): State<Arc<HttpBinding>>, req: Request) -> Response {
    let started = Instant::now();
    let (parts, body) = req.into_parts();
    let method = parts.method.clone();
    let path = parts.uri.path().to_string();

    let bytes = match axum::body::to_bytes(body, MAX_BODY_BYTES).await {
        Ok(b) => b,
        Err(e) => {
            let mut resp = HttpResponse::new();
            if exceeded_limit(&e) {
                tracing::warn!(%method, path = %path, limit = MAX_BODY_BYTES, "request body too large");
                write_error(&mut resp, 413, "Payload Too Large", code::INVALID_REQUEST, "Request body too large");
            } else {
                tracing::warn!(%method, path = %path, error = %e, "failed to read request body");
                write_error(&mut resp, 400, "Bad Request", code::INVALID_REQUEST, "Failed to read request body");
            }
            return resp.into_response();
        }
    };

    let request = HttpRequest::new(parts.method, path.clone(), parts.headers, bytes);
    let handled = tokio::task::spawn_blocking(move || {
        let mut resp = HttpResponse::new();
        binding.handle(&request, &mut resp);
        resp
    })
    .await;

    let resp = handled.unwrap_or_else(|e| {
        tracing::error!(%method, path = %path, error = %e, "request handler task failed");
        let mut resp = HttpResponse::new();
        write_error(&mut resp, 500, "Internal Server Error", code::INTERNAL_ERROR, "Internal error");
        resp
    });

    let status = resp.status().map(|s| s.as_u16()).unwrap_or(200);
    let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
    tracing::debug!(%method, path = %path, status, elapsed_ms, "http request handled");
    log_metric("http", "request_latency_ms", elapsed_ms);
    resp.into_response()
}

fn exceeded_limit(err: &axum::Error) -> bool {
    let mut source = err.source();
    while let Some(e) = source {
        if e.is::<LengthLimitError>() {
            return true;
        }
        source = e.source();
    }
    false
}
