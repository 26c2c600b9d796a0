//! HTTP realization of the transport abstraction.
//!
//! [`HttpBinding`] holds the per-call state machine (path table, verb rules,
//! CORS, legacy rewriting) and is independent of the socket; [`HttpTransport`]
//! owns the axum listener that feeds it.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError, RwLock};

use async_trait::async_trait;
use axum::body::{Body, Bytes};
use axum::http::header::{HeaderName, HeaderValue, ALLOW, CONTENT_TYPE};
use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use super::cors::{CorsConfig, CorsResult, CorsValidator};
use super::router::{self, MCP_PATH};
use super::{RequestHandler, Transport, TransportError, TransportRequest, TransportResponse};
use crate::core::error::code;
use crate::infra::http::json::{write_error, JSON_CONTENT_TYPE};

/// Inbound request adapter. The raw body is decoded once, on first read,
/// unless a rewritten body override was supplied.
#[derive(Debug)]
pub struct HttpRequest {
    method: Method,
    path: String,
    headers: HeaderMap,
    raw_body: Bytes,
    body: OnceLock<String>,
    body_override: Option<String>,
}

impl HttpRequest {
    pub fn new(method: Method, path: impl Into<String>, headers: HeaderMap, body: impl Into<Bytes>) -> Self {
        Self {
            method,
            path: path.into(),
            headers,
            raw_body: body.into(),
            body: OnceLock::new(),
            body_override: None,
        }
    }

    /// Same request, but `body()` returns `body` without touching the raw bytes.
    pub fn with_body_override(&self, body: String) -> Self {
        Self {
            method: self.method.clone(),
            path: self.path.clone(),
            headers: self.headers.clone(),
            raw_body: self.raw_body.clone(),
            body: OnceLock::new(),
            body_override: Some(body),
        }
    }
}

impl TransportRequest for HttpRequest {
    fn method(&self) -> &str {
        self.method.as_str()
    }

    fn path(&self) -> &str {
        &self.path
    }

    fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    fn has_header(&self, name: &str) -> bool {
        self.headers.contains_key(name)
    }

    fn body(&self) -> &str {
        if let Some(body) = &self.body_override {
            return body;
        }
        self.body.get_or_init(|| String::from_utf8_lossy(&self.raw_body).into_owned())
    }
}

/// Outbound response builder, converted into an axum `Response` at the end.
#[derive(Debug, Default)]
pub struct HttpResponse {
    status: Option<StatusCode>,
    reason: Option<String>,
    headers: HeaderMap,
    content_type: Option<String>,
    body: String,
}

impl HttpResponse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn body(&self) -> &str {
        &self.body
    }
}

impl TransportResponse for HttpResponse {
    fn set_status(&mut self, code: u16, reason: &str) {
        let status = StatusCode::from_u16(code).unwrap_or_else(|_| {
            tracing::warn!(code, "invalid status code; using 500");
            StatusCode::INTERNAL_SERVER_ERROR
        });
        self.status = Some(status);
        self.reason = (!reason.is_empty()).then(|| reason.to_string());
    }

    fn set_header(&mut self, name: &str, value: &str) {
        match (HeaderName::from_bytes(name.as_bytes()), HeaderValue::from_str(value)) {
            (Ok(name), Ok(value)) => {
                self.headers.insert(name, value);
            }
            _ => tracing::warn!(header = name, "dropping header with invalid name or value"),
        }
    }

    fn set_content_type(&mut self, content_type: &str) {
        self.content_type = (!content_type.is_empty()).then(|| content_type.to_string());
    }

    fn set_body(&mut self, body: String) {
        self.body = body;
    }

    fn set_no_content(&mut self) {
        self.status = Some(StatusCode::ACCEPTED);
        self.reason = Some("Accepted".into());
        self.content_type = None;
        self.body.clear();
    }
}

impl IntoResponse for HttpResponse {
    fn into_response(self) -> Response {
        let status = self.status.unwrap_or(StatusCode::OK);
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = status;
        *response.headers_mut() = self.headers;
        if let Some(ct) = self.content_type.and_then(|ct| HeaderValue::from_str(&ct).ok()) {
            response.headers_mut().insert(CONTENT_TYPE, ct);
        }
        if let Some(reason) = self.reason.filter(|r| Some(r.as_str()) != status.canonical_reason()) {
            if let Ok(phrase) = hyper::ext::ReasonPhrase::try_from(reason) {
                response.extensions_mut().insert(phrase);
            }
        }
        response
    }
}

/// Path/verb/CORS state machine in front of the registered handler.
#[derive(Default)]
pub struct HttpBinding {
    cors: CorsValidator,
    handler: RwLock<Option<RequestHandler>>,
}

impl HttpBinding {
    pub fn new(cors: CorsConfig) -> Self {
        Self { cors: CorsValidator::new(cors), handler: RwLock::new(None) }
    }

    pub fn set_request_handler(&self, handler: RequestHandler) {
        *self.handler.write().unwrap_or_else(PoisonError::into_inner) = Some(handler);
    }

    fn request_handler(&self) -> Option<RequestHandler> {
        self.handler.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn handle(&self, req: &HttpRequest, resp: &mut dyn TransportResponse) {
        let path = req.path();
        if !router::is_mcp_path(path) {
            resp.set_status(404, "Not Found");
            resp.set_content_type(JSON_CONTENT_TYPE);
            resp.set_body(r#"{"error":"not found"}"#.to_string());
            return;
        }

        let method = req.method();
        if method == "GET" && path == MCP_PATH {
            resp.set_header(ALLOW.as_str(), "POST, OPTIONS");
            write_error(resp, 405, "Method Not Allowed", code::INVALID_REQUEST, "SSE transport not supported. Use POST.");
            return;
        }

        if method == "OPTIONS" {
            let cors = self.cors.validate(req, true);
            if !cors.allowed {
                self.reject(&cors, resp);
                return;
            }
            self.cors.apply_headers(&cors, resp);
            resp.set_status(204, "No Content");
            resp.set_content_type("");
            resp.set_body(String::new());
            return;
        }

        if method != "POST" {
            resp.set_header(ALLOW.as_str(), "POST, OPTIONS");
            write_error(resp, 405, "Method Not Allowed", code::INVALID_REQUEST, "Method not allowed. Use POST.");
            return;
        }

        let cors = self.cors.validate(req, false);
        if !cors.allowed {
            self.reject(&cors, resp);
            return;
        }
        self.cors.apply_headers(&cors, resp);

        let routed = req.with_body_override(router::apply_legacy_routing(path, req.body()));

        let Some(handler) = self.request_handler() else {
            tracing::error!(path, "request arrived before an MCP handler was installed");
            write_error(resp, 500, "Internal Server Error", code::INTERNAL_ERROR, "MCP handler not initialized");
            return;
        };
        handler(&routed, resp);
    }

    fn reject(&self, cors: &CorsResult, resp: &mut dyn TransportResponse) {
        tracing::debug!(
            status = cors.status_code,
            origin = %cors.origin,
            preflight = cors.is_preflight,
            reason = %cors.error_message,
            "request rejected by CORS policy"
        );
        self.cors.apply_headers(cors, resp);
        write_error(resp, cors.status_code, "", code::INVALID_REQUEST, &cors.error_message);
    }
}

struct Running {
    local_addr: SocketAddr,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

/// axum-backed listener driving an [`HttpBinding`].
pub struct HttpTransport {
    addr: SocketAddr,
    binding: Arc<HttpBinding>,
    running: Mutex<Option<Running>>,
}

impl HttpTransport {
    pub fn new(addr: SocketAddr, cors: CorsConfig) -> Self {
        Self { addr, binding: Arc::new(HttpBinding::new(cors)), running: Mutex::new(None) }
    }

    pub fn binding(&self) -> Arc<HttpBinding> {
        Arc::clone(&self.binding)
    }

    /// Bound address while running; resolves port 0 to the real port.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.state().as_ref().map(|r| r.local_addr)
    }

    fn state(&self) -> MutexGuard<'_, Option<Running>> {
        self.running.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn start(&self) -> Result<(), TransportError> {
        if self.is_running() {
            return Ok(());
        }
        let listener = tokio::net::TcpListener::bind(self.addr)
            .await
            .map_err(|source| TransportError::Bind { addr: self.addr, source })?;
        let local_addr = listener.local_addr()?;
        let app = crate::infra::http_app::build_app(self.binding());
        let (shutdown, signal) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            let served = axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = signal.await;
                })
                .await;
            if let Err(e) = served {
                tracing::error!(error = %e, "http transport terminated");
            }
        });

        let mut state = self.state();
        if state.as_ref().is_some_and(|r| !r.task.is_finished()) {
            // Lost a start race; keep the first listener.
            let _ = shutdown.send(());
            return Ok(());
        }
        *state = Some(Running { local_addr, shutdown, task });
        tracing::info!(%local_addr, "http transport listening");
        Ok(())
    }

    async fn stop(&self) -> Result<(), TransportError> {
        let Some(running) = self.state().take() else {
            return Ok(());
        };
        let _ = running.shutdown.send(());
        running.task.await.map_err(|e| TransportError::Worker(e.to_string()))?;
        tracing::info!(local_addr = %running.local_addr, "http transport stopped");
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.state().as_ref().is_some_and(|r| !r.task.is_finished())
    }

    fn set_request_handler(&self, handler: RequestHandler) {
        self.binding.set_request_handler(handler);
    }
}
