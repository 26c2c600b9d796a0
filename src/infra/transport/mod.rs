//! Protocol-agnostic request/response roles and the transport lifecycle.
//!
//! The engine only ever sees a [`TransportRequest`] and writes into a
//! [`TransportResponse`]; concrete bindings (HTTP, stdio) adapt their own
//! wire types to these traits and invoke the registered [`RequestHandler`]
//! once per routed call.

use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

pub mod cors;
pub mod http;
pub mod router;
pub mod stdio;

pub trait TransportRequest {
    /// HTTP method token (`"GET"`, `"POST"`, `"OPTIONS"`, ...).
    fn method(&self) -> &str;
    fn path(&self) -> &str;
    /// Header lookup by case-insensitive name.
    fn header(&self, name: &str) -> Option<&str>;
    /// True when the header is present, even if its value is not valid text.
    fn has_header(&self, name: &str) -> bool {
        self.header(name).is_some()
    }
    /// JSON-RPC body. Materialized on first read and cached afterwards.
    fn body(&self) -> &str;
}

pub trait TransportResponse {
    fn set_status(&mut self, code: u16, reason: &str);
    fn set_header(&mut self, name: &str, value: &str);
    fn set_content_type(&mut self, content_type: &str);
    fn set_body(&mut self, body: String);
    /// 202 Accepted with an empty body; used for notifications.
    fn set_no_content(&mut self);
}

pub type RequestHandler = Arc<dyn Fn(&dyn TransportRequest, &mut dyn TransportResponse) + Send + Sync>;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
    #[error("transport i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("transport worker failed: {0}")]
    Worker(String),
}

#[async_trait]
pub trait Transport: Send + Sync {
    fn name(&self) -> &'static str;
    /// Idempotent: starting a running transport is a no-op.
    async fn start(&self) -> Result<(), TransportError>;
    /// Stopping a stopped transport is a no-op.
    async fn stop(&self) -> Result<(), TransportError>;
    fn is_running(&self) -> bool;
    fn set_request_handler(&self, handler: RequestHandler);
}
