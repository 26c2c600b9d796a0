//! Newline-delimited JSON-RPC over stdin/stdout.
//!
//! Every input line is presented to the handler as a `POST /mcp` with a JSON
//! `Accept`, so the engine cannot tell it apart from an HTTP call. Empty
//! responses (notifications) write nothing. Logs must stay on stderr.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::task::JoinHandle;

use super::router::MCP_PATH;
use super::{RequestHandler, Transport, TransportError, TransportRequest, TransportResponse};
use crate::core::error::code;
use crate::infra::http::json::error_body;

type Reader = Box<dyn AsyncBufRead + Send + Unpin>;
type Writer = Box<dyn AsyncWrite + Send + Unpin>;

struct StdioRequest {
    body: String,
}

impl TransportRequest for StdioRequest {
    fn method(&self) -> &str {
        "POST"
    }

    fn path(&self) -> &str {
        MCP_PATH
    }

    fn header(&self, name: &str) -> Option<&str> {
        name.eq_ignore_ascii_case("accept").then_some("application/json")
    }

    fn body(&self) -> &str {
        &self.body
    }
}

#[derive(Default)]
struct StdioResponse {
    body: String,
}

impl TransportResponse for StdioResponse {
    fn set_status(&mut self, _code: u16, _reason: &str) {}
    fn set_header(&mut self, _name: &str, _value: &str) {}
    fn set_content_type(&mut self, _content_type: &str) {}

    fn set_body(&mut self, body: String) {
        self.body = body;
    }

    fn set_no_content(&mut self) {
        self.body.clear();
    }
}

pub struct StdioTransport {
    io: Mutex<Option<(Reader, Writer)>>,
    handler: Arc<RwLock<Option<RequestHandler>>>,
    task: Mutex<Option<JoinHandle<std::io::Result<()>>>>,
}

impl StdioTransport {
    /// Process stdin/stdout.
    pub fn new() -> Self {
        Self::with_io(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
    }

    pub fn with_io<R, W>(reader: R, writer: W) -> Self
    where
        R: AsyncBufRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        Self {
            io: Mutex::new(Some((Box::new(reader), Box::new(writer)))),
            handler: Arc::new(RwLock::new(None)),
            task: Mutex::new(None),
        }
    }

    /// Resolves when input reaches EOF (or the loop fails).
    pub async fn wait(&self) -> Result<(), TransportError> {
        let Some(task) = self.task().take() else {
            return Ok(());
        };
        match task.await {
            Ok(res) => res.map_err(TransportError::from),
            Err(e) if e.is_cancelled() => Ok(()),
            Err(e) => Err(TransportError::Worker(e.to_string())),
        }
    }

    fn task(&self) -> MutexGuard<'_, Option<JoinHandle<std::io::Result<()>>>> {
        self.task.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for StdioTransport {
    fn default() -> Self {
        Self::new()
    }
}

async fn serve_lines(
    reader: Reader,
    mut writer: Writer,
    handler: Arc<RwLock<Option<RequestHandler>>>,
) -> std::io::Result<()> {
    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let current = handler.read().unwrap_or_else(PoisonError::into_inner).clone();
        let out = match current {
            Some(h) => {
                let dispatched = tokio::task::spawn_blocking(move || {
                    let req = StdioRequest { body: line };
                    let mut resp = StdioResponse::default();
                    h(&req, &mut resp);
                    resp.body
                })
                .await;
                dispatched.unwrap_or_else(|e| {
                    tracing::error!(error = %e, "stdio handler task failed");
                    error_body(code::INTERNAL_ERROR, "Internal error")
                })
            }
            None => {
                tracing::error!("stdio line received before an MCP handler was installed");
                error_body(code::INTERNAL_ERROR, "MCP handler not initialized")
            }
        };
        if out.is_empty() {
            continue;
        }
        writer.write_all(out.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
    }
    tracing::info!("stdio input closed");
    Ok(())
}

#[async_trait]
impl Transport for StdioTransport {
    fn name(&self) -> &'static str {
        "stdio"
    }

    async fn start(&self) -> Result<(), TransportError> {
        let mut task = self.task();
        if task.is_some() {
            return Ok(());
        }
        let Some((reader, writer)) = self.io.lock().unwrap_or_else(PoisonError::into_inner).take() else {
            tracing::warn!("stdio streams already consumed; transport cannot restart");
            return Ok(());
        };
        *task = Some(tokio::spawn(serve_lines(reader, writer, Arc::clone(&self.handler))));
        tracing::info!("stdio transport started");
        Ok(())
    }

    async fn stop(&self) -> Result<(), TransportError> {
        if let Some(task) = self.task().take() {
            task.abort();
            tracing::info!("stdio transport stopped");
        }
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.task().as_ref().is_some_and(|t| !t.is_finished())
    }

    fn set_request_handler(&self, handler: RequestHandler) {
        *self.handler.write().unwrap_or_else(PoisonError::into_inner) = Some(handler);
    }
}
