use std::sync::Arc;

use crate::api::mcp::McpServer;
use crate::infra::config::Config;
use crate::infra::transport::http::HttpTransport;
use crate::infra::transport::stdio::StdioTransport;
use crate::infra::transport::Transport;

/// Engine with the bundled demo tools, named per config.
pub fn build_server(cfg: &Config) -> Arc<McpServer> {
    let mut server = McpServer::new(cfg.server_name.clone(), cfg.server_version.clone());
    server.on_tool_executed(|tool, success, message| {
        if !success {
            tracing::debug!(tool, message, "tool execution reported failure");
        }
    });
    crate::tools::demo::register_demo_tools(&server);
    Arc::new(server)
}

/// Runs until stdin closes (stdio) or ctrl-c (server).
pub async fn run_server(cfg: Config) -> anyhow::Result<()> {
    cfg.validate()?;
    tracing::info!(
        mode = %cfg.mode,
        host = %cfg.host,
        port = cfg.port,
        name = %cfg.server_name,
        "BOOT mcp-tool-gateway"
    );

    let server = build_server(&cfg);

    if cfg.mode == "stdio" {
        let transport = StdioTransport::new();
        transport.set_request_handler(server.request_handler());
        transport.start().await?;
        transport.wait().await?;
        return Ok(());
    }

    let transport = HttpTransport::new(cfg.socket_addr()?, cfg.cors.clone());
    transport.set_request_handler(server.request_handler());
    transport.start().await?;
    if let Some(addr) = transport.local_addr() {
        tracing::info!(%addr, tools = server.registry().len(), "serving MCP at /mcp");
    }

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutdown requested");
    transport.stop().await?;
    Ok(())
}
