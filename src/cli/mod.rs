use clap::{Parser, Subcommand};
use serde_json::{json, Value as J};
use std::process::ExitCode;

use crate::infra::config::Config;
use crate::infra::http::headers::add_standard_headers;
use crate::infra::runtime::limits::make_http_client;

const DEFAULT_URL: &str = "http://127.0.0.1:8767";

#[derive(Parser)]
#[command(name = "mcp-tool-gateway")]
#[command(about = "MCP tool gateway - JSON-RPC server and admin CLI")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the gateway (default when no subcommand is given)
    Serve,
    /// Send a JSON-RPC ping to a running gateway
    Ping {
        /// Gateway base URL
        #[arg(short, long, default_value = DEFAULT_URL)]
        url: String,
    },
    /// List the tools a running gateway exposes
    Tools {
        /// Gateway base URL
        #[arg(short, long, default_value = DEFAULT_URL)]
        url: String,
    },
    /// Validate configuration
    Config {
        /// Validate config without starting service
        #[arg(long)]
        validate: bool,
    },
}

pub async fn run() -> ExitCode {
    let cli = Cli::parse();
    run_commands(cli.command.unwrap_or(Commands::Serve)).await
}

pub async fn run_commands(command: Commands) -> ExitCode {
    match command {
        Commands::Serve => {
            let result = match Config::load() {
                Ok(cfg) => crate::infra::boot::run_server(cfg).await,
                Err(e) => Err(e.into()),
            };
            match result {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => {
                    tracing::error!(error = %e, "gateway exited with error");
                    eprintln!("❌ {e:#}");
                    ExitCode::FAILURE
                }
            }
        }
        Commands::Ping { url } => match ping(&url).await {
            Ok(_) => {
                println!("✅ Gateway answered ping");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("❌ Ping failed: {e:#}");
                ExitCode::FAILURE
            }
        },
        Commands::Tools { url } => match list_tools(&url).await {
            Ok(tools) => {
                println!("🔧 {} tool(s):", tools.len());
                for (name, description) in tools {
                    println!("  - {name}: {description}");
                }
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("❌ Listing tools failed: {e:#}");
                ExitCode::FAILURE
            }
        },
        Commands::Config { validate } => match validate_config(validate) {
            Ok(cfg) => {
                println!("✅ Configuration is valid");
                println!("  Mode: {}", cfg.mode);
                println!("  Listen: {}:{}", cfg.host, cfg.port);
                println!("  Localhost origins: {}", cfg.cors.allow_localhost);
                println!("  Allowed origins: {}", cfg.cors.allowed_origins.join(", "));
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("❌ Configuration validation failed: {e:#}");
                ExitCode::FAILURE
            }
        },
    }
}

async fn rpc(url: &str, method: &str, params: J) -> anyhow::Result<J> {
    let client = make_http_client()?;
    let (builder, rid) = add_standard_headers(client.post(format!("{}/mcp", url.trim_end_matches('/'))), None);
    let response = builder
        .json(&json!({ "jsonrpc": "2.0", "id": 1, "method": method, "params": params }))
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        anyhow::bail!("HTTP {status} (request {rid})");
    }
    let body: J = response.json().await?;
    if let Some(err) = body.get("error") {
        anyhow::bail!("JSON-RPC error {}: {}", err["code"], err["message"].as_str().unwrap_or_default());
    }
    body.get("result").cloned().ok_or_else(|| anyhow::anyhow!("response has no result"))
}

async fn ping(url: &str) -> anyhow::Result<()> {
    let result = rpc(url, "ping", json!({})).await?;
    if result["status"] != "ok" {
        anyhow::bail!("unexpected ping result: {result}");
    }
    Ok(())
}

async fn list_tools(url: &str) -> anyhow::Result<Vec<(String, String)>> {
    let result = rpc(url, "tools/list", json!({})).await?;
    let tools = result["tools"].as_array().ok_or_else(|| anyhow::anyhow!("missing 'tools' array"))?;
    Ok(tools
        .iter()
        .map(|t| {
            (
                t["name"].as_str().unwrap_or_default().to_string(),
                t["description"].as_str().unwrap_or_default().to_string(),
            )
        })
        .collect())
}

fn validate_config(_validate: bool) -> anyhow::Result<Config> {
    let cfg = Config::load()?;
    cfg.validate()?;
    Ok(cfg)
}
