use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::infra::transport::cors::CorsConfig;

pub const DEFAULT_PORT: u16 = 8767;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("{0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub mode: String, // "server" or "stdio"
    pub host: String,
    pub port: u16,
    pub server_name: String,
    pub server_version: String,
    pub cors: CorsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mode: "server".into(),
            host: Ipv4Addr::LOCALHOST.to_string(),
            port: DEFAULT_PORT,
            server_name: env!("CARGO_PKG_NAME").into(),
            server_version: env!("CARGO_PKG_VERSION").into(),
            cors: CorsConfig::default(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    #[serde(default)]
    server: ServerSection,
    cors: Option<CorsConfig>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ServerSection {
    mode: Option<String>,
    host: Option<String>,
    port: Option<u16>,
    name: Option<String>,
    version: Option<String>,
}

impl Config {
    /// Defaults, then the TOML file named by `MCP_CONFIG` (if set), then env.
    pub fn load() -> Result<Self, ConfigError> {
        let base = match std::env::var("MCP_CONFIG") {
            Ok(path) if !path.trim().is_empty() => Self::from_file(path.trim())?,
            _ => Self::default(),
        };
        Ok(base.with_env_overrides())
    }

    /// Defaults plus environment overrides; no file.
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let file: FileConfig = toml::from_str(text)?;
        let mut cfg = Self::default();
        let s = file.server;
        if let Some(mode) = s.mode {
            cfg.mode = mode;
        }
        if let Some(host) = s.host {
            cfg.host = host;
        }
        if let Some(port) = s.port {
            cfg.port = port;
        }
        if let Some(name) = s.name {
            cfg.server_name = name;
        }
        if let Some(version) = s.version {
            cfg.server_version = version;
        }
        if let Some(cors) = file.cors {
            cfg.cors = cors;
        }
        Ok(cfg)
    }

    // Unparseable values keep whatever the lower layer had.
    fn with_env_overrides(mut self) -> Self {
        if let Ok(mode) = std::env::var("MODE") {
            self.mode = mode;
        }
        if let Ok(host) = std::env::var("HOST") {
            self.host = host;
        }
        if let Some(port) = std::env::var("PORT").ok().and_then(|s| s.trim().parse::<u16>().ok()) {
            self.port = port;
        }
        if let Some(allow) = std::env::var("CORS_ALLOW_LOCALHOST").ok().and_then(|v| parse_flag(&v)) {
            self.cors.allow_localhost = allow;
        }
        if let Ok(origins) = std::env::var("CORS_ALLOWED_ORIGINS") {
            self.cors.allowed_origins.clear();
            let cors = std::mem::take(&mut self.cors);
            self.cors = origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .fold(cors, |c, o| c.with_origin(o));
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !matches!(self.mode.as_str(), "server" | "stdio") {
            return Err(ConfigError::Invalid(format!(
                "Invalid MODE: {}. Must be 'server' or 'stdio'",
                self.mode
            )));
        }
        if self.mode == "server" {
            if self.port == 0 {
                return Err(ConfigError::Invalid("PORT cannot be 0".into()));
            }
            self.socket_addr()?;
        }
        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip = if self.host.eq_ignore_ascii_case("localhost") {
            IpAddr::V4(Ipv4Addr::LOCALHOST)
        } else {
            self.host
                .parse::<IpAddr>()
                .map_err(|_| ConfigError::Invalid(format!("Invalid HOST: {}", self.host)))?
        };
        Ok(SocketAddr::new(ip, self.port))
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
