//! Server configuration.

use serde::{Deserialize, Serialize};

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address.
    #[serde(default = "default_host")]
    pub host: String,
    /// Bind port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Path the WebSocket endpoint is mounted on.
    #[serde(default = "default_ws_path")]
    pub ws_path: String,
    /// Graceful shutdown timeout in seconds.
    #[serde(default = "default_shutdown_grace")]
    pub shutdown_grace_seconds: u64,
    /// Origins allowed by CORS; `"*"` allows any.
    #[serde(default = "default_cors_origins")]
    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            ws_path: default_ws_path(),
            shutdown_grace_seconds: default_shutdown_grace(),
            cors_allowed_origins: default_cors_origins(),
        }
    }
}

impl ServerConfig {
    /// `host:port` pair suitable for binding a listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_ws_path() -> String {
    "/ws".to_string()
}

fn default_shutdown_grace() -> u64 {
    10
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}
