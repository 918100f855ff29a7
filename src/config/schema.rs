//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from TOML. Every field
//! has a default so a minimal file (or no file plus environment variables)
//! is enough to start.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Root configuration for the wallet service.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct NanoConfig {
    /// Ledger node and work service endpoints.
    pub node: NodeConfig,

    /// Signing key and send limits.
    pub wallet: WalletConfig,

    /// Tool server settings.
    pub server: ServerConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Node RPC configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct NodeConfig {
    /// Ledger node RPC URL (`NANO_RPC_URL`). Required.
    pub rpc_url: String,

    /// Work generation URL (`NANO_WORK_GENERATION_URL`); falls back to `rpc_url`.
    pub work_url: Option<String>,

    /// Deadline for ledger calls in seconds.
    pub rpc_timeout_secs: u64,

    /// Deadline for work generation in seconds.
    pub work_timeout_secs: u64,

    /// Minimum work difficulty, hex (`NANO_WORK_THRESHOLD`).
    pub work_threshold: String,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            rpc_url: String::new(),
            work_url: None,
            rpc_timeout_secs: 60,
            work_timeout_secs: 300,
            work_threshold: "fffffff800000000".to_string(),
        }
    }
}

impl NodeConfig {
    /// The work endpoint and the key it came from.
    pub fn work_endpoint(&self) -> (&'static str, &str) {
        match self.work_url.as_deref() {
            Some(url) if !url.is_empty() => ("NANO_WORK_GENERATION_URL", url),
            _ => ("NANO_RPC_URL", self.rpc_url.as_str()),
        }
    }
}

/// Wallet configuration.
#[derive(Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct WalletConfig {
    /// 64-character hex private key (`NANO_PRIVATE_KEY`). Without it only read tools work.
    pub private_key: Option<String>,

    /// Largest single send, in Nano (`NANO_MAX_SEND_AMOUNT`).
    pub max_send_amount: String,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            private_key: None,
            max_send_amount: "0.01".to_string(),
        }
    }
}

impl fmt::Debug for WalletConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletConfig")
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .field("max_send_amount", &self.max_send_amount)
            .finish()
    }
}

/// Tool server configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "127.0.0.1:8090").
    pub bind_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8090".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
