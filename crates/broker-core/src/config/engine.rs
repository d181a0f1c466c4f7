//! Query engine adapter configuration.

use serde::{Deserialize, Serialize};

/// Selects and configures the SPARQL engine the scheduler talks to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Adapter: `"memory"` or `"remote"`.
    #[serde(default = "default_provider")]
    pub provider: String,
    /// SPARQL 1.1 query endpoint (remote adapter only).
    #[serde(default)]
    pub query_url: String,
    /// SPARQL 1.1 update endpoint (remote adapter only).
    #[serde(default)]
    pub update_url: String,
    /// Optional basic-auth user for the remote endpoint.
    #[serde(default)]
    pub username: Option<String>,
    /// Optional basic-auth password for the remote endpoint.
    #[serde(default)]
    pub password: Option<String>,
    /// Per-request engine timeout in milliseconds (0 disables it).
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            query_url: String::new(),
            update_url: String::new(),
            username: None,
            password: None,
            timeout_ms: default_timeout_ms(),
        }
    }
}

fn default_provider() -> String {
    "memory".to_string()
}

fn default_timeout_ms() -> u64 {
    30_000
}
