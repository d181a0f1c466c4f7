//! Broker configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section. Every field carries a default, so an empty file is valid.

pub mod app;
pub mod auth;
pub mod engine;
pub mod gate;
pub mod logging;
pub mod scheduler;

use serde::{Deserialize, Serialize};

use self::app::ServerConfig;
use self::auth::AuthConfig;
use self::engine::EngineConfig;
use self::gate::GateConfig;
use self::logging::LoggingConfig;
use self::scheduler::SchedulerConfig;

use crate::error::AppError;

/// Root broker configuration.
///
/// Top-level deserialization target for the merged TOML configuration files
/// (default.toml + environment overlay + `BROKER__*` variables).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BrokerConfig {
    /// HTTP/WebSocket listener settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Per-connection gate settings.
    #[serde(default)]
    pub gate: GateConfig,
    /// Scheduler limits.
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    /// Query engine adapter selection.
    #[serde(default)]
    pub engine: EngineConfig,
    /// Identity registry and token policy.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl BrokerConfig {
    /// Load configuration from TOML files.
    ///
    /// Merges the default configuration with an environment-specific overlay
    /// and environment variables prefixed with `BROKER__`.
    pub fn load(env: &str) -> Result<Self, AppError> {
        Self::load_from("config", env)
    }

    /// Load configuration from an explicit directory.
    pub fn load_from(dir: &str, env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(&format!("{dir}/default")).required(false))
            .add_source(config::File::with_name(&format!("{dir}/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("BROKER")
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("auth.test_identities")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))
    }
}
