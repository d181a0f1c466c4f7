//! Logging configuration.

use serde::{Deserialize, Serialize};

/// Tracing subscriber settings for the broker binary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive; `RUST_LOG` takes precedence when set.
    #[serde(default = "default_level")]
    pub level: String,
    /// `"json"` for one event per line, anything else for pretty output.
    #[serde(default = "default_format")]
    pub format: String,
    /// Include the emitting module in each event.
    #[serde(default = "default_true")]
    pub targets: bool,
    /// Include the worker thread id (json format only).
    #[serde(default)]
    pub thread_ids: bool,
}

impl LoggingConfig {
    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: default_format(),
            targets: true,
            thread_ids: false,
        }
    }
}

fn default_level() -> String {
    "info,broker_realtime=debug".to_string()
}

fn default_format() -> String {
    "pretty".to_string()
}

fn default_true() -> bool {
    true
}
