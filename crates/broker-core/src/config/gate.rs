//! Per-connection gate configuration.

use serde::{Deserialize, Serialize};

/// Settings applied to every gate the multiplexer opens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateConfig {
    /// Resource path the subscribe channel is served on.
    #[serde(default = "default_path")]
    pub path: String,
    /// Capacity of the outbound (broker → client) queue.
    #[serde(default = "default_outbound_buffer")]
    pub outbound_buffer_size: usize,
    /// Capacity of the inbound request queue drained by the gate worker.
    #[serde(default = "default_inbound_buffer")]
    pub inbound_buffer_size: usize,
    /// Upper bound for a reassembled message in bytes.
    #[serde(default = "default_max_message_size")]
    pub max_message_size: usize,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
            outbound_buffer_size: default_outbound_buffer(),
            inbound_buffer_size: default_inbound_buffer(),
            max_message_size: default_max_message_size(),
        }
    }
}

fn default_path() -> String {
    "/subscribe".to_string()
}

fn default_outbound_buffer() -> usize {
    256
}

fn default_inbound_buffer() -> usize {
    64
}

fn default_max_message_size() -> usize {
    1024 * 1024
}
