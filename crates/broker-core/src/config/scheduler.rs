//! Scheduler limits.

use serde::{Deserialize, Serialize};

/// Admission limits enforced by the scheduler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Maximum live subscriptions a single gate may hold.
    #[serde(default = "default_max_subscriptions")]
    pub max_subscriptions_per_gate: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_subscriptions_per_gate: default_max_subscriptions(),
        }
    }
}

fn default_max_subscriptions() -> usize {
    100
}
