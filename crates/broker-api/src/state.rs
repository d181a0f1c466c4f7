//! Application state shared across all handlers and middleware.

use std::sync::Arc;

use broker_core::config::BrokerConfig;
use broker_realtime::RealtimeEngine;

/// Shared state injected into every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Loaded configuration.
    pub config: Arc<BrokerConfig>,
    /// Gates, scheduler and authorization.
    pub realtime: Arc<RealtimeEngine>,
}
