//! Top-level real-time engine that ties the gate table, scheduler and
//! multiplexer together.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tracing::info;

use broker_auth::AuthorizationService;
use broker_core::config::BrokerConfig;
use broker_core::traits::QueryEngine;

use crate::metrics::GateMetrics;
use crate::multiplexer::{ConnectionMultiplexer, GateRegistry};
use crate::scheduler::Scheduler;

/// Central real-time engine shared by the HTTP and WebSocket handlers.
#[derive(Clone)]
pub struct RealtimeEngine {
    /// Live gate table.
    pub gates: Arc<GateRegistry>,
    /// Scheduler.
    pub scheduler: Arc<Scheduler>,
    /// Connection multiplexer.
    pub multiplexer: Arc<ConnectionMultiplexer>,
    /// Registration, tokens and bearer validation.
    pub auth: Arc<AuthorizationService>,
    /// Gate counters.
    pub metrics: Arc<GateMetrics>,
    shutdown_tx: broadcast::Sender<()>,
}

impl std::fmt::Debug for RealtimeEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeEngine")
            .field("gates", &self.gates.len())
            .field("subscriptions", &self.scheduler.subscriptions().len())
            .finish()
    }
}

impl RealtimeEngine {
    pub fn new(
        config: &BrokerConfig,
        engine: Arc<dyn QueryEngine>,
        auth: Arc<AuthorizationService>,
    ) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        let metrics = Arc::new(GateMetrics::new());
        let gates = Arc::new(GateRegistry::new());

        let mut scheduler = Scheduler::new(
            engine,
            auth.clone(),
            gates.clone(),
            metrics.clone(),
            &config.scheduler,
        );
        if config.engine.timeout_ms > 0 {
            scheduler =
                scheduler.with_engine_timeout(Duration::from_millis(config.engine.timeout_ms));
        }
        let scheduler = Arc::new(scheduler);

        let multiplexer = Arc::new(ConnectionMultiplexer::new(
            gates.clone(),
            scheduler.clone(),
            metrics.clone(),
            config.gate.clone(),
        ));

        info!(path = %config.gate.path, "Real-time engine initialized");

        Self {
            gates,
            scheduler,
            multiplexer,
            auth,
            metrics,
            shutdown_tx,
        }
    }

    /// Returns a shutdown receiver for graceful shutdown coordination.
    pub fn shutdown_receiver(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    /// Closes every gate, drops every subscription and clears issued
    /// tokens.
    pub fn shutdown(&self) {
        info!("Shutting down real-time engine");

        let _ = self.shutdown_tx.send(());
        self.multiplexer.shutdown();
        self.scheduler.shutdown();
        self.auth.registry().shutdown();

        info!("Real-time engine shut down");
    }
}
