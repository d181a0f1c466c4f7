//! Connection multiplexer: opens and closes gates and routes inbound
//! frames to them.

use std::sync::Arc;

use tracing::{debug, info, warn};

use broker_core::config::gate::GateConfig;
use broker_core::error::AppError;
use broker_core::types::GateId;

use super::registry::GateRegistry;
use crate::gate::{Gate, GateOutbound, worker};
use crate::message::{InboundMessage, OutboundMessage, validate_inbound};
use crate::metrics::GateMetrics;
use crate::scheduler::{Delivery, Scheduler};

/// Owns the set of live connections.
#[derive(Debug)]
pub struct ConnectionMultiplexer {
    gates: Arc<GateRegistry>,
    scheduler: Arc<Scheduler>,
    metrics: Arc<GateMetrics>,
    config: GateConfig,
}

impl ConnectionMultiplexer {
    pub fn new(
        gates: Arc<GateRegistry>,
        scheduler: Arc<Scheduler>,
        metrics: Arc<GateMetrics>,
        config: GateConfig,
    ) -> Self {
        Self {
            gates,
            scheduler,
            metrics,
            config,
        }
    }

    pub fn gates(&self) -> &Arc<GateRegistry> {
        &self.gates
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    /// Opens a gate for a new connection on `path` and starts its worker.
    ///
    /// The returned [`GateOutbound`] must be drained by the connection
    /// writer.
    pub fn open(&self, path: &str) -> (Arc<Gate>, GateOutbound) {
        let (gate, channels) = Gate::new(path, &self.config);
        let gate = Arc::new(gate);

        self.gates.insert(gate.clone());
        self.metrics.record_open();
        tokio::spawn(worker::run(
            gate.clone(),
            channels.requests,
            self.scheduler.clone(),
        ));

        info!(gid = %gate.id, path = %path, "Gate opened");
        let outbound = GateOutbound::new(gate.clone(), channels.outbound);
        (gate, outbound)
    }

    /// Feeds one (possibly partial) text frame received on `gid`.
    ///
    /// The axum transport reassembles continuation frames itself and always
    /// passes whole messages with `fin = true`; partial chunks only reach the
    /// gate buffer from transports that surface raw frames.
    pub fn on_frame(&self, gid: GateId, chunk: &str, fin: bool) {
        let routed = self.gates.with_gate(gid, |gate| {
            if !fin {
                GateMetrics::inc(&self.metrics.fragmented);
            }
            let outcome = match gate.push_fragment(chunk, fin) {
                Ok(Some(message)) => self.on_message(gate, &message),
                Ok(None) => Ok(()),
                Err(err) => Err(err),
            };
            if let Err(err) = outcome {
                self.reject(gate, &err);
            }
        });

        if routed.is_none() {
            debug!(gid = %gid, "Frame for unknown gate dropped");
        }
    }

    /// Feeds a binary frame; its payload must be UTF-8 JSON.
    pub fn on_binary_frame(&self, gid: GateId, bytes: &[u8], fin: bool) {
        match std::str::from_utf8(bytes) {
            Ok(text) => self.on_frame(gid, text, fin),
            Err(e) => {
                let routed = self.gates.with_gate(gid, |gate| {
                    GateMetrics::inc(&self.metrics.messages);
                    let err = AppError::protocol(format!(
                        "Parsing failed: binary frame is not UTF-8 ({e})"
                    ));
                    self.reject(gate, &err);
                });
                if routed.is_none() {
                    debug!(gid = %gid, "Frame for unknown gate dropped");
                }
            }
        }
    }

    /// Parses a complete message and forwards it to the gate worker.
    fn on_message(&self, gate: &Gate, raw: &str) -> Result<(), AppError> {
        GateMetrics::inc(&self.metrics.messages);

        if gate.path != self.config.path {
            return Err(AppError::not_found(format!(
                "Bad resource descriptor: {} Use: {}",
                gate.path, self.config.path
            )));
        }

        validate_inbound(raw, self.config.max_message_size)?;
        let msg: InboundMessage = serde_json::from_str(raw)
            .map_err(|e| AppError::protocol(format!("Parsing failed: {e}")))?;

        debug!(gid = %gate.id, request = msg.kind(), "Request forwarded");
        gate.forward(msg)
    }

    fn reject(&self, gate: &Gate, err: &AppError) {
        GateMetrics::inc(&self.metrics.errors);
        warn!(gid = %gate.id, error = %err, "Message rejected");
        if gate.send(OutboundMessage::from(err)) == Delivery::Delivered {
            GateMetrics::inc(&self.metrics.error_responses);
        }
    }

    /// Closes a gate and drops its subscriptions. Returns `false` for an
    /// unknown or already closed gate.
    pub fn close(&self, gid: GateId) -> bool {
        match self.gates.remove(gid) {
            Some(gate) => {
                self.finish_close(&gate);
                true
            }
            None => false,
        }
    }

    /// Closes every gate.
    pub fn shutdown(&self) {
        let gates = self.gates.drain();
        let count = gates.len();
        for gate in gates {
            self.finish_close(&gate);
        }
        info!(count, "All gates closed");
    }

    fn finish_close(&self, gate: &Gate) {
        let removed = self.scheduler.unregister_gate(gate.id);
        gate.finish_close();
        self.metrics.record_close();
        info!(gid = %gate.id, subscriptions = removed, "Gate closed");
    }
}
