//! Receiving side of a gate's outbound queue.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::gate::handle::Gate;
use crate::message::OutboundMessage;

/// Drained by the task that writes to the connection.
#[derive(Debug)]
pub struct GateOutbound {
    gate: Arc<Gate>,
    receiver: mpsc::Receiver<OutboundMessage>,
}

impl GateOutbound {
    pub fn new(gate: Arc<Gate>, receiver: mpsc::Receiver<OutboundMessage>) -> Self {
        Self { gate, receiver }
    }

    /// Next message to write, or `None` once the gate stops being open.
    ///
    /// Messages still queued when the gate closes are dropped.
    pub async fn recv(&mut self) -> Option<OutboundMessage> {
        let cancel = self.gate.cancellation();
        let msg = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            msg = self.receiver.recv() => msg,
        }?;

        self.gate.is_open().then_some(msg)
    }

    pub fn gate(&self) -> &Arc<Gate> {
        &self.gate
    }
}
