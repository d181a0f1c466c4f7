//! The gate handle shared by the multiplexer, the scheduler and the
//! connection tasks.

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use broker_core::config::gate::GateConfig;
use broker_core::error::AppError;
use broker_core::types::GateId;

use crate::gate::fragments::FragmentBuffer;
use crate::gate::state::{AtomicGateState, GateState};
use crate::message::{InboundMessage, OutboundMessage};
use crate::scheduler::Delivery;

/// Receiving halves handed back when a gate is created.
#[derive(Debug)]
pub struct GateChannels {
    /// Drained by the connection writer.
    pub outbound: mpsc::Receiver<OutboundMessage>,
    /// Drained by the gate worker.
    pub requests: mpsc::Receiver<InboundMessage>,
}

/// A single live connection as seen by the broker.
#[derive(Debug)]
pub struct Gate {
    /// Unique gate ID
    pub id: GateId,
    /// Resource path the connection was opened on
    pub path: String,
    /// When the gate was opened
    pub opened_at: DateTime<Utc>,
    state: AtomicGateState,
    outbound: mpsc::Sender<OutboundMessage>,
    requests: mpsc::Sender<InboundMessage>,
    cancel: CancellationToken,
    fragments: Mutex<FragmentBuffer>,
}

impl Gate {
    /// Creates an open gate and the receiving ends of its queues.
    pub fn new(path: impl Into<String>, config: &GateConfig) -> (Self, GateChannels) {
        let (outbound_tx, outbound_rx) = mpsc::channel(config.outbound_buffer_size.max(1));
        let (request_tx, request_rx) = mpsc::channel(config.inbound_buffer_size.max(1));

        let gate = Self {
            id: GateId::new(),
            path: path.into(),
            opened_at: Utc::now(),
            state: AtomicGateState::new(),
            outbound: outbound_tx,
            requests: request_tx,
            cancel: CancellationToken::new(),
            fragments: Mutex::new(FragmentBuffer::new(config.max_message_size)),
        };

        (
            gate,
            GateChannels {
                outbound: outbound_rx,
                requests: request_rx,
            },
        )
    }

    pub fn state(&self) -> GateState {
        self.state.load()
    }

    pub fn is_open(&self) -> bool {
        self.state() == GateState::Open
    }

    /// Queues a message for the connection writer.
    pub fn send(&self, msg: OutboundMessage) -> Delivery {
        if !self.is_open() {
            return Delivery::GateClosed;
        }
        match self.outbound.try_send(msg) {
            Ok(()) => Delivery::Delivered,
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(gid = %self.id, "Gate outbound buffer full, dropping message");
                Delivery::Busy
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.state.advance(GateState::Closing);
                Delivery::GateClosed
            }
        }
    }

    /// Hands a parsed request to the gate worker without waiting.
    pub fn forward(&self, msg: InboundMessage) -> Result<(), AppError> {
        if !self.is_open() {
            return Err(AppError::transport("Gate is closed"));
        }
        self.requests.try_send(msg).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => {
                AppError::protocol("Too many pending requests on this connection")
            }
            mpsc::error::TrySendError::Closed(_) => AppError::transport("Gate is closed"),
        })
    }

    /// Feeds one frame into the reassembly buffer.
    pub fn push_fragment(&self, chunk: &str, fin: bool) -> Result<Option<String>, AppError> {
        let mut fragments = self
            .fragments
            .lock()
            .map_err(|_| AppError::internal("Fragment buffer poisoned"))?;
        fragments.push(chunk, fin)
    }

    /// Starts closing. Returns `false` if the gate was already closing.
    pub fn begin_close(&self) -> bool {
        let previous = self.state.advance(GateState::Closing);
        if previous == GateState::Open {
            self.cancel.cancel();
            if let Ok(mut fragments) = self.fragments.lock() {
                fragments.clear();
            }
            true
        } else {
            false
        }
    }

    pub fn finish_close(&self) {
        self.state.advance(GateState::Closed);
    }

    /// Token cancelled when the gate starts closing.
    pub fn cancellation(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(outbound: usize) -> GateConfig {
        GateConfig {
            outbound_buffer_size: outbound,
            inbound_buffer_size: 1,
            max_message_size: 16,
            ..GateConfig::default()
        }
    }

    #[tokio::test]
    async fn test_send_reports_busy_then_closed() {
        let (gate, mut channels) = Gate::new("/subscribe", &config(1));

        assert_eq!(gate.send(OutboundMessage::UpdateResponse {}), Delivery::Delivered);
        assert_eq!(gate.send(OutboundMessage::UpdateResponse {}), Delivery::Busy);
        assert!(channels.outbound.recv().await.is_some());

        assert!(gate.begin_close());
        assert!(!gate.begin_close());
        assert_eq!(gate.send(OutboundMessage::UpdateResponse {}), Delivery::GateClosed);
        assert!(gate.cancellation().is_cancelled());

        gate.finish_close();
        assert_eq!(gate.state(), GateState::Closed);
    }

    #[test]
    fn test_dropped_writer_closes_gate() {
        let (gate, channels) = Gate::new("/subscribe", &config(4));
        drop(channels.outbound);

        assert_eq!(gate.send(OutboundMessage::UpdateResponse {}), Delivery::GateClosed);
        assert!(!gate.is_open());
    }

    #[test]
    fn test_forward_respects_queue_bound() {
        let (gate, _channels) = Gate::new("/subscribe", &config(4));
        let msg = InboundMessage::Update {
            sparql: String::new(),
            authorization: None,
        };

        assert!(gate.forward(msg.clone()).is_ok());
        assert_eq!(gate.forward(msg).expect_err("full").status_code(), 400);
    }

    #[test]
    fn test_close_discards_partial_message() {
        let (gate, _channels) = Gate::new("/subscribe", &config(4));
        assert_eq!(gate.push_fragment("{\"ty", false).expect("push"), None);

        gate.begin_close();
        assert_eq!(
            gate.push_fragment("{}", true).expect("push"),
            Some("{}".to_string())
        );
    }
}
