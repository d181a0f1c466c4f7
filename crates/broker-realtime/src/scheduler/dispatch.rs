//! Delivery of outbound messages to gates, keyed by gate ID.

use std::fmt::Debug;

use broker_core::types::GateId;

use crate::message::OutboundMessage;

/// Outcome of handing a message to a gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Queued for the connection writer.
    Delivered,
    /// The gate is unknown or no longer open.
    GateClosed,
    /// The gate is open but its outbound queue is full.
    Busy,
}

/// Routes outbound messages to live gates.
///
/// Implementations must never block: the scheduler dispatches while holding
/// the update lock.
pub trait GateDispatcher: Send + Sync + Debug + 'static {
    fn dispatch(&self, gid: GateId, msg: OutboundMessage) -> Delivery;

    fn is_open(&self, gid: GateId) -> bool;
}
