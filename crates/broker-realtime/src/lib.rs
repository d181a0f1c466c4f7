//! # broker-realtime
//!
//! Real-time side of the broker:
//!
//! - `gate`: one session per live connection, with its own request worker,
//!   outbound queue and fragment reassembly
//! - `multiplexer`: the connection → gate table and inbound frame routing
//! - `scheduler`: authorization, engine submission, subscription table
//!   and notification diffing
//! - `message`: JSON envelopes exchanged over the channel
//! - `metrics`: gate counters for the dependability endpoint

pub mod gate;
pub mod message;
pub mod metrics;
pub mod multiplexer;
pub mod scheduler;
pub mod server;

pub use gate::{Gate, GateState};
pub use message::{InboundMessage, OutboundMessage};
pub use metrics::GateMetrics;
pub use multiplexer::{ConnectionMultiplexer, GateRegistry};
pub use scheduler::{Delivery, GateDispatcher, Scheduler};
pub use server::RealtimeEngine;
