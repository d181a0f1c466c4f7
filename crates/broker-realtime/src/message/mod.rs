//! Real-time channel message envelopes.

pub mod types;
pub mod validator;

pub use types::{InboundMessage, OutboundMessage};
pub use validator::validate_inbound;
