//! Per-connection gates.
//!
//! A [`Gate`] is the broker-side session of one live connection. It owns the
//! connection's outbound queue, a request queue drained by its own worker,
//! and the reassembly buffer for fragmented frames.

pub mod fragments;
pub mod handle;
pub mod outbound;
pub mod state;
pub mod worker;

pub use fragments::FragmentBuffer;
pub use handle::Gate;
pub use outbound::GateOutbound;
pub use state::GateState;
