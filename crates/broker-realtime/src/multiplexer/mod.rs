//! Connection → gate table and inbound frame routing.

pub mod manager;
pub mod registry;

pub use manager::ConnectionMultiplexer;
pub use registry::GateRegistry;
