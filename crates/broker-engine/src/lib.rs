//! # broker-engine
//!
//! Query engine adapters for the broker. The in-memory store understands a
//! small SPARQL subset and backs tests and single-process deployments; the
//! remote adapter forwards to any SPARQL 1.1 Protocol endpoint.

pub mod factory;
pub mod providers;
pub mod sparql;

pub use factory::build_engine;
pub use providers::{MemoryEngine, RemoteEngine};
