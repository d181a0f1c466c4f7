//! Capability traits defined in `broker-core` and implemented by other crates.

pub mod authorization;
pub mod query_engine;

pub use authorization::Authorization;
pub use query_engine::QueryEngine;
