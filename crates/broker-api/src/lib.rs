//! # broker-api
//!
//! HTTP layer of the broker built on Axum.
//!
//! Serves client registration and token issuance, the SPARQL 1.1 query and
//! update endpoints, the dependability endpoints and the WebSocket
//! subscribe channel.

pub mod app;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use app::{ServerHandle, build_app, build_state, start};
pub use state::AppState;
