//! # broker-client
//!
//! Client side of the broker:
//!
//! - [`SecurityManager`]: client registration, token requests and the
//!   refresh-and-retry-once policy
//! - [`SparqlClient`]: SPARQL 1.1 query/update over HTTP
//! - [`SubscriptionClient`]: the WebSocket subscribe channel, delivering
//!   results to a [`Consumer`]

pub mod consumer;
pub mod error;
pub mod security;
pub mod sparql;
pub mod subscription;

pub use consumer::{ChannelConsumer, Consumer};
pub use security::SecurityManager;
pub use sparql::SparqlClient;
pub use subscription::SubscriptionClient;
