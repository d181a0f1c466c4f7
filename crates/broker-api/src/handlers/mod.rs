//! Request handlers.

pub mod health;
pub mod oauth;
pub mod sparql;
pub mod ws;
