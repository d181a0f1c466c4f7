//! OAuth2-style client registration and token endpoints.

pub mod basic;
pub mod service;

pub use basic::parse_basic;
pub use service::AuthorizationService;
