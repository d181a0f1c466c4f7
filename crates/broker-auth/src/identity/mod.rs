//! Identity, credential and token registry.

pub mod record;
pub mod registry;

pub use record::AuthorizedIdentity;
pub use registry::InMemoryAuthorization;
