//! # broker-auth
//!
//! Identity registry and token lifecycle for the SPARQL broker.
//!
//! ## Modules
//!
//! - `identity`: in-memory registry of identities, credentials and tokens
//! - `jwt`: token signing and verification
//! - `secret`: Argon2id client secret hashing
//! - `oauth`: client registration, token issuance and bearer validation

pub mod identity;
pub mod jwt;
pub mod oauth;
pub mod secret;

pub use identity::InMemoryAuthorization;
pub use jwt::{JwtDecoder, JwtEncoder};
pub use oauth::AuthorizationService;
pub use secret::SecretHasher;
