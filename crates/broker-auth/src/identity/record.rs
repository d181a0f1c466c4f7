//! Mutable registry record wrapping a digital identity.

use broker_core::types::{DigitalIdentity, Token};

/// Registry entry for one uid.
///
/// `authorized = false` is a permanent revocation; the record stays in the
/// registry so that the uid cannot silently re-register.
#[derive(Debug, Clone)]
pub struct AuthorizedIdentity {
    /// The identity descriptor.
    pub identity: DigitalIdentity,
    /// Argon2 PHC string of the registered client secret.
    pub secret_hash: Option<String>,
    /// The most recently issued token.
    pub token: Option<Token>,
    /// Token validity window in seconds.
    pub expiry_period: i64,
    /// Whether the identity may use the broker.
    pub authorized: bool,
}

impl AuthorizedIdentity {
    pub fn new(identity: DigitalIdentity, expiry_period: i64) -> Self {
        Self {
            identity,
            secret_hash: None,
            token: None,
            expiry_period,
            authorized: true,
        }
    }

    pub fn is_registered(&self) -> bool {
        self.secret_hash.is_some()
    }
}
