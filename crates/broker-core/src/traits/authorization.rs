//! Identity and token registry capability.

use crate::result::AppResult;
use crate::types::identity::{Credentials, DigitalIdentity};
use crate::types::token::Token;

/// Registry of digital identities, their client credentials and the
/// tokens issued to them.
///
/// Predicates answer `false`/`None`/`-1` for unknown uids; only a token
/// whose claims cannot be read is reported as an error. All operations are
/// linearizable per uid.
pub trait Authorization: Send + Sync + std::fmt::Debug + 'static {
    /// Insert an identity, or replace the descriptor of an existing one.
    fn add_identity(&self, identity: DigitalIdentity);

    /// Whether the uid is known and not revoked.
    fn is_authorized(&self, uid: &str) -> bool;

    /// Permanently revoke an identity (the record is kept).
    fn remove_authorized_identity(&self, uid: &str);

    /// (Re)create the record for `identity` with the given client secret.
    /// Returns `false` without touching the record when it was revoked.
    fn store_credentials(&self, identity: DigitalIdentity, secret: &str) -> bool;

    fn check_credentials(&self, uid: &str, secret: &str) -> bool;

    fn contains_credentials(&self, uid: &str) -> bool;

    fn remove_credentials(&self, identity: &DigitalIdentity);

    /// Store a token and take its expiry period from `exp - iat`.
    fn add_token(&self, uid: &str, token: Token) -> AppResult<()>;

    /// Return the current token if it is still valid at `now`, otherwise
    /// call `issue` with the identity's expiry period and store the result.
    /// Runs under the identity's entry lock.
    fn current_or_issue_token(
        &self,
        uid: &str,
        now: i64,
        issue: &mut dyn FnMut(i64) -> AppResult<Token>,
    ) -> AppResult<Token>;

    /// Expiration instant (`exp`, Unix seconds) of the stored token.
    fn token_expiring_date(&self, uid: &str) -> Option<i64>;

    /// Expiry period in seconds, or `-1` for an unknown uid.
    fn token_expiring_period(&self, uid: &str) -> i64;

    fn set_token_expiring_period(&self, uid: &str, period: i64);

    fn remove_token(&self, uid: &str);

    fn contains_token(&self, uid: &str) -> bool;

    fn token(&self, uid: &str) -> Option<Token>;

    fn identity(&self, uid: &str) -> Option<DigitalIdentity>;

    fn endpoint_credentials(&self, uid: &str) -> Option<Credentials>;

    fn device_expiring_period(&self) -> i64;
    fn set_device_expiring_period(&self, period: i64);
    fn application_expiring_period(&self) -> i64;
    fn set_application_expiring_period(&self, period: i64);
    fn user_expiring_period(&self) -> i64;
    fn set_user_expiring_period(&self, period: i64);
    fn default_expiring_period(&self) -> i64;
    fn set_default_expiring_period(&self, period: i64);
    fn test_expiring_period(&self) -> i64;
    fn set_test_expiring_period(&self, period: i64);

    fn issuer(&self) -> String;

    fn set_issuer(&self, issuer: &str);

    /// Whether the uid is on the test allow-list (never revoked).
    fn is_for_testing(&self, uid: &str) -> bool;

    /// Drop every issued token.
    fn shutdown(&self) {}
}
