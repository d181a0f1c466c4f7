//! In-memory implementation of the [`Authorization`] capability.

use std::collections::HashSet;
use std::sync::RwLock;
use std::sync::atomic::{AtomicI64, Ordering};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::{debug, info, warn};

use broker_core::config::auth::AuthConfig;
use broker_core::error::AppError;
use broker_core::result::AppResult;
use broker_core::traits::Authorization;
use broker_core::types::{Credentials, DigitalIdentity, IdentityClass, Token};

use super::record::AuthorizedIdentity;
use crate::secret::SecretHasher;

/// Global expiry policy, read when a record is created.
#[derive(Debug)]
struct ExpiryPolicy {
    device: AtomicI64,
    application: AtomicI64,
    user: AtomicI64,
    default: AtomicI64,
    test: AtomicI64,
}

/// Volatile identity registry keyed by uid.
///
/// Each uid maps to exactly one [`AuthorizedIdentity`]. Mutations on one
/// uid are serialized by the map's shard lock; the policy knobs are plain
/// atomics.
#[derive(Debug)]
pub struct InMemoryAuthorization {
    identities: DashMap<String, AuthorizedIdentity>,
    hasher: SecretHasher,
    policy: ExpiryPolicy,
    issuer: RwLock<String>,
    /// Uids that are never revoked and always get the test expiry.
    test_identities: HashSet<String>,
}

impl InMemoryAuthorization {
    /// Creates the registry and loads the identities listed in configuration.
    pub fn new(config: &AuthConfig) -> AppResult<Self> {
        let registry = Self {
            identities: DashMap::new(),
            hasher: SecretHasher::new(config)?,
            policy: ExpiryPolicy {
                device: AtomicI64::new(config.expiry.device_seconds),
                application: AtomicI64::new(config.expiry.application_seconds),
                user: AtomicI64::new(config.expiry.user_seconds),
                default: AtomicI64::new(config.expiry.default_seconds),
                test: AtomicI64::new(config.expiry.test_seconds),
            },
            issuer: RwLock::new(config.issuer.clone()),
            test_identities: config.test_identities.iter().cloned().collect(),
        };

        for uid in &config.test_identities {
            registry.add_identity(DigitalIdentity::application(uid.clone()));
        }
        for seed in &config.identities {
            registry.add_identity(DigitalIdentity::new(seed.uid.clone(), seed.class));
        }

        info!(
            identities = registry.identities.len(),
            "Identity registry initialized"
        );

        Ok(registry)
    }

    /// The hasher used for client secrets.
    pub fn hasher(&self) -> &SecretHasher {
        &self.hasher
    }

    /// Number of known identities (revoked ones included).
    pub fn len(&self) -> usize {
        self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }

    fn initial_period(&self, identity: &DigitalIdentity) -> i64 {
        if self.test_identities.contains(&identity.uid) {
            return self.policy.test.load(Ordering::Acquire);
        }
        match identity.class {
            IdentityClass::Device => self.policy.device.load(Ordering::Acquire),
            IdentityClass::Application => self.policy.application.load(Ordering::Acquire),
            IdentityClass::User => self.policy.user.load(Ordering::Acquire),
            IdentityClass::Test => self.policy.default.load(Ordering::Acquire),
        }
    }
}

impl Authorization for InMemoryAuthorization {
    fn add_identity(&self, identity: DigitalIdentity) {
        debug!(uid = %identity.uid, class = %identity.class, "add_identity");

        let period = self.initial_period(&identity);
        match self.identities.entry(identity.uid.clone()) {
            Entry::Occupied(mut entry) => entry.get_mut().identity = identity,
            Entry::Vacant(entry) => {
                entry.insert(AuthorizedIdentity::new(identity, period));
            }
        }
    }

    fn is_authorized(&self, uid: &str) -> bool {
        self.identities
            .get(uid)
            .map(|rec| rec.authorized)
            .unwrap_or(false)
    }

    fn remove_authorized_identity(&self, uid: &str) {
        if self.is_for_testing(uid) {
            debug!(uid = %uid, "Test identity is exempt from revocation");
            return;
        }
        if let Some(mut rec) = self.identities.get_mut(uid) {
            rec.authorized = false;
            info!(uid = %uid, "Identity revoked");
        }
    }

    fn store_credentials(&self, identity: DigitalIdentity, secret: &str) -> bool {
        debug!(uid = %identity.uid, "store_credentials");

        let hash = match self.hasher.hash_secret(secret) {
            Ok(hash) => hash,
            Err(e) => {
                warn!(uid = %identity.uid, error = %e, "Failed to hash client secret");
                return false;
            }
        };

        let period = self.initial_period(&identity);
        match self.identities.entry(identity.uid.clone()) {
            Entry::Occupied(entry) if !entry.get().authorized => {
                warn!(uid = %identity.uid, "Refusing credentials for a revoked identity");
                false
            }
            entry => {
                let mut record = AuthorizedIdentity::new(identity, period);
                record.secret_hash = Some(hash);
                entry.insert(record);
                true
            }
        }
    }

    fn check_credentials(&self, uid: &str, secret: &str) -> bool {
        let Some(hash) = self
            .identities
            .get(uid)
            .and_then(|rec| rec.secret_hash.clone())
        else {
            return false;
        };

        match self.hasher.verify_secret(secret, &hash) {
            Ok(valid) => valid,
            Err(e) => {
                warn!(uid = %uid, error = %e, "Client secret verification failed");
                false
            }
        }
    }

    fn contains_credentials(&self, uid: &str) -> bool {
        self.identities
            .get(uid)
            .map(|rec| rec.is_registered())
            .unwrap_or(false)
    }

    fn remove_credentials(&self, identity: &DigitalIdentity) {
        if let Some(mut rec) = self.identities.get_mut(&identity.uid) {
            rec.secret_hash = None;
            debug!(uid = %identity.uid, "Credentials removed");
        }
    }

    fn add_token(&self, uid: &str, token: Token) -> AppResult<()> {
        let claims = token.claims()?;
        if let Some(mut rec) = self.identities.get_mut(uid) {
            rec.expiry_period = claims.expiry_period();
            rec.token = Some(token);
            debug!(uid = %uid, exp = claims.exp, "Token stored");
        }
        Ok(())
    }

    fn current_or_issue_token(
        &self,
        uid: &str,
        now: i64,
        issue: &mut dyn FnMut(i64) -> AppResult<Token>,
    ) -> AppResult<Token> {
        let mut rec = self
            .identities
            .get_mut(uid)
            .ok_or_else(|| AppError::security(format!("Unknown client: {uid}")))?;

        if let Some(token) = &rec.token {
            match token.claims() {
                Ok(claims) if !claims.is_expired_at(now) => return Ok(token.clone()),
                Ok(_) => debug!(uid = %uid, "Stored token expired, issuing a new one"),
                Err(e) => warn!(uid = %uid, error = %e, "Stored token unreadable, replacing it"),
            }
        }

        let token = issue(rec.expiry_period)?;
        let claims = token.claims()?;
        rec.expiry_period = claims.expiry_period();
        rec.token = Some(token.clone());

        info!(uid = %uid, exp = claims.exp, "Token issued");
        Ok(token)
    }

    fn token_expiring_date(&self, uid: &str) -> Option<i64> {
        let token = self.identities.get(uid)?.token.clone()?;
        token.claims().ok().map(|c| c.exp)
    }

    fn token_expiring_period(&self, uid: &str) -> i64 {
        self.identities
            .get(uid)
            .map(|rec| rec.expiry_period)
            .unwrap_or(-1)
    }

    fn set_token_expiring_period(&self, uid: &str, period: i64) {
        if let Some(mut rec) = self.identities.get_mut(uid) {
            rec.expiry_period = period;
        }
    }

    fn remove_token(&self, uid: &str) {
        if let Some(mut rec) = self.identities.get_mut(uid) {
            rec.token = None;
        }
    }

    fn contains_token(&self, uid: &str) -> bool {
        self.identities
            .get(uid)
            .map(|rec| rec.token.is_some())
            .unwrap_or(false)
    }

    fn token(&self, uid: &str) -> Option<Token> {
        self.identities.get(uid)?.token.clone()
    }

    fn identity(&self, uid: &str) -> Option<DigitalIdentity> {
        self.identities.get(uid).map(|rec| rec.identity.clone())
    }

    fn endpoint_credentials(&self, uid: &str) -> Option<Credentials> {
        self.identities.get(uid)?.identity.endpoint_credentials.clone()
    }

    fn device_expiring_period(&self) -> i64 {
        self.policy.device.load(Ordering::Acquire)
    }

    fn set_device_expiring_period(&self, period: i64) {
        self.policy.device.store(period, Ordering::Release);
    }

    fn application_expiring_period(&self) -> i64 {
        self.policy.application.load(Ordering::Acquire)
    }

    fn set_application_expiring_period(&self, period: i64) {
        self.policy.application.store(period, Ordering::Release);
    }

    fn user_expiring_period(&self) -> i64 {
        self.policy.user.load(Ordering::Acquire)
    }

    fn set_user_expiring_period(&self, period: i64) {
        self.policy.user.store(period, Ordering::Release);
    }

    fn default_expiring_period(&self) -> i64 {
        self.policy.default.load(Ordering::Acquire)
    }

    fn set_default_expiring_period(&self, period: i64) {
        self.policy.default.store(period, Ordering::Release);
    }

    fn test_expiring_period(&self) -> i64 {
        self.policy.test.load(Ordering::Acquire)
    }

    fn set_test_expiring_period(&self, period: i64) {
        self.policy.test.store(period, Ordering::Release);
    }

    fn issuer(&self) -> String {
        self.issuer
            .read()
            .map(|s| s.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    fn set_issuer(&self, issuer: &str) {
        let mut guard = self
            .issuer
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = issuer.to_string();
    }

    fn is_for_testing(&self, uid: &str) -> bool {
        self.test_identities.contains(uid)
    }

    fn shutdown(&self) {
        for mut rec in self.identities.iter_mut() {
            rec.token = None;
        }
        info!("Identity registry tokens cleared");
    }
}
