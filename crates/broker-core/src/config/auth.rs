//! Identity registry and token policy configuration.

use serde::{Deserialize, Serialize};

use crate::types::identity::IdentityClass;

/// Authorization configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Whether requests must carry a bearer token.
    #[serde(default)]
    pub enabled: bool,
    /// Secret key for JWT signing (HMAC-SHA256).
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
    /// Value of the `iss` claim.
    #[serde(default = "default_issuer")]
    pub issuer: String,
    /// Default token expiry per identity class.
    #[serde(default)]
    pub expiry: ExpiryConfig,
    /// Identities that are never revoked and always use the test expiry.
    #[serde(default = "default_test_identities")]
    pub test_identities: Vec<String>,
    /// Identities known to the registry at startup.
    #[serde(default)]
    pub identities: Vec<IdentitySeed>,
    /// Argon2 memory cost in KiB for client secret hashing.
    #[serde(default = "default_hash_memory")]
    pub hash_memory_kib: u32,
    /// Argon2 iteration count.
    #[serde(default = "default_hash_iterations")]
    pub hash_iterations: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            jwt_secret: default_jwt_secret(),
            issuer: default_issuer(),
            expiry: ExpiryConfig::default(),
            test_identities: default_test_identities(),
            identities: Vec::new(),
            hash_memory_kib: default_hash_memory(),
            hash_iterations: default_hash_iterations(),
        }
    }
}

/// Token expiry periods in seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpiryConfig {
    #[serde(default = "default_device")]
    pub device_seconds: i64,
    #[serde(default = "default_application")]
    pub application_seconds: i64,
    #[serde(default = "default_user")]
    pub user_seconds: i64,
    /// Applied when an identity has no more specific class policy.
    #[serde(default = "default_short")]
    pub default_seconds: i64,
    #[serde(default = "default_short")]
    pub test_seconds: i64,
}

impl Default for ExpiryConfig {
    fn default() -> Self {
        Self {
            device_seconds: default_device(),
            application_seconds: default_application(),
            user_seconds: default_user(),
            default_seconds: default_short(),
            test_seconds: default_short(),
        }
    }
}

/// An identity preloaded into the registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentitySeed {
    pub uid: String,
    #[serde(default)]
    pub class: IdentityClass,
}

fn default_jwt_secret() -> String {
    "CHANGE_ME_IN_PRODUCTION".to_string()
}

fn default_issuer() -> String {
    "https://sepa.broker/oauth".to_string()
}

fn default_test_identities() -> Vec<String> {
    vec!["SEPATest".to_string()]
}

fn default_hash_memory() -> u32 {
    19 * 1024
}

fn default_hash_iterations() -> u32 {
    2
}

fn default_device() -> i64 {
    3600
}

fn default_application() -> i64 {
    43200
}

fn default_user() -> i64 {
    300
}

fn default_short() -> i64 {
    5
}
