//! Argon2id client secret hashing and verification.

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{
        PasswordHash, PasswordHasher as ArgonHasher, PasswordVerifier, SaltString,
        rand_core::{OsRng, RngCore},
    },
};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;

use broker_core::config::auth::AuthConfig;
use broker_core::error::AppError;

/// Length in bytes of generated client secrets.
const SECRET_BYTES: usize = 32;

/// Hashes and verifies client secrets using Argon2id.
#[derive(Clone)]
pub struct SecretHasher {
    argon2: Argon2<'static>,
}

impl std::fmt::Debug for SecretHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretHasher").finish_non_exhaustive()
    }
}

impl SecretHasher {
    /// Creates a hasher with the cost parameters from configuration.
    pub fn new(config: &AuthConfig) -> Result<Self, AppError> {
        let params = Params::new(config.hash_memory_kib, config.hash_iterations, 1, None)
            .map_err(|e| AppError::configuration(format!("Invalid Argon2 parameters: {e}")))?;

        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    /// Generates a fresh random client secret.
    pub fn generate_secret(&self) -> String {
        let mut bytes = [0u8; SECRET_BYTES];
        OsRng.fill_bytes(&mut bytes);
        URL_SAFE_NO_PAD.encode(bytes)
    }

    /// Hashes a secret with a random salt, returning a PHC string.
    pub fn hash_secret(&self, secret: &str) -> Result<String, AppError> {
        let salt = SaltString::generate(&mut OsRng);

        let hash = self
            .argon2
            .hash_password(secret.as_bytes(), &salt)
            .map_err(|e| AppError::internal(format!("Secret hashing failed: {e}")))?;

        Ok(hash.to_string())
    }

    /// Verifies a secret against a stored PHC string.
    ///
    /// Returns `Ok(true)` if the secret matches, `Ok(false)` if not.
    pub fn verify_secret(&self, secret: &str, hash: &str) -> Result<bool, AppError> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| AppError::internal(format!("Invalid secret hash format: {e}")))?;

        match self.argon2.verify_password(secret.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(AppError::internal(format!("Secret verification failed: {e}"))),
        }
    }
}
