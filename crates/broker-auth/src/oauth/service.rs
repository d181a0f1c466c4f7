//! Registration, token issuance and bearer validation on top of the
//! identity registry.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use broker_core::config::auth::AuthConfig;
use broker_core::error::AppError;
use broker_core::result::AppResult;
use broker_core::traits::Authorization;
use broker_core::types::response::ClientCredentials;
use broker_core::types::{Claims, JwtResponse};

use super::basic::{parse_basic, parse_bearer};
use crate::jwt::{JwtDecoder, JwtEncoder};
use crate::secret::SecretHasher;

/// Token type reported in token responses.
const TOKEN_TYPE: &str = "bearer";

/// Issues credentials and tokens and validates bearer tokens.
#[derive(Debug, Clone)]
pub struct AuthorizationService {
    registry: Arc<dyn Authorization>,
    encoder: JwtEncoder,
    decoder: JwtDecoder,
    hasher: SecretHasher,
    /// When false, `authorize` lets every request through.
    enabled: bool,
}

impl AuthorizationService {
    pub fn new(config: &AuthConfig, registry: Arc<dyn Authorization>) -> AppResult<Self> {
        Ok(Self {
            registry,
            encoder: JwtEncoder::new(config),
            decoder: JwtDecoder::new(config),
            hasher: SecretHasher::new(config)?,
            enabled: config.enabled,
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn registry(&self) -> &Arc<dyn Authorization> {
        &self.registry
    }

    /// Hands out a fresh client secret to a known, authorized identity.
    pub fn register(&self, client_identity: &str) -> AppResult<ClientCredentials> {
        let identity = self
            .registry
            .identity(client_identity)
            .filter(|_| self.registry.is_authorized(client_identity))
            .ok_or_else(|| {
                warn!(uid = %client_identity, "Registration refused");
                AppError::security(format!("Client identity {client_identity} is not authorized"))
                    .with_code("unauthorized_client")
            })?;

        let secret = self.hasher.generate_secret();
        if !self.registry.store_credentials(identity, &secret) {
            if !self.registry.is_authorized(client_identity) {
                return Err(AppError::security(format!(
                    "Client identity {client_identity} is not authorized"
                ))
                .with_code("unauthorized_client"));
            }
            return Err(AppError::internal("Failed to store client credentials"));
        }

        info!(uid = %client_identity, "Client registered");

        Ok(ClientCredentials {
            client_id: client_identity.to_string(),
            client_secret: secret,
            signature: None,
        })
    }

    /// Exchanges Basic client credentials for an access token.
    ///
    /// A still-valid token is returned unchanged, so concurrent refreshes
    /// converge on the same token.
    pub fn request_token(&self, authorization: &str) -> AppResult<JwtResponse> {
        let (client_id, secret) = parse_basic(authorization)?;

        if !self.registry.check_credentials(&client_id, &secret) {
            warn!(uid = %client_id, "Client credentials rejected");
            return Err(AppError::security("Client credentials are not valid"));
        }
        if !self.registry.is_authorized(&client_id) {
            return Err(AppError::security(format!("Client {client_id} is not authorized"))
                .with_code("unauthorized_client"));
        }

        let now = Utc::now().timestamp();
        let issuer = self.registry.issuer();
        let token = self
            .registry
            .current_or_issue_token(&client_id, now, &mut |period| {
                self.encoder.issue(&client_id, &issuer, now, period)
            })?;
        let claims = token.claims()?;

        Ok(JwtResponse {
            access_token: token.as_str().to_string(),
            token_type: TOKEN_TYPE.to_string(),
            expires_in: claims.expiry_period(),
            issued_at: claims.iat,
            expires_at: claims.exp,
        })
    }

    /// Verifies a `Bearer` header and returns the token's claims.
    pub fn validate_token(&self, authorization: Option<&str>) -> AppResult<Claims> {
        let header =
            authorization.ok_or_else(|| AppError::security("Missing bearer token"))?;
        let raw = parse_bearer(header)?;
        let claims = self.decoder.decode(raw, &self.registry.issuer())?;

        if !self.registry.is_authorized(&claims.sub) {
            return Err(AppError::security(format!("Client {} is not authorized", claims.sub))
                .with_code("unauthorized_client"));
        }

        if claims.is_expired_at(Utc::now().timestamp()) {
            return Err(AppError::token_expired("Token is expired"));
        }

        Ok(claims)
    }

    /// Validates the header when security is enabled; otherwise allows the
    /// request anonymously.
    pub fn authorize(&self, authorization: Option<&str>) -> AppResult<Option<Claims>> {
        if !self.enabled {
            return Ok(None);
        }
        self.validate_token(authorization).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;

    use super::*;
    use crate::identity::InMemoryAuthorization;
    use broker_core::ErrorKind;
    use broker_core::types::DigitalIdentity;

    fn config() -> AuthConfig {
        AuthConfig {
            enabled: true,
            hash_memory_kib: 8,
            hash_iterations: 1,
            ..AuthConfig::default()
        }
    }

    fn service() -> AuthorizationService {
        let cfg = config();
        let registry = Arc::new(InMemoryAuthorization::new(&cfg).expect("registry"));
        registry.add_identity(DigitalIdentity::device("dev-1"));
        AuthorizationService::new(&cfg, registry).expect("service")
    }

    fn basic(creds: &ClientCredentials) -> String {
        format!(
            "Basic {}",
            STANDARD.encode(format!("{}:{}", creds.client_id, creds.client_secret))
        )
    }

    #[test]
    fn test_unknown_identity_cannot_register() {
        let err = service().register("RegisterMePlease").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Security);
        assert_eq!(err.error_code(), "unauthorized_client");
    }

    #[test]
    fn test_revoked_identity_cannot_register() {
        let svc = service();
        svc.registry().remove_authorized_identity("dev-1");
        assert!(svc.register("dev-1").is_err());
    }

    #[test]
    fn test_reregistration_cannot_undo_revocation() {
        let svc = service();
        svc.register("dev-1").expect("register");
        svc.registry().remove_authorized_identity("dev-1");

        let err = svc.register("dev-1").unwrap_err();
        assert_eq!(err.error_code(), "unauthorized_client");
        assert!(!svc.registry().store_credentials(DigitalIdentity::device("dev-1"), "s"));
        assert!(!svc.registry().is_authorized("dev-1"));
    }

    #[test]
    fn test_register_then_token() {
        let svc = service();
        let creds = svc.register("dev-1").expect("register");
        assert_eq!(creds.client_id, "dev-1");

        let jwt = svc.request_token(&basic(&creds)).expect("token");
        assert_eq!(jwt.token_type, "bearer");
        assert_eq!(jwt.expires_in, 3600);
        assert_eq!(jwt.expires_at - jwt.issued_at, 3600);

        let header = format!("Bearer {}", jwt.access_token);
        let claims = svc.validate_token(Some(&header)).expect("valid");
        assert_eq!(claims.sub, "dev-1");
    }

    #[test]
    fn test_refresh_is_idempotent_while_valid() {
        let svc = service();
        let creds = svc.register("dev-1").expect("register");
        let a = svc.request_token(&basic(&creds)).expect("token");
        let b = svc.request_token(&basic(&creds)).expect("token");
        assert_eq!(a.access_token, b.access_token);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let svc = service();
        let mut creds = svc.register("dev-1").expect("register");
        creds.client_secret = "wrong".into();
        let err = svc.request_token(&basic(&creds)).unwrap_err();
        assert_eq!(err.error_code(), "invalid_client");
    }

    #[test]
    fn test_missing_and_expired_tokens() {
        let svc = service();
        let err = svc.validate_token(None).unwrap_err();
        assert_eq!(err.error_code(), "invalid_client");

        let now = Utc::now().timestamp();
        let stale = JwtEncoder::new(&config())
            .issue("dev-1", &svc.registry().issuer(), now - 10, 5)
            .expect("issue");
        let header = format!("Bearer {}", stale.as_str());
        let err = svc.validate_token(Some(&header)).unwrap_err();
        assert_eq!(err.kind, ErrorKind::TokenExpired);
        assert_eq!(err.to_response().error, "invalid_grant");
    }

    #[test]
    fn test_revoked_subject_rejected() {
        let svc = service();
        let creds = svc.register("dev-1").expect("register");
        let jwt = svc.request_token(&basic(&creds)).expect("token");
        svc.registry().remove_authorized_identity("dev-1");

        let header = format!("Bearer {}", jwt.access_token);
        let err = svc.validate_token(Some(&header)).unwrap_err();
        assert_eq!(err.error_code(), "unauthorized_client");
    }

    #[test]
    fn test_disabled_security_allows_anonymous() {
        let cfg = AuthConfig {
            enabled: false,
            ..config()
        };
        let registry = Arc::new(InMemoryAuthorization::new(&cfg).expect("registry"));
        let svc = AuthorizationService::new(&cfg, registry).expect("service");
        assert!(svc.authorize(None).expect("allowed").is_none());
    }
}
