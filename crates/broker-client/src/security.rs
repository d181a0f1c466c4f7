//! Client-side OAuth2 client-credentials handling.

use std::future::Future;
use std::sync::{PoisonError, RwLock};

use chrono::Utc;
use tracing::{debug, info};

use broker_core::error::{AppError, ErrorKind};
use broker_core::result::AppResult;
use broker_core::types::JwtResponse;
use broker_core::types::response::{ClientCredentials, RegistrationRequest, RegistrationResponse};

use crate::error::{read_json, transport};

/// Holds the client's credentials and current token.
#[derive(Debug)]
pub struct SecurityManager {
    http: reqwest::Client,
    base_url: String,
    credentials: RwLock<Option<ClientCredentials>>,
    token: RwLock<Option<JwtResponse>>,
}

impl SecurityManager {
    /// `base_url` is the broker's HTTP root, e.g. `http://localhost:9000`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credentials: RwLock::new(None),
            token: RwLock::new(None),
        }
    }

    /// Starts from credentials obtained earlier.
    pub fn with_credentials(self, credentials: ClientCredentials) -> Self {
        *self
            .credentials
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(credentials);
        self
    }

    pub fn credentials(&self) -> Option<ClientCredentials> {
        self.credentials
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Registers `client_identity` and keeps the returned credentials.
    pub async fn register(&self, client_identity: &str) -> AppResult<ClientCredentials> {
        let resp = self
            .http
            .post(format!("{}/oauth/register", self.base_url))
            .json(&RegistrationRequest::client_credentials(client_identity))
            .send()
            .await
            .map_err(transport)?;
        let registered: RegistrationResponse = read_json(resp).await?;

        info!(uid = %client_identity, "Registered with broker");
        *self
            .credentials
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(registered.credentials.clone());
        Ok(registered.credentials)
    }

    /// Requests a token with the stored credentials and keeps it.
    pub async fn request_token(&self) -> AppResult<JwtResponse> {
        let credentials = self
            .credentials()
            .ok_or_else(|| AppError::security("Client is not registered"))?;

        let resp = self
            .http
            .post(format!("{}/oauth/token", self.base_url))
            .basic_auth(&credentials.client_id, Some(&credentials.client_secret))
            .send()
            .await
            .map_err(transport)?;
        let token: JwtResponse = read_json(resp).await?;

        debug!(uid = %credentials.client_id, expires_at = token.expires_at, "Token obtained");
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = Some(token.clone());
        Ok(token)
    }

    /// Drops the current token and requests a new one.
    pub async fn refresh_token(&self) -> AppResult<JwtResponse> {
        self.token
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        self.request_token().await
    }

    /// True when no token is held or the held one is past `expires_at`.
    pub fn is_token_expired(&self) -> bool {
        let now = Utc::now().timestamp();
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_none_or(|t| now > t.expires_at)
    }

    /// `Authorization` header value, requesting a token first if needed.
    pub async fn bearer(&self) -> AppResult<String> {
        let current = self
            .token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        let token = match current {
            Some(token) if !self.is_token_expired() => token,
            _ => self.request_token().await?,
        };
        Ok(format!("Bearer {}", token.access_token))
    }

    /// Runs `call` with a bearer header; when the broker reports an expired
    /// token, refreshes once and retries.
    pub async fn with_refresh<T, F, Fut>(&self, mut call: F) -> AppResult<T>
    where
        F: FnMut(String) -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        let bearer = self.bearer().await?;
        match call(bearer).await {
            Err(err) if err.kind == ErrorKind::TokenExpired => {
                info!("Token expired, refreshing");
                let token = self.refresh_token().await?;
                call(format!("Bearer {}", token.access_token)).await
            }
            other => other,
        }
    }
}
