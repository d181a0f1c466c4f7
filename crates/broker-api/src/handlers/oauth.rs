//! OAuth2 client-credentials endpoints.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use tracing::info;

use broker_core::error::AppError;
use broker_core::types::JwtResponse;
use broker_core::types::RegistrationResponse;
use broker_core::types::response::RegistrationRequest;

use crate::extractors::AuthorizationHeader;
use crate::state::AppState;

const CLIENT_CREDENTIALS: &str = "client_credentials";

/// POST /oauth/register
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegistrationRequest>,
) -> Result<(StatusCode, Json<RegistrationResponse>), AppError> {
    if !req.register.grant_types.iter().any(|g| g == CLIENT_CREDENTIALS) {
        return Err(
            AppError::protocol("Only the client_credentials grant is supported")
                .with_code("unsupported_grant_type"),
        );
    }

    let credentials = state.realtime.auth.register(&req.register.client_identity)?;
    info!(uid = %credentials.client_id, "Client registered");

    Ok((
        StatusCode::CREATED,
        Json(RegistrationResponse { credentials }),
    ))
}

/// POST /oauth/token
pub async fn token(
    State(state): State<AppState>,
    authorization: AuthorizationHeader,
) -> Result<Json<JwtResponse>, AppError> {
    let header = authorization
        .as_deref()
        .ok_or_else(|| AppError::security("Missing basic credentials"))?;

    let response = state.realtime.auth.request_token(header)?;
    Ok(Json(response))
}
