//! SPARQL 1.1 Protocol endpoints.

use axum::Json;
use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use serde_json::json;

use broker_core::error::AppError;
use broker_core::types::SparqlPattern;

use crate::extractors::AuthorizationHeader;
use crate::state::AppState;

pub const SPARQL_QUERY: &str = "application/sparql-query";
pub const SPARQL_UPDATE: &str = "application/sparql-update";
pub const SPARQL_RESULTS: &str = "application/sparql-results+json";

/// POST /query
pub async fn query(
    State(state): State<AppState>,
    authorization: AuthorizationHeader,
    headers: HeaderMap,
    body: String,
) -> Result<impl IntoResponse, AppError> {
    expect_content_type(&headers, SPARQL_QUERY)?;

    let results = state
        .realtime
        .scheduler
        .query(&SparqlPattern::new(body), authorization.as_deref())
        .await?;

    Ok(([(CONTENT_TYPE, SPARQL_RESULTS)], Json(results)))
}

/// POST /update
pub async fn update(
    State(state): State<AppState>,
    authorization: AuthorizationHeader,
    headers: HeaderMap,
    body: String,
) -> Result<Json<serde_json::Value>, AppError> {
    expect_content_type(&headers, SPARQL_UPDATE)?;

    state
        .realtime
        .scheduler
        .update(&body, authorization.as_deref())
        .await?;

    Ok(Json(json!({ "status": "ok" })))
}

fn expect_content_type(headers: &HeaderMap, expected: &str) -> Result<(), AppError> {
    let actual = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    let mime = actual.split(';').next().unwrap_or_default().trim();

    if mime.eq_ignore_ascii_case(expected) {
        Ok(())
    } else {
        Err(AppError::protocol(format!(
            "Expected content type {expected}, got '{actual}'"
        )))
    }
}
