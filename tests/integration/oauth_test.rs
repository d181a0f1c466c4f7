//! Client registration and token endpoint tests.

use std::time::Duration;

use axum::http::StatusCode;
use serde_json::json;

use crate::helpers::{INSERT, PATTERN, TEST_IDENTITY, TestApp};

#[tokio::test]
async fn test_register_unknown_identity_is_refused() {
    let app = TestApp::secured();

    let resp = app.register("RegisterMePlease").await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
    assert_eq!(resp.body["error"], "unauthorized_client");
    assert_eq!(resp.body["status_code"], 401);
}

#[tokio::test]
async fn test_register_and_request_token() {
    let app = TestApp::secured();

    let resp = app.register(TEST_IDENTITY).await;
    assert_eq!(resp.status, StatusCode::CREATED);
    assert_eq!(resp.body["credentials"]["client_id"], TEST_IDENTITY);
    let secret = resp.body["credentials"]["client_secret"]
        .as_str()
        .expect("secret")
        .to_string();
    assert!(!secret.is_empty());
    assert!(resp.body["credentials"]["signature"].is_null());

    let token = app.token(TEST_IDENTITY, &secret).await;
    assert_eq!(token.status, StatusCode::OK);
    assert_eq!(token.body["token_type"], "bearer");
    assert_eq!(token.body["expires_in"], 5);
    assert!(token.body["access_token"].as_str().is_some());
}

#[tokio::test]
async fn test_token_is_reused_while_valid() {
    let app = TestApp::secured();
    let (first, id, secret) = app.bearer_for(TEST_IDENTITY).await;

    let again = app.token(&id, &secret).await;
    assert_eq!(again.status, StatusCode::OK);
    assert_eq!(
        format!("Bearer {}", again.body["access_token"].as_str().expect("token")),
        first
    );
}

#[tokio::test]
async fn test_token_with_wrong_secret() {
    let app = TestApp::secured();
    let resp = app.register(TEST_IDENTITY).await;
    assert_eq!(resp.status, StatusCode::CREATED);

    let token = app.token(TEST_IDENTITY, "not-the-secret").await;
    assert_eq!(token.status, StatusCode::UNAUTHORIZED);
    assert_eq!(token.body["error"], "invalid_client");
}

#[tokio::test]
async fn test_token_without_credentials() {
    let app = TestApp::secured();
    let resp = app
        .request("POST", "/oauth/token", None, String::new(), None)
        .await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_register_rejects_other_grants() {
    let app = TestApp::secured();
    let body = json!({
        "register": {"client_identity": TEST_IDENTITY, "grant_types": ["password"]}
    });
    let resp = app
        .request(
            "POST",
            "/oauth/register",
            Some("application/json"),
            body.to_string(),
            None,
        )
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.body["error"], "unsupported_grant_type");
}

#[tokio::test]
async fn test_expired_token_is_refreshed() {
    let app = TestApp::secured();
    let (bearer, id, secret) = app.bearer_for(TEST_IDENTITY).await;

    let resp = app.update(INSERT, Some(&bearer)).await;
    assert_eq!(resp.status, StatusCode::OK);

    tokio::time::sleep(Duration::from_secs(6)).await;

    let resp = app.query(PATTERN, Some(&bearer)).await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
    assert_eq!(resp.body["error"], "invalid_grant");

    let token = app.token(&id, &secret).await;
    assert_eq!(token.status, StatusCode::OK);
    let fresh = format!("Bearer {}", token.body["access_token"].as_str().expect("token"));
    assert_ne!(fresh, bearer);

    let resp = app.query(PATTERN, Some(&fresh)).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["results"]["bindings"].as_array().map(Vec::len), Some(1));
}
