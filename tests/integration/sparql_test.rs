//! SPARQL 1.1 protocol and health endpoint tests.

use axum::http::StatusCode;

use crate::helpers::{INSERT, PATTERN, TEST_IDENTITY, TestApp, bindings};

#[tokio::test]
async fn test_update_then_query() {
    let app = TestApp::new();

    let resp = app.update(INSERT, None).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["status"], "ok");

    let resp = app.query(PATTERN, None).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.content_type.starts_with("application/sparql-results+json"));
    assert_eq!(resp.body["head"]["vars"][0], "o");
    let rows = bindings(&resp.body);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["o"]["value"], "t");
}

#[tokio::test]
async fn test_wrong_content_type() {
    let app = TestApp::new();
    let resp = app
        .request(
            "POST",
            "/query",
            Some("text/plain"),
            PATTERN.to_string(),
            None,
        )
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert!(resp.body["error"].is_string());
}

#[tokio::test]
async fn test_malformed_update() {
    let app = TestApp::new();
    let resp = app
        .update("INSERT DATA { <http://ex/s> <http://ex/p> ", None)
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.body["status_code"], 400);
}

#[tokio::test]
async fn test_secured_endpoints_need_a_token() {
    let app = TestApp::secured();

    let resp = app.query(PATTERN, None).await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
    assert_eq!(resp.body["error"], "invalid_client");

    let resp = app.update(INSERT, Some("Bearer not.a.jwt")).await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);

    let (bearer, _, _) = app.bearer_for(TEST_IDENTITY).await;
    let resp = app.update(INSERT, Some(&bearer)).await;
    assert_eq!(resp.status, StatusCode::OK);
}

#[tokio::test]
async fn test_health() {
    let app = TestApp::new();
    let resp = app.request("GET", "/health", None, String::new(), None).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["status"], "ok");
    assert_eq!(resp.body["engine"], "memory");
    assert_eq!(resp.body["gates"], 0);
    assert_eq!(resp.body["subscriptions"], 0);
}

#[tokio::test]
async fn test_gate_metrics_reset() {
    let app = TestApp::new();
    app.state.realtime.metrics.record_open();

    let resp = app.request("GET", "/gates", None, String::new(), None).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["gates_opened"], 1);
    assert_eq!(resp.body["active_gates"], 1);

    let resp = app
        .request("POST", "/gates/reset", None, String::new(), None)
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["messages"], 0);
    assert_eq!(resp.body["active_gates"], 1);
}

#[tokio::test]
async fn test_plain_request_on_unknown_path() {
    let app = TestApp::new();
    let resp = app.request("GET", "/nowhere", None, String::new(), None).await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    assert_eq!(resp.body["error"], "wrong_path");
}
