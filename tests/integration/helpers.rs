//! Shared test helpers for integration tests.

use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use futures::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tower::ServiceExt;

use broker_api::{AppState, ServerHandle, build_app, build_state, start};
use broker_core::config::BrokerConfig;

pub const PATTERN: &str = "SELECT ?o WHERE { <http://ex/s> <http://ex/p> ?o }";
pub const INSERT: &str = "INSERT DATA { <http://ex/s> <http://ex/p> \"t\" }";
pub const DELETE: &str = "DELETE DATA { <http://ex/s> <http://ex/p> \"t\" }";
pub const UNRELATED: &str = "INSERT DATA { <http://ex/x> <http://ex/q> \"u\" }";

/// Identity allowed by the default configuration; its tokens last 5 s.
pub const TEST_IDENTITY: &str = "SEPATest";

const WAIT: Duration = Duration::from_secs(5);

/// Configuration bound to an ephemeral local port with cheap hashing.
pub fn test_config(secured: bool) -> BrokerConfig {
    let mut config = BrokerConfig::default();
    config.server.host = "127.0.0.1".into();
    config.server.port = 0;
    config.auth.enabled = secured;
    config.auth.hash_memory_kib = 8;
    config.auth.hash_iterations = 1;
    config
}

/// Test application driven in-process
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    pub state: AppState,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(test_config(false))
    }

    /// Application that requires bearer tokens.
    pub fn secured() -> Self {
        Self::with_config(test_config(true))
    }

    pub fn with_config(config: BrokerConfig) -> Self {
        let state = build_state(config).expect("Failed to build state");
        Self {
            router: build_app(state.clone()),
            state,
        }
    }

    pub async fn request(
        &self,
        method: &str,
        path: &str,
        content_type: Option<&str>,
        body: String,
        authorization: Option<&str>,
    ) -> TestResponse {
        let mut req = Request::builder().method(method).uri(path);
        if let Some(content_type) = content_type {
            req = req.header("Content-Type", content_type);
        }
        if let Some(authorization) = authorization {
            req = req.header("Authorization", authorization);
        }
        let req = req.body(Body::from(body)).expect("Failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let body_bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("Failed to read body");
        let body: Value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);

        TestResponse {
            status,
            content_type,
            body,
        }
    }

    pub async fn register(&self, uid: &str) -> TestResponse {
        let body = json!({
            "register": {"client_identity": uid, "grant_types": ["client_credentials"]}
        });
        self.request(
            "POST",
            "/oauth/register",
            Some("application/json"),
            body.to_string(),
            None,
        )
        .await
    }

    pub async fn token(&self, client_id: &str, client_secret: &str) -> TestResponse {
        let basic = format!("Basic {}", STANDARD.encode(format!("{client_id}:{client_secret}")));
        self.request("POST", "/oauth/token", None, String::new(), Some(&basic))
            .await
    }

    /// Registers `uid` and returns a `Bearer` header for a fresh token.
    pub async fn bearer_for(&self, uid: &str) -> (String, String, String) {
        let registered = self.register(uid).await;
        assert_eq!(registered.status, StatusCode::CREATED, "{:?}", registered.body);
        let id = registered.body["credentials"]["client_id"]
            .as_str()
            .expect("client_id")
            .to_string();
        let secret = registered.body["credentials"]["client_secret"]
            .as_str()
            .expect("client_secret")
            .to_string();

        let token = self.token(&id, &secret).await;
        assert_eq!(token.status, StatusCode::OK, "{:?}", token.body);
        let bearer = format!("Bearer {}", token.body["access_token"].as_str().expect("token"));
        (bearer, id, secret)
    }

    pub async fn query(&self, sparql: &str, bearer: Option<&str>) -> TestResponse {
        self.request(
            "POST",
            "/query",
            Some("application/sparql-query"),
            sparql.to_string(),
            bearer,
        )
        .await
    }

    pub async fn update(&self, sparql: &str, bearer: Option<&str>) -> TestResponse {
        self.request(
            "POST",
            "/update",
            Some("application/sparql-update"),
            sparql.to_string(),
            bearer,
        )
        .await
    }
}

/// Response status, content type and JSON body
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub content_type: String,
    pub body: Value,
}

/// Broker served on a real local port.
pub struct LiveBroker {
    pub handle: ServerHandle,
    pub state: AppState,
}

impl LiveBroker {
    pub async fn start(config: BrokerConfig) -> Self {
        let state = build_state(config).expect("Failed to build state");
        let handle = start(state.clone()).await.expect("Failed to start broker");
        Self { handle, state }
    }

    pub async fn open() -> Self {
        Self::start(test_config(false)).await
    }

    pub async fn connect(&self, path: &str) -> WsClient {
        let (stream, _) = connect_async(self.handle.ws_url(path))
            .await
            .expect("Failed to connect");
        WsClient { stream }
    }

    pub fn http_url(&self) -> String {
        self.handle.http_url()
    }

    /// Polls `check` until it holds or the wait expires.
    pub async fn eventually(&self, check: impl Fn(&AppState) -> bool) -> bool {
        let deadline = tokio::time::Instant::now() + WAIT;
        while tokio::time::Instant::now() < deadline {
            if check(&self.state) {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        check(&self.state)
    }

    pub async fn stop(self) {
        self.state.realtime.shutdown();
        self.handle
            .shutdown(Duration::from_secs(2))
            .await
            .expect("Failed to stop broker");
    }
}

/// Raw WebSocket client speaking JSON envelopes.
pub struct WsClient {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl WsClient {
    pub async fn send(&mut self, msg: Value) {
        self.send_raw(&msg.to_string()).await;
    }

    pub async fn send_raw(&mut self, text: &str) {
        self.stream
            .send(Message::text(text.to_string()))
            .await
            .expect("Failed to send");
    }

    pub async fn send_binary(&mut self, bytes: Vec<u8>) {
        self.stream
            .send(Message::binary(bytes))
            .await
            .expect("Failed to send");
    }

    pub async fn subscribe(&mut self, sparql: &str) -> String {
        self.send(json!({"type": "subscribe", "sparql": sparql})).await;
        let reply = self.recv().await;
        assert_eq!(reply["type"], "subscribe_response", "{reply}");
        reply["spuid"].as_str().expect("spuid").to_string()
    }

    /// Next JSON message; fails the test if none arrives in time.
    pub async fn recv(&mut self) -> Value {
        loop {
            let frame = tokio::time::timeout(WAIT, self.stream.next())
                .await
                .expect("Timed out waiting for a message")
                .expect("Connection closed")
                .expect("WebSocket error");
            if let Message::Text(text) = frame {
                return serde_json::from_str(text.as_str()).expect("Invalid JSON from broker");
            }
        }
    }

    /// Asserts that nothing arrives within `window`.
    pub async fn expect_silence(&mut self, window: Duration) {
        if let Ok(Some(Ok(Message::Text(text)))) =
            tokio::time::timeout(window, self.stream.next()).await
        {
            panic!("Unexpected message: {text}");
        }
    }

    pub async fn close(mut self) {
        let _ = self.stream.close(None).await;
    }
}

pub fn bindings(results: &Value) -> &Vec<Value> {
    results["results"]["bindings"]
        .as_array()
        .expect("bindings array")
}
