//! SPARQL 1.1 Protocol endpoint adapter.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use tracing::{debug, warn};

use broker_core::config::engine::EngineConfig;
use broker_core::error::{AppError, ErrorKind};
use broker_core::result::AppResult;
use broker_core::traits::QueryEngine;
use broker_core::types::ResultSet;

const SPARQL_QUERY: &str = "application/sparql-query";
const SPARQL_UPDATE: &str = "application/sparql-update";
const SPARQL_RESULTS_JSON: &str = "application/sparql-results+json";

/// Forwards queries and updates to a remote SPARQL endpoint.
#[derive(Debug, Clone)]
pub struct RemoteEngine {
    client: reqwest::Client,
    query_url: String,
    update_url: String,
    credentials: Option<(String, String)>,
}

impl RemoteEngine {
    pub fn new(config: &EngineConfig) -> AppResult<Self> {
        if config.query_url.is_empty() || config.update_url.is_empty() {
            return Err(AppError::configuration(
                "Remote engine needs engine.query_url and engine.update_url",
            ));
        }

        let mut builder = reqwest::Client::builder();
        if config.timeout_ms > 0 {
            builder = builder.timeout(Duration::from_millis(config.timeout_ms));
        }
        let client = builder.build().map_err(|e| {
            AppError::with_source(ErrorKind::Configuration, "Failed to build HTTP client", e)
        })?;

        let credentials = match (&config.username, &config.password) {
            (Some(user), Some(password)) => Some((user.clone(), password.clone())),
            _ => None,
        };

        Ok(Self {
            client,
            query_url: config.query_url.clone(),
            update_url: config.update_url.clone(),
            credentials,
        })
    }

    async fn post(&self, url: &str, content_type: &str, body: &str) -> AppResult<reqwest::Response> {
        let mut request = self
            .client
            .post(url)
            .header(CONTENT_TYPE, content_type)
            .header(ACCEPT, SPARQL_RESULTS_JSON)
            .body(body.to_string());
        if let Some((user, password)) = &self.credentials {
            request = request.basic_auth(user, Some(password));
        }

        let response = request.send().await.map_err(|e| {
            warn!(url = %url, error = %e, "SPARQL endpoint unreachable");
            AppError::with_source(ErrorKind::Transport, format!("SPARQL endpoint {url} unreachable"), e)
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::execution(format!(
                "SPARQL endpoint returned {status}: {text}"
            )));
        }

        Ok(response)
    }
}

#[async_trait]
impl QueryEngine for RemoteEngine {
    fn engine_type(&self) -> &str {
        "remote"
    }

    async fn health_check(&self) -> AppResult<bool> {
        match self.query("SELECT * WHERE { ?s ?p ?o } LIMIT 1").await {
            Ok(_) => Ok(true),
            Err(e) if e.kind == ErrorKind::Transport => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn query(&self, sparql: &str) -> AppResult<ResultSet> {
        debug!(url = %self.query_url, "Forwarding query");
        let response = self.post(&self.query_url, SPARQL_QUERY, sparql).await?;
        response.json::<ResultSet>().await.map_err(|e| {
            AppError::with_source(ErrorKind::Transport, "Malformed SPARQL results", e)
        })
    }

    async fn update(&self, sparql: &str) -> AppResult<()> {
        debug!(url = %self.update_url, "Forwarding update");
        self.post(&self.update_url, SPARQL_UPDATE, sparql).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::Router;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;

    use super::*;

    async fn spawn_endpoint(seen: Arc<Mutex<Vec<String>>>) -> String {
        let query_seen = Arc::clone(&seen);
        let app = Router::new()
            .route(
                "/query",
                post(move |headers: HeaderMap, body: String| {
                    let seen = Arc::clone(&query_seen);
                    async move {
                        let ct = headers
                            .get("content-type")
                            .and_then(|v| v.to_str().ok())
                            .unwrap_or_default()
                            .to_string();
                        seen.lock().expect("lock").push(format!("{ct}|{body}"));
                        r#"{"head":{"vars":["s"]},"results":{"bindings":[{"s":{"type":"uri","value":"http://ex/a"}}]}}"#
                    }
                }),
            )
            .route(
                "/update",
                post(|body: String| async move {
                    if body.contains("bad") {
                        (StatusCode::BAD_REQUEST, "parse error")
                    } else {
                        (StatusCode::OK, "")
                    }
                }),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let addr = listener.local_addr().expect("addr");
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        format!("http://{addr}")
    }

    fn engine(base: &str) -> RemoteEngine {
        RemoteEngine::new(&EngineConfig {
            provider: "remote".into(),
            query_url: format!("{base}/query"),
            update_url: format!("{base}/update"),
            ..EngineConfig::default()
        })
        .expect("engine")
    }

    #[tokio::test]
    async fn test_query_posts_sparql_and_parses_results() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let base = spawn_endpoint(Arc::clone(&seen)).await;

        let rs = engine(&base)
            .query("SELECT ?s WHERE { ?s ?p ?o }")
            .await
            .expect("query");
        assert_eq!(rs.len(), 1);
        assert_eq!(rs.vars(), ["s".to_string()]);
        assert_eq!(
            seen.lock().expect("lock")[0],
            "application/sparql-query|SELECT ?s WHERE { ?s ?p ?o }"
        );
    }

    #[tokio::test]
    async fn test_update_error_is_execution() {
        let base = spawn_endpoint(Arc::new(Mutex::new(Vec::new()))).await;
        let engine = engine(&base);
        engine.update("INSERT DATA {}").await.expect("update");
        let err = engine.update("bad").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Execution);
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_transport() {
        let engine = engine("http://127.0.0.1:1");
        let err = engine.query("SELECT * WHERE { ?s ?p ?o }").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Transport);
        assert!(!engine.health_check().await.expect("health"));
    }

    #[test]
    fn test_missing_urls_rejected() {
        let err = RemoteEngine::new(&EngineConfig::default()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Configuration);
    }
}
