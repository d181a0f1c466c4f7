//! SPARQL 1.1 Protocol client for the broker's `/query` and `/update`.

use std::sync::Arc;

use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use serde_json::Value;

use broker_core::result::AppResult;
use broker_core::types::ResultSet;

use crate::error::{read_json, transport};
use crate::security::SecurityManager;

const SPARQL_QUERY: &str = "application/sparql-query";
const SPARQL_UPDATE: &str = "application/sparql-update";
const SPARQL_RESULTS: &str = "application/sparql-results+json";

/// Sends queries and updates over HTTP.
#[derive(Debug, Clone)]
pub struct SparqlClient {
    http: reqwest::Client,
    base_url: String,
    security: Option<Arc<SecurityManager>>,
}

impl SparqlClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            security: None,
        }
    }

    /// Sends a bearer token with every request and refreshes it once when
    /// the broker reports expiry.
    pub fn with_security(mut self, security: Arc<SecurityManager>) -> Self {
        self.security = Some(security);
        self
    }

    pub async fn query(&self, sparql: &str) -> AppResult<ResultSet> {
        match &self.security {
            Some(security) => {
                security
                    .with_refresh(|bearer| self.send_query(sparql, Some(bearer)))
                    .await
            }
            None => self.send_query(sparql, None).await,
        }
    }

    pub async fn update(&self, sparql: &str) -> AppResult<()> {
        match &self.security {
            Some(security) => {
                security
                    .with_refresh(|bearer| self.send_update(sparql, Some(bearer)))
                    .await
            }
            None => self.send_update(sparql, None).await,
        }
    }

    async fn send_query(&self, sparql: &str, bearer: Option<String>) -> AppResult<ResultSet> {
        let mut req = self
            .http
            .post(format!("{}/query", self.base_url))
            .header(CONTENT_TYPE, SPARQL_QUERY)
            .header(ACCEPT, SPARQL_RESULTS)
            .body(sparql.to_string());
        if let Some(bearer) = bearer {
            req = req.header(AUTHORIZATION, bearer);
        }
        read_json(req.send().await.map_err(transport)?).await
    }

    async fn send_update(&self, sparql: &str, bearer: Option<String>) -> AppResult<()> {
        let mut req = self
            .http
            .post(format!("{}/update", self.base_url))
            .header(CONTENT_TYPE, SPARQL_UPDATE)
            .body(sparql.to_string());
        if let Some(bearer) = bearer {
            req = req.header(AUTHORIZATION, bearer);
        }
        let _: Value = read_json(req.send().await.map_err(transport)?).await?;
        Ok(())
    }
}
