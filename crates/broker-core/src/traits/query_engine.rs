//! Query engine trait for pluggable SPARQL backends.

use async_trait::async_trait;

use crate::result::AppResult;
use crate::types::pattern::SparqlPattern;
use crate::types::rdf::ResultSet;

/// A SPARQL 1.1 engine the scheduler submits work to.
///
/// The [`QueryEngine`] trait is defined here in `broker-core` and
/// implemented in `broker-engine` (in-memory store and remote endpoint).
#[async_trait]
pub trait QueryEngine: Send + Sync + std::fmt::Debug + 'static {
    /// Return the engine type name (e.g., "memory", "remote").
    fn engine_type(&self) -> &str;

    /// Check whether the engine is reachable.
    async fn health_check(&self) -> AppResult<bool>;

    /// Evaluate a SELECT query.
    async fn query(&self, sparql: &str) -> AppResult<ResultSet>;

    /// Apply an update to the backing graph.
    async fn update(&self, sparql: &str) -> AppResult<()>;

    /// Evaluate a pattern after applying its forced bindings.
    async fn execute(&self, pattern: &SparqlPattern) -> AppResult<ResultSet> {
        self.query(&pattern.render()).await
    }
}
