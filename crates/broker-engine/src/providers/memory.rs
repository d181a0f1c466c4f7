//! In-memory triple store engine.

use std::collections::HashSet;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use broker_core::result::AppResult;
use broker_core::traits::QueryEngine;
use broker_core::types::ResultSet;

use crate::sparql::ast::{Operation, Triple};
use crate::sparql::{eval, parse_query, parse_update};

/// Volatile default-graph store.
///
/// An update is parsed completely before any operation is applied, so a
/// malformed request leaves the graph untouched.
#[derive(Debug, Default)]
pub struct MemoryEngine {
    graph: RwLock<HashSet<Triple>>,
}

impl MemoryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored triples.
    pub async fn len(&self) -> usize {
        self.graph.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.graph.read().await.is_empty()
    }
}

#[async_trait]
impl QueryEngine for MemoryEngine {
    fn engine_type(&self) -> &str {
        "memory"
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }

    async fn query(&self, sparql: &str) -> AppResult<ResultSet> {
        let query = parse_query(sparql)?;
        let graph = self.graph.read().await;
        Ok(eval::select(&graph, &query))
    }

    async fn update(&self, sparql: &str) -> AppResult<()> {
        let operations = parse_update(sparql)?;
        let mut graph = self.graph.write().await;

        for op in operations {
            match op {
                Operation::InsertData(triples) => graph.extend(triples),
                Operation::DeleteData(triples) => {
                    for t in &triples {
                        graph.remove(t);
                    }
                }
                Operation::DeleteWhere(patterns) => {
                    let doomed: Vec<Triple> = eval::solve(&graph, &patterns)
                        .iter()
                        .flat_map(|s| patterns.iter().filter_map(|p| eval::instantiate(p, s)))
                        .collect();
                    for t in &doomed {
                        graph.remove(t);
                    }
                }
                Operation::Modify {
                    delete,
                    insert,
                    pattern,
                } => {
                    let solutions = eval::solve(&graph, &pattern);
                    let doomed: Vec<Triple> = solutions
                        .iter()
                        .flat_map(|s| delete.iter().filter_map(|p| eval::instantiate(p, s)))
                        .collect();
                    let added: Vec<Triple> = solutions
                        .iter()
                        .flat_map(|s| insert.iter().filter_map(|p| eval::instantiate(p, s)))
                        .collect();
                    for t in &doomed {
                        graph.remove(t);
                    }
                    graph.extend(added);
                }
                Operation::Clear => graph.clear(),
            }
        }

        debug!(triples = graph.len(), "Update applied");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use broker_core::ErrorKind;
    use broker_core::types::{Binding, RdfTerm, SparqlPattern};

    const P: &str = "SELECT ?s ?o WHERE { ?s <http://ex/p> ?o }";

    #[tokio::test]
    async fn test_insert_query_delete() {
        let engine = MemoryEngine::new();
        engine
            .update("INSERT DATA { <http://ex/a> <http://ex/p> \"1\" }")
            .await
            .expect("insert");
        assert_eq!(engine.query(P).await.expect("query").len(), 1);

        engine
            .update("DELETE DATA { <http://ex/a> <http://ex/p> \"1\" }")
            .await
            .expect("delete");
        assert!(engine.query(P).await.expect("query").is_empty());
    }

    #[tokio::test]
    async fn test_malformed_update_changes_nothing() {
        let engine = MemoryEngine::new();
        engine
            .update("INSERT DATA { <http://ex/a> <http://ex/p> \"1\" }")
            .await
            .expect("insert");

        let err = engine
            .update("CLEAR ALL ; INSERT DATA { <http://ex/b> }")
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Execution);
        assert_eq!(engine.len().await, 1);
    }

    #[tokio::test]
    async fn test_delete_where_and_modify() {
        let engine = MemoryEngine::new();
        engine
            .update(
                "PREFIX ex: <http://ex/> INSERT DATA { ex:a ex:p 1 . ex:b ex:p 2 . ex:c ex:q 3 }",
            )
            .await
            .expect("insert");

        engine
            .update("PREFIX ex: <http://ex/> DELETE { ?s ex:p ?o } INSERT { ?s ex:r ?o } WHERE { ?s ex:p ?o }")
            .await
            .expect("modify");
        assert!(engine.query(P).await.expect("query").is_empty());
        assert_eq!(
            engine
                .query("SELECT * WHERE { ?s <http://ex/r> ?o }")
                .await
                .expect("query")
                .len(),
            2
        );

        engine
            .update("DELETE WHERE { ?s <http://ex/r> ?o }")
            .await
            .expect("delete where");
        assert_eq!(engine.len().await, 1);
    }

    #[tokio::test]
    async fn test_execute_applies_forced_bindings() {
        let engine = MemoryEngine::new();
        engine
            .update("INSERT DATA { <http://ex/a> <http://ex/p> 1 . <http://ex/b> <http://ex/p> 2 }")
            .await
            .expect("insert");

        let pattern = SparqlPattern::new(P)
            .with_bindings(Binding::new().with("s", RdfTerm::uri("http://ex/b")));
        let rs = engine.execute(&pattern).await.expect("execute");
        assert_eq!(rs.len(), 1);
    }
}
