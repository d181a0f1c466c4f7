//! Basic graph pattern matching over a set of triples.

use std::collections::HashSet;

use broker_core::types::{Binding, RdfTerm, ResultSet};

use super::ast::{PatternTerm, SelectQuery, Triple, TriplePattern};

/// All solutions of `patterns` against `graph`.
pub fn solve(graph: &HashSet<Triple>, patterns: &[TriplePattern]) -> Vec<Binding> {
    let mut solutions = vec![Binding::new()];

    for pattern in patterns {
        let mut next = Vec::new();
        for partial in &solutions {
            for triple in graph {
                if let Some(extended) = match_triple(pattern, triple, partial) {
                    next.push(extended);
                }
            }
        }
        solutions = next;
        if solutions.is_empty() {
            break;
        }
    }

    solutions
}

/// Evaluates a `SELECT` into a result set.
pub fn select(graph: &HashSet<Triple>, query: &SelectQuery) -> ResultSet {
    let vars = query.variables();
    let mut results = ResultSet::new(vars.clone());

    for solution in solve(graph, &query.pattern) {
        if query.limit.is_some_and(|limit| results.len() >= limit) {
            break;
        }
        results.insert(solution.project(&vars));
    }

    results
}

/// Substitutes a solution into a template; `None` if a variable is unbound.
pub fn instantiate(template: &TriplePattern, solution: &Binding) -> Option<Triple> {
    Some(Triple {
        subject: resolve(&template.subject, solution)?,
        predicate: resolve(&template.predicate, solution)?,
        object: resolve(&template.object, solution)?,
    })
}

fn resolve(term: &PatternTerm, solution: &Binding) -> Option<RdfTerm> {
    match term {
        PatternTerm::Term(t) => Some(t.clone()),
        PatternTerm::Var(name) => solution.get(name).cloned(),
    }
}

fn match_triple(pattern: &TriplePattern, triple: &Triple, partial: &Binding) -> Option<Binding> {
    let mut binding = partial.clone();
    for (p, value) in [
        (&pattern.subject, &triple.subject),
        (&pattern.predicate, &triple.predicate),
        (&pattern.object, &triple.object),
    ] {
        match p {
            PatternTerm::Term(t) if t == value => {}
            PatternTerm::Term(_) => return None,
            PatternTerm::Var(name) => match binding.get(name) {
                Some(bound) if bound == value => {}
                Some(_) => return None,
                None => {
                    binding.insert(name.clone(), value.clone());
                }
            },
        }
    }
    Some(binding)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sparql::parser::parse_query;

    fn graph() -> HashSet<Triple> {
        let t = |s: &str, p: &str, o: RdfTerm| Triple {
            subject: RdfTerm::uri(s),
            predicate: RdfTerm::uri(p),
            object: o,
        };
        HashSet::from([
            t("http://a", "http://knows", RdfTerm::uri("http://b")),
            t("http://b", "http://knows", RdfTerm::uri("http://c")),
            t("http://a", "http://name", RdfTerm::literal("Alice")),
        ])
    }

    #[test]
    fn test_join_across_patterns() {
        let q = parse_query("SELECT ?x ?z WHERE { ?x <http://knows> ?y . ?y <http://knows> ?z }")
            .expect("parse");
        let rs = select(&graph(), &q);
        assert_eq!(rs.len(), 1);
        let row = rs.bindings().next().expect("row");
        assert_eq!(row.get("x"), Some(&RdfTerm::uri("http://a")));
        assert_eq!(row.get("z"), Some(&RdfTerm::uri("http://c")));
        assert!(row.get("y").is_none());
    }

    #[test]
    fn test_repeated_variable_must_agree() {
        let q = parse_query("SELECT * WHERE { ?x <http://knows> ?x }").expect("parse");
        assert!(select(&graph(), &q).is_empty());
    }

    #[test]
    fn test_limit() {
        let q = parse_query("SELECT * WHERE { ?s ?p ?o } LIMIT 2").expect("parse");
        assert_eq!(select(&graph(), &q).len(), 2);
    }

    #[test]
    fn test_instantiate_skips_unbound() {
        let tp = TriplePattern {
            subject: PatternTerm::Var("s".into()),
            predicate: PatternTerm::Term(RdfTerm::uri("http://p")),
            object: PatternTerm::Var("o".into()),
        };
        let partial = Binding::new().with("s", RdfTerm::uri("http://a"));
        assert!(instantiate(&tp, &partial).is_none());
        let full = partial.with("o", RdfTerm::literal("v"));
        assert!(instantiate(&tp, &full).is_some());
    }
}
