//! Parsed query and update forms.

use broker_core::types::RdfTerm;

/// A ground triple.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Triple {
    pub subject: RdfTerm,
    pub predicate: RdfTerm,
    pub object: RdfTerm,
}

/// A position in a triple pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PatternTerm {
    Term(RdfTerm),
    Var(String),
}

impl PatternTerm {
    pub fn var(&self) -> Option<&str> {
        match self {
            Self::Var(name) => Some(name),
            Self::Term(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TriplePattern {
    pub subject: PatternTerm,
    pub predicate: PatternTerm,
    pub object: PatternTerm,
}

impl TriplePattern {
    pub fn terms(&self) -> [&PatternTerm; 3] {
        [&self.subject, &self.predicate, &self.object]
    }

    /// The triple when no position is a variable.
    pub fn ground(&self) -> Option<Triple> {
        match (&self.subject, &self.predicate, &self.object) {
            (PatternTerm::Term(s), PatternTerm::Term(p), PatternTerm::Term(o)) => Some(Triple {
                subject: s.clone(),
                predicate: p.clone(),
                object: o.clone(),
            }),
            _ => None,
        }
    }
}

/// `SELECT` query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectQuery {
    /// Projection; `None` means `*`.
    pub projection: Option<Vec<String>>,
    pub pattern: Vec<TriplePattern>,
    pub limit: Option<usize>,
}

impl SelectQuery {
    /// Projected variables, in order of first appearance for `*`.
    pub fn variables(&self) -> Vec<String> {
        if let Some(vars) = &self.projection {
            return vars.clone();
        }
        let mut vars: Vec<String> = Vec::new();
        for tp in &self.pattern {
            for name in tp.terms().iter().filter_map(|t| t.var()) {
                if !vars.iter().any(|v| v == name) {
                    vars.push(name.to_string());
                }
            }
        }
        vars
    }
}

/// One update operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    InsertData(Vec<Triple>),
    DeleteData(Vec<Triple>),
    DeleteWhere(Vec<TriplePattern>),
    Modify {
        delete: Vec<TriplePattern>,
        insert: Vec<TriplePattern>,
        pattern: Vec<TriplePattern>,
    },
    Clear,
}
