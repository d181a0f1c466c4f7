//! RDF terms, solution bindings, result sets and their diffs.
//!
//! Terms and result sets serialize in the SPARQL 1.1 Query Results JSON
//! format, which is what both the remote endpoints and the broker's clients
//! speak.

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// An RDF term as it appears in a solution binding.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RdfTerm {
    /// An IRI.
    Uri { value: String },
    /// A literal with optional datatype or language tag.
    #[serde(alias = "typed-literal")]
    Literal {
        value: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        datatype: Option<String>,
        #[serde(rename = "xml:lang", default, skip_serializing_if = "Option::is_none")]
        lang: Option<String>,
    },
    /// A blank node.
    Bnode { value: String },
}

impl RdfTerm {
    pub fn uri(value: impl Into<String>) -> Self {
        Self::Uri {
            value: value.into(),
        }
    }

    pub fn literal(value: impl Into<String>) -> Self {
        Self::Literal {
            value: value.into(),
            datatype: None,
            lang: None,
        }
    }

    pub fn typed_literal(value: impl Into<String>, datatype: impl Into<String>) -> Self {
        Self::Literal {
            value: value.into(),
            datatype: Some(datatype.into()),
            lang: None,
        }
    }

    pub fn lang_literal(value: impl Into<String>, lang: impl Into<String>) -> Self {
        Self::Literal {
            value: value.into(),
            datatype: None,
            lang: Some(lang.into()),
        }
    }

    pub fn bnode(value: impl Into<String>) -> Self {
        Self::Bnode {
            value: value.into(),
        }
    }

    /// Lexical value of the term.
    pub fn value(&self) -> &str {
        match self {
            Self::Uri { value } | Self::Literal { value, .. } | Self::Bnode { value } => value,
        }
    }

    /// SPARQL surface syntax for the term.
    pub fn to_sparql(&self) -> String {
        match self {
            Self::Uri { value } => format!("<{value}>"),
            Self::Bnode { value } => format!("_:{value}"),
            Self::Literal {
                value,
                datatype,
                lang,
            } => {
                let escaped = escape_literal(value);
                match (datatype, lang) {
                    (_, Some(lang)) => format!("\"{escaped}\"@{lang}"),
                    (Some(dt), None) => format!("\"{escaped}\"^^<{dt}>"),
                    (None, None) => format!("\"{escaped}\""),
                }
            }
        }
    }
}

impl fmt::Display for RdfTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sparql())
    }
}

fn escape_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(c),
        }
    }
    out
}

/// One solution: variable name → term.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Binding(BTreeMap<String, RdfTerm>);

impl Binding {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, var: impl Into<String>, term: RdfTerm) -> Self {
        self.0.insert(var.into(), term);
        self
    }

    pub fn insert(&mut self, var: impl Into<String>, term: RdfTerm) -> Option<RdfTerm> {
        self.0.insert(var.into(), term)
    }

    pub fn get(&self, var: &str) -> Option<&RdfTerm> {
        self.0.get(var)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &RdfTerm)> {
        self.0.iter()
    }

    /// Keep only the given variables.
    pub fn project(&self, vars: &[String]) -> Self {
        Self(
            self.0
                .iter()
                .filter(|(k, _)| vars.contains(k))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }
}

impl FromIterator<(String, RdfTerm)> for Binding {
    fn from_iter<I: IntoIterator<Item = (String, RdfTerm)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// An unordered set of solutions plus the projected variable list.
///
/// Equality ignores the variable list and compares the solution sets only.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(into = "SparqlResultsJson", from = "SparqlResultsJson")]
pub struct ResultSet {
    vars: Vec<String>,
    bindings: BTreeSet<Binding>,
}

impl PartialEq for ResultSet {
    fn eq(&self, other: &Self) -> bool {
        self.bindings == other.bindings
    }
}

impl Eq for ResultSet {}

impl ResultSet {
    pub fn new(vars: Vec<String>) -> Self {
        Self {
            vars,
            bindings: BTreeSet::new(),
        }
    }

    pub fn with_bindings(vars: Vec<String>, bindings: impl IntoIterator<Item = Binding>) -> Self {
        Self {
            vars,
            bindings: bindings.into_iter().collect(),
        }
    }

    pub fn vars(&self) -> &[String] {
        &self.vars
    }

    /// Returns `true` if the solution was not present.
    pub fn insert(&mut self, binding: Binding) -> bool {
        self.bindings.insert(binding)
    }

    pub fn contains(&self, binding: &Binding) -> bool {
        self.bindings.contains(binding)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn bindings(&self) -> impl Iterator<Item = &Binding> {
        self.bindings.iter()
    }

    /// Compute what changed going from `self` (the last delivered state) to
    /// `newer`: `added = newer − self`, `removed = self − newer`.
    pub fn diff(&self, newer: &ResultSet) -> ResultDiff {
        let vars = if newer.vars.is_empty() {
            self.vars.clone()
        } else {
            newer.vars.clone()
        };
        ResultDiff {
            added: ResultSet::with_bindings(
                vars.clone(),
                newer.bindings.difference(&self.bindings).cloned(),
            ),
            removed: ResultSet::with_bindings(
                vars,
                self.bindings.difference(&newer.bindings).cloned(),
            ),
        }
    }

    /// Apply a diff in place: `self ∪ added \ removed`.
    pub fn apply(&mut self, diff: &ResultDiff) {
        for b in diff.removed.bindings() {
            self.bindings.remove(b);
        }
        for b in diff.added.bindings() {
            self.bindings.insert(b.clone());
        }
        if self.vars.is_empty() {
            self.vars = diff.added.vars.clone();
        }
    }
}

/// Added and removed solutions between two evaluations of a pattern.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultDiff {
    pub added: ResultSet,
    pub removed: ResultSet,
}

impl ResultDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

#[derive(Serialize, Deserialize)]
struct SparqlResultsJson {
    #[serde(default)]
    head: Head,
    #[serde(default)]
    results: Results,
}

#[derive(Default, Serialize, Deserialize)]
struct Head {
    #[serde(default)]
    vars: Vec<String>,
}

#[derive(Default, Serialize, Deserialize)]
struct Results {
    #[serde(default)]
    bindings: Vec<Binding>,
}

impl From<ResultSet> for SparqlResultsJson {
    fn from(rs: ResultSet) -> Self {
        Self {
            head: Head { vars: rs.vars },
            results: Results {
                bindings: rs.bindings.into_iter().collect(),
            },
        }
    }
}

impl From<SparqlResultsJson> for ResultSet {
    fn from(json: SparqlResultsJson) -> Self {
        ResultSet::with_bindings(json.head.vars, json.results.bindings)
    }
}
