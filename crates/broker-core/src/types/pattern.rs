//! SPARQL text plus forced bindings.

use serde::{Deserialize, Serialize};

use super::rdf::Binding;

/// A query or update with variables forced to fixed terms.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SparqlPattern {
    pub sparql: String,
    #[serde(default, skip_serializing_if = "Binding::is_empty")]
    pub bindings: Binding,
}

impl SparqlPattern {
    pub fn new(sparql: impl Into<String>) -> Self {
        Self {
            sparql: sparql.into(),
            bindings: Binding::new(),
        }
    }

    pub fn with_bindings(mut self, bindings: Binding) -> Self {
        self.bindings = bindings;
        self
    }

    /// Text with every bound `?var`/`$var` in the graph pattern replaced by
    /// its term.
    ///
    /// Bound variables are dropped from a top-level SELECT projection; when
    /// none remain the projection becomes `*`. Variables inside string
    /// literals and IRIs are left untouched.
    pub fn render(&self) -> String {
        if self.bindings.is_empty() {
            return self.sparql.clone();
        }

        let chars: Vec<char> = self.sparql.chars().collect();
        let mut out = String::with_capacity(self.sparql.len());
        let mut i = 0;
        // Header state: everything before the first `{`.
        let mut in_body = false;
        let mut parens = 0usize;
        let mut kept = 0usize;
        let mut dropped_at: Option<usize> = None;

        while i < chars.len() {
            let c = chars[i];
            match c {
                '"' | '\'' => {
                    let end = skip_string(&chars, i);
                    out.extend(&chars[i..end]);
                    i = end;
                }
                '<' if looks_like_iri(&chars, i) => {
                    let end = chars[i..]
                        .iter()
                        .position(|&ch| ch == '>')
                        .map_or(chars.len(), |p| i + p + 1);
                    out.extend(&chars[i..end]);
                    i = end;
                }
                '?' | '$' => {
                    let start = i + 1;
                    let mut end = start;
                    while end < chars.len() && is_var_char(chars[end]) {
                        end += 1;
                    }
                    let name: String = chars[start..end].iter().collect();
                    let projected = !in_body && parens == 0;
                    match self.bindings.get(&name) {
                        Some(_) if projected && !name.is_empty() => {
                            dropped_at.get_or_insert(out.len());
                        }
                        Some(term) if !name.is_empty() => out.push_str(&term.to_sparql()),
                        _ => {
                            if projected {
                                kept += 1;
                            }
                            out.extend(&chars[i..end]);
                        }
                    }
                    i = end;
                }
                '{' if !in_body => {
                    if let Some(at) = dropped_at.filter(|_| kept == 0) {
                        out.insert_str(at, "*");
                    }
                    in_body = true;
                    out.push(c);
                    i += 1;
                }
                _ => {
                    if !in_body {
                        match c {
                            '(' => {
                                if parens == 0 {
                                    kept += 1;
                                }
                                parens += 1;
                            }
                            ')' => parens = parens.saturating_sub(1),
                            '*' if parens == 0 => kept += 1,
                            _ => {}
                        }
                    }
                    out.push(c);
                    i += 1;
                }
            }
        }

        out
    }
}

fn is_var_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// `<` opens an IRI when it is not the `<=` operator and the next `>`
/// comes before any whitespace.
fn looks_like_iri(chars: &[char], at: usize) -> bool {
    if chars.get(at + 1) == Some(&'=') {
        return false;
    }
    for &c in &chars[at + 1..] {
        if c == '>' {
            return true;
        }
        if c.is_whitespace() {
            return false;
        }
    }
    false
}

/// Index just past the string literal starting at `at`.
fn skip_string(chars: &[char], at: usize) -> usize {
    let quote = chars[at];
    let long = chars.get(at + 1) == Some(&quote) && chars.get(at + 2) == Some(&quote);
    let mut i = if long { at + 3 } else { at + 1 };

    while i < chars.len() {
        match chars[i] {
            '\\' => i += 2,
            c if c == quote => {
                if !long {
                    return i + 1;
                }
                if chars.get(i + 1) == Some(&quote) && chars.get(i + 2) == Some(&quote) {
                    return i + 3;
                }
                i += 1;
            }
            _ => i += 1,
        }
    }
    chars.len()
}
