//! Minimal SPARQL parsing and evaluation for the in-memory store.
//!
//! Supported forms:
//!
//! - `PREFIX p: <iri>` declarations
//! - `SELECT [DISTINCT] ?v… | * WHERE { basic graph pattern } [LIMIT n]`
//! - `INSERT DATA`, `DELETE DATA`, `DELETE WHERE`,
//!   `DELETE {…} INSERT {…} WHERE {…}`, `CLEAR [ALL|DEFAULT]`,
//!   several operations separated by `;`

pub mod ast;
pub mod eval;
pub mod lexer;
pub mod parser;

pub use ast::{Operation, PatternTerm, SelectQuery, Triple, TriplePattern};
pub use parser::{parse_query, parse_update};
