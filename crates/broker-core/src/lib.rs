//! # broker-core
//!
//! Core crate for the SPARQL publish/subscribe broker. Contains the
//! capability traits, configuration schemas, typed identifiers, the RDF
//! result model and the unified error system.
//!
//! This crate has **no** internal dependencies on other broker crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::{AppError, ErrorKind};
pub use result::AppResult;
