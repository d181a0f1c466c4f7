//! Table and JSON output formatting for CLI commands.

use serde::Serialize;
use tabled::builder::Builder;

use broker_core::types::ResultSet;

/// Output format selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    #[default]
    Table,
    /// JSON output
    Json,
}

/// Print a single item in the selected format
pub fn print_item<T: Serialize + std::fmt::Debug>(item: &T, format: OutputFormat) {
    match format {
        OutputFormat::Table => println!("{:#?}", item),
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(item).unwrap_or_else(|_| "{}".to_string());
            println!("{}", json);
        }
    }
}

/// Print SPARQL results, one row per binding.
pub fn print_results(results: &ResultSet, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_item(results, format),
        OutputFormat::Table => {
            if results.is_empty() {
                println!("No results found.");
                return;
            }
            println!("{}", results_table(results));
        }
    }
}

fn results_table(results: &ResultSet) -> String {
    let mut builder = Builder::default();
    builder.push_record(results.vars().iter().cloned());
    for binding in results.bindings() {
        builder.push_record(results.vars().iter().map(|var| {
            binding
                .get(var)
                .map(|term| term.to_sparql())
                .unwrap_or_default()
        }));
    }
    builder.build().to_string()
}

/// Print a success message
pub fn print_success(msg: &str) {
    println!("✓ {}", msg);
}

#[cfg(test)]
mod tests {
    use super::*;
    use broker_core::types::{Binding, RdfTerm};

    #[test]
    fn test_results_table_has_header_and_rows() {
        let results = ResultSet::with_bindings(
            vec!["s".into(), "o".into()],
            [Binding::new()
                .with("s", RdfTerm::uri("http://ex/a"))
                .with("o", RdfTerm::literal("x"))],
        );
        let table = results_table(&results);
        assert!(table.contains("<http://ex/a>"));
        assert!(table.contains("\"x\""));
        assert!(table.lines().count() >= 3);
    }
}
